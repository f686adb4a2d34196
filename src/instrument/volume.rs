/// Pattern volume x instrument volume, a rounded product approximating the
/// chip's logarithmic amplitude steps. Row 0 is silent, row 15 passes the
/// instrument volume through unchanged.
pub const VOLUME_TABLE: [[u8; 16]; 16] = build_volume_table();

const fn build_volume_table() -> [[u8; 16]; 16] {
    let mut table = [[0u8; 16]; 16];
    let mut pattern = 0;
    while pattern < 16 {
        let mut level = 0;
        while level < 16 {
            table[pattern][level] = ((pattern * level + 7) / 15) as u8;
            level += 1;
        }
        pattern += 1;
    }
    table
}

/// Scale an instrument level (already clamped to 0-15) by the pattern volume
pub fn scale_volume(pattern_volume: u8, level: u8) -> u8 {
    VOLUME_TABLE[(pattern_volume & 0x0F) as usize][(level & 0x0F) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_zero_is_silent() {
        assert!(VOLUME_TABLE[0].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_full_volume_is_identity() {
        assert_eq!(VOLUME_TABLE[15][15], 15);
        for level in 0..16 {
            assert_eq!(VOLUME_TABLE[15][level], level as u8);
        }
    }

    #[test]
    fn test_rows_and_columns_non_decreasing() {
        for row in 0..16 {
            for col in 1..16 {
                assert!(VOLUME_TABLE[row][col] >= VOLUME_TABLE[row][col - 1]);
            }
        }
        for col in 0..16 {
            for row in 1..16 {
                assert!(VOLUME_TABLE[row][col] >= VOLUME_TABLE[row - 1][col]);
            }
        }
    }

    #[test]
    fn test_quiet_row_shape() {
        // Row 1 only reaches level 1 from the upper half of the instrument range
        assert_eq!(VOLUME_TABLE[1][7], 0);
        assert_eq!(VOLUME_TABLE[1][8], 1);
        assert_eq!(scale_volume(8, 15), 8);
    }
}
