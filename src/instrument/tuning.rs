use serde::{Deserialize, Serialize};

/// ZX Spectrum 128 AY clock
pub const DEFAULT_CHIP_CLOCK_HZ: u32 = 1_773_400;
/// Eight octaves starting at C-1
pub const TUNING_TABLE_SIZE: usize = 96;
/// Largest value the 12-bit tone registers can hold
pub const MAX_TONE_PERIOD: u16 = 0x0FFF;

/// Semitone index of A-4 (C-1 = 0)
const A4_INDEX: f64 = 45.0;

/// Maps an absolute semitone index to a chip tone period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningTable {
    periods: Vec<u16>,
}

impl TuningTable {
    /// Use periods supplied by the song. An empty list falls back to the
    /// equal-tempered table for the default clock.
    pub fn from_periods(periods: Vec<u16>) -> Self {
        if periods.is_empty() {
            return Self::default();
        }
        Self {
            periods: periods.into_iter().map(|p| p & MAX_TONE_PERIOD).collect(),
        }
    }

    /// Equal-tempered table (A-4 = 440 Hz) for a chip running at `clock_hz`
    pub fn equal_tempered(clock_hz: u32) -> Self {
        let clock = clock_hz.max(1) as f64;
        let periods = (0..TUNING_TABLE_SIZE)
            .map(|index| {
                let freq = 440.0 * 2.0f64.powf((index as f64 - A4_INDEX) / 12.0);
                // Tone generator divides the clock by 16 * period
                let period = (clock / (16.0 * freq)).round();
                period.clamp(1.0, MAX_TONE_PERIOD as f64) as u16
            })
            .collect();
        Self { periods }
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Highest valid note index
    pub fn max_index(&self) -> usize {
        self.periods.len().saturating_sub(1)
    }

    /// Period for a note index. Out-of-range indices clamp to the table ends.
    pub fn period(&self, index: i32) -> u16 {
        let index = index.clamp(0, self.max_index() as i32) as usize;
        self.periods.get(index).copied().unwrap_or(0)
    }
}

impl Default for TuningTable {
    fn default() -> Self {
        Self::equal_tempered(DEFAULT_CHIP_CLOCK_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_tempered_reference_pitch() {
        let table = TuningTable::equal_tempered(DEFAULT_CHIP_CLOCK_HZ);
        assert_eq!(table.len(), TUNING_TABLE_SIZE);
        // 1773400 / (16 * 440) = 251.9
        assert_eq!(table.period(45), 252);
    }

    #[test]
    fn test_periods_decrease_with_pitch() {
        let table = TuningTable::default();
        for i in 1..table.len() as i32 {
            assert!(table.period(i) <= table.period(i - 1));
        }
        assert!(table.period(0) <= MAX_TONE_PERIOD);
    }

    #[test]
    fn test_out_of_range_index_clamps() {
        let table = TuningTable::from_periods(vec![100, 90, 80]);
        assert_eq!(table.period(-4), 100);
        assert_eq!(table.period(17), 80);
    }

    #[test]
    fn test_supplied_periods_masked_to_12_bits() {
        let table = TuningTable::from_periods(vec![0x1234]);
        assert_eq!(table.period(0), 0x234);
    }
}
