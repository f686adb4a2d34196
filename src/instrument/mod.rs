pub mod macros;
pub mod table;
pub mod tuning;
pub mod volume;

pub use macros::{AmplitudeSlide, Instrument, InstrumentRow};
pub use table::Table;
pub use tuning::{TuningTable, DEFAULT_CHIP_CLOCK_HZ, MAX_TONE_PERIOD, TUNING_TABLE_SIZE};
pub use volume::{scale_volume, VOLUME_TABLE};

/// Wrap a sequence position that ran past the end back to the loop point
/// (or the start when the loop point is unset or invalid).
pub(crate) fn wrap_position(position: usize, len: usize, loop_index: Option<usize>) -> usize {
    if len == 0 {
        return 0;
    }
    if position < len {
        return position;
    }
    loop_index.filter(|&l| l < len).unwrap_or(0)
}

/// Look up a 1-based song entry (instrument or table number)
pub(crate) fn lookup<T>(items: &[T], number: usize) -> Option<&T> {
    number.checked_sub(1).and_then(|i| items.get(i))
}
