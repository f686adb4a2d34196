use crate::instrument::{lookup, Instrument, Table, TuningTable, DEFAULT_CHIP_CLOCK_HZ};

/// Song data loaded by the control side. Read-only while playing.
#[derive(Debug, Clone, PartialEq)]
pub struct SongData {
    pub instruments: Vec<Instrument>,
    pub tables: Vec<Table>,
    pub tuning: TuningTable,
}

impl SongData {
    pub fn new() -> Self {
        Self {
            instruments: Vec::new(),
            tables: Vec::new(),
            tuning: TuningTable::equal_tempered(DEFAULT_CHIP_CLOCK_HZ),
        }
    }

    /// Instrument by 1-based number
    pub fn instrument(&self, number: usize) -> Option<&Instrument> {
        lookup(&self.instruments, number)
    }

    /// Table by 1-based number
    pub fn table(&self, number: usize) -> Option<&Table> {
        lookup(&self.tables, number)
    }
}

impl Default for SongData {
    fn default() -> Self {
        Self::new()
    }
}
