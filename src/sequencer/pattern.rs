use serde::{Deserialize, Serialize};

/// Number of tone channels on the chip (A, B, C)
pub const CHANNELS: usize = 3;
pub const DEFAULT_PATTERN_LENGTH: usize = 64;
pub const MAX_PATTERN_LENGTH: usize = 256;

/// Envelope column value that leaves the channel's envelope untouched
pub const ENVELOPE_SHAPE_KEEP: u8 = 0;
/// Envelope column value that switches the channel's envelope off
pub const ENVELOPE_SHAPE_OFF: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteName {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl NoteName {
    /// Semitone within the octave (C = 0 .. B = 11)
    pub fn semitone(self) -> usize {
        self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            NoteName::C => "C-",
            NoteName::CSharp => "C#",
            NoteName::D => "D-",
            NoteName::DSharp => "D#",
            NoteName::E => "E-",
            NoteName::F => "F-",
            NoteName::FSharp => "F#",
            NoteName::G => "G-",
            NoteName::GSharp => "G#",
            NoteName::A => "A-",
            NoteName::ASharp => "A#",
            NoteName::B => "B-",
        }
    }
}

/// Note column of a pattern row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Note {
    /// Empty cell, the channel keeps whatever it was doing
    #[default]
    None,
    /// Key off
    Off,
    Pitched { name: NoteName, octave: u8 },
}

impl Note {
    pub fn pitched(name: NoteName, octave: u8) -> Self {
        Note::Pitched { name, octave }
    }

    /// Absolute semitone index counted from C-1. Octaves below 1 clamp to 1.
    pub fn index(&self) -> Option<usize> {
        match *self {
            Note::Pitched { name, octave } => {
                Some((octave.max(1) as usize - 1) * 12 + name.semitone())
            }
            Note::None | Note::Off => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Note::None => "---".to_string(),
            Note::Off => "OFF".to_string(),
            Note::Pitched { name, octave } => format!("{}{}", name.name(), octave),
        }
    }
}

/// Effect column as stored in pattern data, decoded by `effects::Effect::decode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawEffect {
    pub code: u8,
    pub delay: u8,
    pub parameter: u16,
}

impl RawEffect {
    pub fn new(code: u8, delay: u8, parameter: u16) -> Self {
        Self {
            code,
            delay,
            parameter,
        }
    }
}

/// Table (ornament) column of a pattern row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableRef {
    #[default]
    Keep,
    Off,
    /// 1-based table number
    Use(u8),
}

/// One channel cell of a pattern row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    pub note: Note,
    /// 1-based instrument number, 0 keeps the current instrument
    pub instrument: u8,
    /// Pattern volume 1-15, 0 keeps the latched volume
    pub volume: u8,
    pub table: TableRef,
    /// 0 keep, 1-14 set shape, 15 envelope off
    pub envelope_shape: u8,
    pub effect: RawEffect,
}

impl Row {
    pub fn note(note: Note, instrument: u8, volume: u8) -> Self {
        Self {
            note,
            instrument,
            volume: volume.min(15),
            ..Self::default()
        }
    }

    pub fn with_effect(mut self, effect: RawEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_table(mut self, table: TableRef) -> Self {
        self.table = table;
        self
    }

    pub fn with_envelope_shape(mut self, shape: u8) -> Self {
        self.envelope_shape = shape.min(ENVELOPE_SHAPE_OFF);
        self
    }
}

/// Row fields shared by all channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatternRow {
    /// Base noise period, 0 = no change
    pub noise: u8,
    /// Envelope period, 0 = no change
    pub envelope: u16,
    pub envelope_effect: RawEffect,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// channels[channel][row]
    pub channels: [Vec<Row>; CHANNELS],
    /// Shared noise/envelope fields, one per row
    pub globals: Vec<PatternRow>,
}

impl Pattern {
    pub fn new(length: usize) -> Self {
        let length = length.clamp(1, MAX_PATTERN_LENGTH);
        Self {
            channels: std::array::from_fn(|_| vec![Row::default(); length]),
            globals: vec![PatternRow::default(); length],
        }
    }

    /// Number of rows. Ragged channel vectors are treated as padded with empty rows.
    pub fn len(&self) -> usize {
        self.channels
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.globals.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a channel cell, empty if out of range
    pub fn row(&self, channel: usize, index: usize) -> Row {
        self.channels
            .get(channel)
            .and_then(|rows| rows.get(index))
            .copied()
            .unwrap_or_default()
    }

    /// Get the shared fields of a row, empty if out of range
    pub fn pattern_row(&self, index: usize) -> PatternRow {
        self.globals.get(index).copied().unwrap_or_default()
    }

    pub fn set_row(&mut self, channel: usize, index: usize, row: Row) {
        if let Some(cell) = self
            .channels
            .get_mut(channel)
            .and_then(|rows| rows.get_mut(index))
        {
            *cell = row;
        }
    }

    pub fn set_pattern_row(&mut self, index: usize, row: PatternRow) {
        if let Some(cell) = self.globals.get_mut(index) {
            *cell = row;
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_LENGTH)
    }
}
