use serde::{Deserialize, Serialize};

use super::wrap_position;

/// Per-step amplitude sliding of the channel volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AmplitudeSlide {
    #[default]
    None,
    Up,
    Down,
}

/// One step of an instrument macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRow {
    pub tone: bool,
    pub noise: bool,
    pub envelope: bool,
    pub tone_add: i16,        // period delta
    pub tone_accumulate: bool, // delta persists across steps
    pub noise_add: i8,
    pub noise_accumulate: bool,
    pub volume: Option<u8>, // 0-15, None inherits the previous step
    #[serde(default)]
    pub amplitude_slide: AmplitudeSlide,
}

impl InstrumentRow {
    /// Tone-only step at the given volume
    pub fn tone(volume: u8) -> Self {
        Self {
            volume: Some(volume.min(15)),
            ..Self::default()
        }
    }

    /// Noise-only step at the given volume
    pub fn noise(volume: u8, noise_add: i8) -> Self {
        Self {
            tone: false,
            noise: true,
            noise_add,
            volume: Some(volume.min(15)),
            ..Self::default()
        }
    }
}

impl Default for InstrumentRow {
    /// Plain tone at full volume, used whenever a macro has no step to offer
    fn default() -> Self {
        Self {
            tone: true,
            noise: false,
            envelope: false,
            tone_add: 0,
            tone_accumulate: false,
            noise_add: 0,
            noise_accumulate: false,
            volume: Some(15),
            amplitude_slide: AmplitudeSlide::None,
        }
    }
}

/// Looped sequence of macro steps applied while a note sounds
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub rows: Vec<InstrumentRow>,
    pub loop_index: Option<usize>,
}

impl Instrument {
    pub fn new(name: impl Into<String>, rows: Vec<InstrumentRow>, loop_index: Option<usize>) -> Self {
        Self {
            name: name.into(),
            rows,
            loop_index,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bring an exhausted position back to the loop point
    pub fn resolve_position(&self, position: usize) -> usize {
        wrap_position(position, self.rows.len(), self.loop_index)
    }

    /// Step at `position` after wrapping, None for an empty macro
    pub fn step(&self, position: usize) -> Option<&InstrumentRow> {
        self.rows.get(self.resolve_position(position))
    }

    /// Position following `position`, looping at the end of the macro
    pub fn next_position(&self, position: usize) -> usize {
        self.resolve_position(self.resolve_position(position) + 1)
    }
}
