use serde::{Deserialize, Serialize};

use super::wrap_position;

fn default_speed() -> u8 {
    1
}

/// Looped sequence of semitone offsets layered on the channel's note (ornament)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub offsets: Vec<i8>,
    pub loop_index: Option<usize>,
    #[serde(default = "default_speed")]
    pub speed: u8, // ticks per table step, 1-255
}

impl Table {
    pub fn new(name: impl Into<String>, offsets: Vec<i8>, loop_index: Option<usize>) -> Self {
        Self {
            name: name.into(),
            offsets,
            loop_index,
            speed: 1,
        }
    }

    pub fn with_speed(mut self, speed: u8) -> Self {
        self.speed = speed.max(1);
        self
    }

    /// Offset at `position`, 0 for an empty table
    pub fn offset(&self, position: usize) -> i8 {
        self.offsets
            .get(wrap_position(position, self.offsets.len(), self.loop_index))
            .copied()
            .unwrap_or(0)
    }

    pub fn next_position(&self, position: usize) -> usize {
        let len = self.offsets.len();
        wrap_position(wrap_position(position, len, self.loop_index) + 1, len, self.loop_index)
    }
}
