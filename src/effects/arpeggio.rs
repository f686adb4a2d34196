use serde::{Deserialize, Serialize};

use super::count_down;

/// Three-note arpeggio cycling root, +semitone1, +semitone2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Arpeggio {
    pub semitone1: u8,
    pub semitone2: u8,
    pub delay: u8,
    pub counter: u8,
    pub position: u8, // 0-2
}

impl Arpeggio {
    pub fn new(semitone1: u8, semitone2: u8, delay: u8) -> Self {
        let delay = delay.max(1);
        Self {
            semitone1,
            semitone2,
            delay,
            counter: delay,
            position: 0,
        }
    }

    #[must_use]
    pub fn next(mut self) -> Self {
        if count_down(&mut self.counter, self.delay) {
            self.position = (self.position + 1) % 3;
        }
        self
    }

    /// Semitone offset for the current position. Never written back to the note.
    pub fn offset(&self) -> i32 {
        match self.position {
            0 => 0,
            1 => self.semitone1 as i32,
            _ => self.semitone2 as i32,
        }
    }
}
