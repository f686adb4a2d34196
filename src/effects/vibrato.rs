use serde::{Deserialize, Serialize};

use super::count_down;

/// Triangle-wave period modulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vibrato {
    pub speed: u8, // ticks per quarter wave, 1-15
    pub depth: u8, // peak period deviation
    pub delay: u8,
    pub counter: u8,
    pub position: u16,
}

impl Vibrato {
    pub fn new(speed: u8, depth: u8, delay: u8) -> Self {
        Self {
            speed: speed.max(1),
            depth,
            delay,
            counter: delay,
            position: 0,
        }
    }

    /// Length of one full wave in positions
    pub fn period(&self) -> u16 {
        self.speed.max(1) as u16 * 4
    }

    #[must_use]
    pub fn next(mut self) -> Self {
        if count_down(&mut self.counter, self.delay) {
            self.position = (self.position + 1) % self.period();
        }
        self
    }

    /// Period offset at the current position: rise to +depth, fall back to 0,
    /// fall to -depth, rise back to 0.
    pub fn offset(&self) -> i32 {
        let quarter = self.speed.max(1) as i32;
        let depth = self.depth as i32;
        let pos = (self.position % self.period()) as i32;
        match pos / quarter {
            0 => depth * pos / quarter,
            1 => depth * (2 * quarter - pos) / quarter,
            2 => -(depth * (pos - 2 * quarter) / quarter),
            _ => -(depth * (4 * quarter - pos) / quarter),
        }
    }
}
