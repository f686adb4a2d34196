use serde::{Deserialize, Serialize};

pub const DEFAULT_SPEED: u8 = 6;

/// Row/tick/order counters of the playback head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub tick: u8,
    pub speed: u8,
    pub order_index: usize,
    order_len: usize,
}

impl Position {
    pub fn new(speed: u8) -> Self {
        Self {
            row: 0,
            tick: 0,
            speed: speed.max(1),
            order_index: 0,
            order_len: 1,
        }
    }

    pub fn order_len(&self) -> usize {
        self.order_len
    }

    pub fn set_order_len(&mut self, len: usize) {
        self.order_len = len.max(1);
        if self.order_index >= self.order_len {
            self.order_index = 0;
        }
    }

    /// Change ticks per row. The current tick is pulled back inside the new range.
    pub fn set_speed(&mut self, speed: u8) {
        self.speed = speed.max(1);
        if self.tick >= self.speed {
            self.tick = self.speed - 1;
        }
    }

    /// Jump to a row and order entry, starting at tick 0
    pub fn jump(&mut self, row: usize, order_index: usize, pattern_len: usize) {
        self.row = row.min(pattern_len.max(1) - 1);
        self.order_index = order_index % self.order_len;
        self.tick = 0;
    }

    /// Clamp the row after the pattern under the head was replaced
    pub fn clamp_row(&mut self, pattern_len: usize) {
        if self.row >= pattern_len.max(1) {
            self.row = 0;
        }
    }

    /// Step one tick forward. Returns true when the pattern boundary was crossed
    /// and the head moved on to the next order entry.
    pub fn advance(&mut self, pattern_len: usize) -> bool {
        self.tick += 1;
        if self.tick < self.speed {
            return false;
        }

        self.tick = 0;
        self.row += 1;
        if self.row < pattern_len.max(1) {
            return false;
        }

        self.row = 0;
        self.order_index = (self.order_index + 1) % self.order_len;
        true
    }

    pub fn reset(&mut self) {
        self.row = 0;
        self.tick = 0;
        self.order_index = 0;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}
