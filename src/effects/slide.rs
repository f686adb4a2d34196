use serde::{Deserialize, Serialize};

use super::count_down;

/// Linear period slide. Also drives the shared envelope period slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slide {
    pub step: i32,
    pub delay: u8,
    pub counter: u8,
    /// Running offset added to the sliding value
    pub offset: i32,
    /// The offset was seeded by this row's note; skip the next add
    pub already_applied: bool,
}

impl Slide {
    /// Start a slide continuing from `offset`. A delay of 0 means every tick.
    pub fn new(step: i32, delay: u8, offset: i32) -> Self {
        let delay = delay.max(1);
        Self {
            step,
            delay,
            counter: delay,
            offset,
            already_applied: false,
        }
    }

    /// Pre-apply the first step so a note on the same row starts offset
    pub fn seeded(mut self, offset: i32) -> Self {
        self.offset = offset;
        self.already_applied = true;
        self
    }

    #[must_use]
    pub fn next(mut self) -> Self {
        if count_down(&mut self.counter, self.delay) {
            if self.already_applied {
                self.already_applied = false;
            } else {
                self.offset = self.offset.saturating_add(self.step);
            }
        }
        self
    }
}
