use serde::{Deserialize, Serialize};

use super::count_down;

/// Glide from the previous note's period to a target note's period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Portamento {
    pub target_note: usize,
    /// Target period minus starting period
    pub delta: i32,
    pub step: i32,
    pub delay: u8,
    pub counter: u8,
    /// Period offset travelled so far
    pub offset: i32,
    pub active: bool,
}

impl Portamento {
    /// Glide from `from_period` to `to_period` by `magnitude` per step.
    /// The step direction follows the sign of the period difference.
    pub fn new(from_period: u16, to_period: u16, target_note: usize, magnitude: u16, delay: u8) -> Self {
        let delta = to_period as i32 - from_period as i32;
        let delay = delay.max(1);
        Self {
            target_note,
            delta,
            step: magnitude.max(1) as i32 * delta.signum(),
            delay,
            counter: delay,
            offset: 0,
            active: true,
        }
    }

    fn reached(&self) -> bool {
        if self.delta >= 0 {
            self.offset >= self.delta
        } else {
            self.offset <= self.delta
        }
    }

    /// Advance one tick. Returns the target note once the glide lands on it;
    /// the offset is cleared then so the caller can move the note itself.
    #[must_use]
    pub fn next(mut self) -> (Self, Option<usize>) {
        if !self.active || !count_down(&mut self.counter, self.delay) {
            return (self, None);
        }

        self.offset += self.step;
        if self.reached() {
            self.offset = 0;
            self.active = false;
            return (self, Some(self.target_note));
        }
        (self, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(mut porta: Portamento, from: u16) -> (usize, Vec<i32>) {
        let mut periods = Vec::new();
        for tick in 1..10_000 {
            let (next, landed) = porta.next();
            porta = next;
            if landed.is_some() {
                return (tick, periods);
            }
            periods.push(from as i32 + porta.offset);
        }
        panic!("portamento never finished");
    }

    #[test]
    fn test_terminates_within_bound_without_overshoot() {
        for &(from, to, k) in &[(400u16, 300u16, 7u16), (300, 400, 7), (252, 238, 1), (500, 100, 400), (100, 101, 3)] {
            let porta = Portamento::new(from, to, 12, k, 1);
            let (ticks, periods) = run(porta, from);
            let bound = ((from as i32 - to as i32).abs() + k as i32 - 1) / k as i32;
            assert!(ticks as i32 <= bound.max(1), "{from}->{to} by {k} took {ticks}");
            for p in periods {
                assert!(p >= from.min(to) as i32 && p <= from.max(to) as i32);
            }
        }
    }

    #[test]
    fn test_same_period_finishes_immediately() {
        let (porta, landed) = Portamento::new(200, 200, 3, 5, 1).next();
        assert_eq!(landed, Some(3));
        assert!(!porta.active);
        assert_eq!(porta.offset, 0);
    }

    #[test]
    fn test_direction_follows_delta() {
        assert!(Portamento::new(400, 300, 0, 5, 0).step < 0);
        assert!(Portamento::new(300, 400, 0, 5, 0).step > 0);
    }

    #[test]
    fn test_inactive_does_nothing() {
        let porta = Portamento::default();
        assert_eq!(porta.next(), (porta, None));
    }
}
