use serde::{Deserialize, Serialize};

/// Periodic gate: `on` ticks audible, `off` ticks silent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnOff {
    pub on: u8,
    pub off: u8,
    pub counter: u8,
    pub enabled: bool,
}

impl OnOff {
    /// Zero durations are stretched to one tick so the gate keeps cycling
    pub fn new(on: u8, off: u8) -> Self {
        let on = on.max(1);
        Self {
            on,
            off: off.max(1),
            counter: on,
            enabled: true,
        }
    }

    #[must_use]
    pub fn next(mut self) -> Self {
        if self.counter > 0 {
            self.counter -= 1;
        }
        if self.counter == 0 {
            self.enabled = !self.enabled;
            self.counter = if self.enabled { self.on } else { self.off };
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duty_0x53_ratio_and_period() {
        let mut gate = OnOff::new(5, 3);
        // Run into the first toggle, then measure whole periods
        while gate.enabled {
            gate = gate.next();
        }
        let mut pattern = Vec::new();
        pattern.push(gate.enabled);
        for _ in 1..80 {
            gate = gate.next();
            pattern.push(gate.enabled);
        }
        assert_eq!(pattern.iter().filter(|&&e| e).count(), 50);
        for (i, enabled) in pattern.iter().enumerate() {
            assert_eq!(*enabled, pattern[i % 8]);
        }
        assert_eq!(&pattern[..8], &[false, false, false, true, true, true, true, true]);
    }

    #[test]
    fn test_zero_durations_still_cycle() {
        let mut gate = OnOff::new(0, 0);
        let mut states = Vec::new();
        for _ in 0..4 {
            gate = gate.next();
            states.push(gate.enabled);
        }
        assert_eq!(states, vec![false, true, false, true]);
    }
}
