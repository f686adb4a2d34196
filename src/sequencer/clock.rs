/// Interrupt timing - converts the output sample clock into tracker ticks
#[derive(Debug, Clone)]
pub struct Clock {
    sample_rate: f64,
    interrupt_hz: f64,
    samples_per_tick: f64,
    sample_counter: f64,
    running: bool,
}

impl Clock {
    pub fn new(sample_rate: u32, interrupt_hz: f64) -> Self {
        let mut clock = Self {
            sample_rate: sample_rate.max(1) as f64,
            interrupt_hz: interrupt_hz.max(1.0),
            samples_per_tick: 0.0,
            sample_counter: 0.0,
            running: false,
        };
        clock.recalculate_timing();
        clock
    }

    fn recalculate_timing(&mut self) {
        // One tick per song interrupt (50 Hz on a PAL machine)
        self.samples_per_tick = (self.sample_rate / self.interrupt_hz).max(1.0);
        if self.sample_counter >= self.samples_per_tick {
            self.sample_counter = 0.0;
        }
    }

    pub fn samples_per_tick(&self) -> f64 {
        self.samples_per_tick
    }

    pub fn sample_counter(&self) -> f64 {
        self.sample_counter
    }

    pub fn set_interrupt_hz(&mut self, hz: f64) {
        self.interrupt_hz = hz.max(1.0);
        self.recalculate_timing();
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1) as f64;
        self.recalculate_timing();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Called once per output sample. Returns true when a tick is due.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.sample_counter += 1.0;
        if self.sample_counter >= self.samples_per_tick {
            // Keep the fractional remainder so non-integer rates don't drift
            self.sample_counter -= self.samples_per_tick;
            return true;
        }
        false
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            // Fire the first tick on the very next sample
            self.sample_counter = self.samples_per_tick - 1.0;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.sample_counter = 0.0;
    }
}
