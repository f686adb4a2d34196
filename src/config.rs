use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chip::{ChipType, OutputOffsets};
use crate::error::{EngineError, Result};
use crate::instrument::DEFAULT_CHIP_CLOCK_HZ;
use crate::sequencer::{CHANNELS, DEFAULT_SPEED};

pub const MIN_SAMPLE_RATE: u32 = 8000;
pub const MIN_INTERRUPT_HZ: f64 = 1.0;

/// Placement of the three chip channels in the stereo field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StereoLayout {
    Mono,
    /// A left, B centre, C right
    #[default]
    Abc,
    /// A left, C centre, B right
    Acb,
}

impl StereoLayout {
    /// (left, right) gain per channel
    pub fn pans(self) -> [(f32, f32); CHANNELS] {
        const LEFT: (f32, f32) = (0.8, 0.2);
        const CENTRE: (f32, f32) = (0.5, 0.5);
        const RIGHT: (f32, f32) = (0.2, 0.8);
        match self {
            StereoLayout::Mono => [CENTRE; CHANNELS],
            StereoLayout::Abc => [LEFT, CENTRE, RIGHT],
            StereoLayout::Acb => [LEFT, RIGHT, CENTRE],
        }
    }
}

/// Engine settings, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub chip_clock_hz: u32,
    pub interrupt_hz: f64,
    pub chip_type: ChipType,
    pub stereo: StereoLayout,
    /// Linear ramp after (re)start, in samples
    pub fade_in_samples: u32,
    pub initial_speed: u8,
    pub output_offsets: OutputOffsets,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            chip_clock_hz: DEFAULT_CHIP_CLOCK_HZ,
            interrupt_hz: 50.0,
            chip_type: ChipType::Ay,
            stereo: StereoLayout::Abc,
            fade_in_samples: 512,
            initial_speed: DEFAULT_SPEED,
            output_offsets: OutputOffsets::default(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.sanitized()
    }

    /// Pull out-of-range values back into range. Fails only on values that
    /// cannot be repaired.
    pub fn sanitized(mut self) -> Result<Self> {
        if !self.interrupt_hz.is_finite() {
            return Err(EngineError::Config(format!("interrupt rate {} is not a number", self.interrupt_hz)));
        }
        if self.interrupt_hz < MIN_INTERRUPT_HZ {
            tracing::warn!("interrupt rate {} Hz raised to {}", self.interrupt_hz, MIN_INTERRUPT_HZ);
            self.interrupt_hz = MIN_INTERRUPT_HZ;
        }
        if self.sample_rate < MIN_SAMPLE_RATE {
            tracing::warn!("sample rate {} raised to {}", self.sample_rate, MIN_SAMPLE_RATE);
            self.sample_rate = MIN_SAMPLE_RATE;
        }
        if self.chip_clock_hz == 0 {
            tracing::warn!("chip clock of 0 Hz replaced with {}", DEFAULT_CHIP_CLOCK_HZ);
            self.chip_clock_hz = DEFAULT_CHIP_CLOCK_HZ;
        }
        self.initial_speed = self.initial_speed.max(1);
        Ok(self)
    }
}
