//! Binding to the external sound-chip core.
//!
//! The core owns synthesis; the engine only talks to it through the narrow
//! numeric interface of [`ChipCore`]. Register writes go through
//! [`RegisterWriter`], which only touches what changed since the last tick.

pub mod diff;
pub mod recording;
pub mod registers;
#[cfg(feature = "wasm-core")]
pub mod wasm;

use serde::{Deserialize, Serialize};

use crate::error::ChipError;

pub use diff::RegisterWriter;
pub use recording::{ChipLog, ChipWrite, RecordingChip};
pub use registers::{ChannelRegisters, RegisterSnapshot, NOISE_MASK, VOLUME_ENVELOPE_BIT};
#[cfg(feature = "wasm-core")]
pub use wasm::WasmChipCore;

/// Channel mode passed to [`ChipCore::configure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChipType {
    /// General Instrument AY-3-8910 (16 volume steps)
    #[default]
    Ay = 0,
    /// Yamaha YM2149 (32 envelope steps)
    Ym = 1,
}

/// Byte offsets of the two f32 output samples inside the core's memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOffsets {
    pub left: usize,
    pub right: usize,
}

impl Default for OutputOffsets {
    fn default() -> Self {
        Self { left: 0, right: 4 }
    }
}

/// Numeric interface of a chip core.
///
/// Channel arguments are 0 (A) to 2 (C). Every call may fail if the core
/// itself faults; a failed core is not called again.
pub trait ChipCore: Send {
    fn configure(&mut self, chip_type: ChipType, clock_hz: u32, sample_rate: u32) -> Result<(), ChipError>;

    /// Stereo placement of a channel, gains 0.0-1.0
    fn set_pan(&mut self, channel: usize, left: f32, right: f32) -> Result<(), ChipError>;

    fn set_tone(&mut self, channel: usize, period: u16) -> Result<(), ChipError>;

    fn set_volume(&mut self, channel: usize, level: u8) -> Result<(), ChipError>;

    /// Mixer bits for one channel. Note the polarity: tone and noise take
    /// "off" flags like the hardware register, envelope takes "on".
    fn set_mixer(&mut self, channel: usize, tone_off: bool, noise_off: bool, envelope_on: bool) -> Result<(), ChipError>;

    fn set_noise(&mut self, value: u8) -> Result<(), ChipError>;

    fn set_envelope(&mut self, period: u16) -> Result<(), ChipError>;

    /// Writing the shape restarts the envelope cycle on the chip
    fn set_envelope_shape(&mut self, shape: u8) -> Result<(), ChipError>;

    /// Synthesize one output sample
    fn process(&mut self) -> Result<(), ChipError>;

    fn remove_dc(&mut self) -> Result<(), ChipError>;

    /// Left/right samples produced by the last `process`
    fn output(&mut self) -> Result<(f32, f32), ChipError>;
}

/// Builds a chip core from a binary module. Called on the render thread
/// when an `Init` command arrives.
pub type ChipLoader = Box<dyn FnMut(&[u8]) -> Result<Box<dyn ChipCore>, ChipError> + Send>;
