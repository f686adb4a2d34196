use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ChipError;
use crate::sequencer::CHANNELS;

use super::{ChipCore, ChipType};

/// A primitive call received by a [`RecordingChip`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChipWrite {
    Configure { chip_type: ChipType, clock_hz: u32, sample_rate: u32 },
    Pan { channel: usize, left: f32, right: f32 },
    Tone { channel: usize, period: u16 },
    Volume { channel: usize, level: u8 },
    Mixer { channel: usize, tone_off: bool, noise_off: bool, envelope_on: bool },
    Noise(u8),
    Envelope(u16),
    EnvelopeShape(u8),
}

/// Everything a [`RecordingChip`] has seen, plus the register values it holds
#[derive(Debug, Clone, Default)]
pub struct ChipLog {
    pub writes: Vec<ChipWrite>,
    pub processed: usize,
    pub dc_removed: usize,
    pub tone: [u16; CHANNELS],
    pub volume: [u8; CHANNELS],
    /// (tone_off, noise_off, envelope_on) per channel
    pub mixer: [(bool, bool, bool); CHANNELS],
    pub noise: u8,
    pub envelope: u16,
    pub envelope_shape: u8,
}

impl ChipLog {
    /// Number of writes of a given kind, e.g. `|w| matches!(w, ChipWrite::Tone { .. })`
    pub fn count(&self, predicate: impl Fn(&ChipWrite) -> bool) -> usize {
        self.writes.iter().filter(|w| predicate(w)).count()
    }
}

/// In-process chip core that records every primitive write instead of
/// synthesizing. Its output is a level meter of the current volumes, so a
/// sounding channel yields a non-zero sample.
#[derive(Debug, Clone, Default)]
pub struct RecordingChip {
    log: Arc<Mutex<ChipLog>>,
    output: (f32, f32),
    fail_after: Option<usize>,
}

impl RecordingChip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault on every call once `calls` successful `process` calls were made
    pub fn failing_after(calls: usize) -> Self {
        Self {
            fail_after: Some(calls),
            ..Self::default()
        }
    }

    /// Shared handle to the log, readable while the chip is owned elsewhere
    pub fn log(&self) -> Arc<Mutex<ChipLog>> {
        self.log.clone()
    }

    fn check(&self, call: &'static str) -> Result<(), ChipError> {
        match self.fail_after {
            Some(limit) if self.log.lock().processed >= limit => Err(ChipError::Trap {
                call,
                reason: "simulated fault".to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn record(&mut self, write: ChipWrite) {
        let mut log = self.log.lock();
        match write {
            ChipWrite::Tone { channel, period } => log.tone[channel % CHANNELS] = period,
            ChipWrite::Volume { channel, level } => log.volume[channel % CHANNELS] = level,
            ChipWrite::Mixer {
                channel,
                tone_off,
                noise_off,
                envelope_on,
            } => log.mixer[channel % CHANNELS] = (tone_off, noise_off, envelope_on),
            ChipWrite::Noise(value) => log.noise = value,
            ChipWrite::Envelope(period) => log.envelope = period,
            ChipWrite::EnvelopeShape(shape) => log.envelope_shape = shape,
            ChipWrite::Configure { .. } | ChipWrite::Pan { .. } => {}
        }
        log.writes.push(write);
    }
}

impl ChipCore for RecordingChip {
    fn configure(&mut self, chip_type: ChipType, clock_hz: u32, sample_rate: u32) -> Result<(), ChipError> {
        self.check("configure")?;
        self.record(ChipWrite::Configure {
            chip_type,
            clock_hz,
            sample_rate,
        });
        Ok(())
    }

    fn set_pan(&mut self, channel: usize, left: f32, right: f32) -> Result<(), ChipError> {
        self.check("set_pan")?;
        self.record(ChipWrite::Pan { channel, left, right });
        Ok(())
    }

    fn set_tone(&mut self, channel: usize, period: u16) -> Result<(), ChipError> {
        self.check("set_tone")?;
        self.record(ChipWrite::Tone { channel, period });
        Ok(())
    }

    fn set_volume(&mut self, channel: usize, level: u8) -> Result<(), ChipError> {
        self.check("set_volume")?;
        self.record(ChipWrite::Volume { channel, level });
        Ok(())
    }

    fn set_mixer(&mut self, channel: usize, tone_off: bool, noise_off: bool, envelope_on: bool) -> Result<(), ChipError> {
        self.check("set_mixer")?;
        self.record(ChipWrite::Mixer {
            channel,
            tone_off,
            noise_off,
            envelope_on,
        });
        Ok(())
    }

    fn set_noise(&mut self, value: u8) -> Result<(), ChipError> {
        self.check("set_noise")?;
        self.record(ChipWrite::Noise(value));
        Ok(())
    }

    fn set_envelope(&mut self, period: u16) -> Result<(), ChipError> {
        self.check("set_envelope")?;
        self.record(ChipWrite::Envelope(period));
        Ok(())
    }

    fn set_envelope_shape(&mut self, shape: u8) -> Result<(), ChipError> {
        self.check("set_envelope_shape")?;
        self.record(ChipWrite::EnvelopeShape(shape));
        Ok(())
    }

    fn process(&mut self) -> Result<(), ChipError> {
        self.check("process")?;
        let mut log = self.log.lock();
        log.processed += 1;
        let level = log.volume.iter().map(|&v| (v & 0x0F) as f32).sum::<f32>() / 45.0;
        self.output = (level, level);
        Ok(())
    }

    fn remove_dc(&mut self) -> Result<(), ChipError> {
        self.check("remove_dc")?;
        self.log.lock().dc_removed += 1;
        Ok(())
    }

    fn output(&mut self) -> Result<(f32, f32), ChipError> {
        self.check("output")?;
        Ok(self.output)
    }
}
