use crate::error::ChipError;

use super::registers::{ChannelRegisters, RegisterSnapshot};
use super::ChipCore;

/// Writes register snapshots to a chip core, issuing only the primitive
/// writes whose value differs from what was last written.
#[derive(Debug, Clone, Default)]
pub struct RegisterWriter {
    /// Last written state; None forces a full write
    previous: Option<RegisterSnapshot>,
}

impl RegisterWriter {
    pub fn new() -> Self {
        Self { previous: None }
    }

    /// Forget the chip state so the next snapshot is written in full
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    pub fn previous(&self) -> Option<&RegisterSnapshot> {
        self.previous.as_ref()
    }

    /// Write `next` and return the number of primitive writes issued.
    pub fn write(&mut self, next: &RegisterSnapshot, chip: &mut dyn ChipCore) -> Result<usize, ChipError> {
        let full = self.previous.is_none();
        let prev = self.previous.get_or_insert_with(RegisterSnapshot::default);
        let mut writes = 0;

        for (channel, (old, new)) in prev.channels.iter_mut().zip(next.channels.iter()).enumerate() {
            writes += write_channel(channel, old, new, full, chip)?;
        }

        if full || prev.noise != next.noise {
            chip.set_noise(next.noise)?;
            prev.noise = next.noise;
            writes += 1;
        }
        if full || prev.envelope_period != next.envelope_period {
            chip.set_envelope(next.envelope_period)?;
            prev.envelope_period = next.envelope_period;
            writes += 1;
        }
        if full || next.force_envelope_shape || prev.envelope_shape != next.envelope_shape {
            chip.set_envelope_shape(next.envelope_shape)?;
            prev.envelope_shape = next.envelope_shape;
            writes += 1;
        }
        prev.force_envelope_shape = false;

        Ok(writes)
    }
}

fn write_channel(
    channel: usize,
    old: &mut ChannelRegisters,
    new: &ChannelRegisters,
    full: bool,
    chip: &mut dyn ChipCore,
) -> Result<usize, ChipError> {
    let mut writes = 0;
    if full || old.tone != new.tone {
        chip.set_tone(channel, new.tone)?;
        old.tone = new.tone;
        writes += 1;
    }
    if full || old.volume != new.volume {
        chip.set_volume(channel, new.volume)?;
        old.volume = new.volume;
        writes += 1;
    }
    let mixer_changed = old.tone_enabled != new.tone_enabled
        || old.noise_enabled != new.noise_enabled
        || old.envelope_enabled != new.envelope_enabled;
    if full || mixer_changed {
        chip.set_mixer(channel, !new.tone_enabled, !new.noise_enabled, new.envelope_enabled)?;
        old.tone_enabled = new.tone_enabled;
        old.noise_enabled = new.noise_enabled;
        old.envelope_enabled = new.envelope_enabled;
        writes += 1;
    }
    Ok(writes)
}
