use crate::sequencer::CHANNELS;

/// Bit 4 of a volume register hands the channel's amplitude to the envelope
pub const VOLUME_ENVELOPE_BIT: u8 = 0x10;
pub const NOISE_MASK: u8 = 0x1F;

/// Register values of one tone channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelRegisters {
    pub tone: u16,  // 12-bit period
    pub volume: u8, // 0-15, plus VOLUME_ENVELOPE_BIT
    pub tone_enabled: bool,
    pub noise_enabled: bool,
    pub envelope_enabled: bool,
}

impl ChannelRegisters {
    /// Silent channel: volume 0 with tone, noise and envelope disabled
    pub fn silent(tone: u16) -> Self {
        Self {
            tone,
            ..Self::default()
        }
    }

    pub fn is_silent(&self) -> bool {
        self.volume == 0 && !self.tone_enabled && !self.noise_enabled && !self.envelope_enabled
    }
}

/// Complete chip register state computed for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterSnapshot {
    pub channels: [ChannelRegisters; CHANNELS],
    pub noise: u8,
    pub envelope_period: u16,
    pub envelope_shape: u8,
    /// Rewrite the shape even if unchanged, restarting the envelope cycle
    pub force_envelope_shape: bool,
}

impl RegisterSnapshot {
    /// All channels silent, globals kept
    pub fn silenced(&self) -> Self {
        let mut snapshot = *self;
        for channel in snapshot.channels.iter_mut() {
            *channel = ChannelRegisters::silent(channel.tone);
        }
        snapshot.force_envelope_shape = false;
        snapshot
    }
}
