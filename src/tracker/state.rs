use crate::effects::{Arpeggio, OnOff, Portamento, Slide, Vibrato};
use crate::sequencer::{Position, CHANNELS};

pub const DEFAULT_PATTERN_VOLUME: u8 = 15;
/// Amplitude sliding saturates at one full volume range either way
pub const MAX_AMPLITUDE_SLIDE: i8 = 15;

/// Playback state of one chip channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEffectState {
    /// Note set by the pattern (semitone index)
    pub base_note: usize,
    /// Note after the table offset for this tick
    pub current_note: usize,
    pub sound_enabled: bool,
    pub muted: bool,

    /// 1-based instrument number, 0 = none
    pub instrument: usize,
    pub instrument_position: usize,
    /// 1-based table number, 0 = none
    pub table: usize,
    pub table_position: usize,
    pub table_counter: u8,

    pub pattern_volume: u8,
    /// Envelope switched on for this channel by the envelope column
    pub envelope_enabled: bool,
    /// Volume of the last macro step that set one
    pub last_volume: u8,

    pub tone_accumulator: i32,
    pub noise_accumulator: i32,
    pub amplitude_sliding: i8,

    pub slide: Option<Slide>,
    pub portamento: Option<Portamento>,
    pub on_off: Option<OnOff>,
    pub arpeggio: Option<Arpeggio>,
    pub vibrato: Option<Vibrato>,

    /// Tone period written on the previous tick, kept while silent
    pub last_tone: u16,
}

impl ChannelEffectState {
    pub fn new() -> Self {
        Self {
            base_note: 0,
            current_note: 0,
            sound_enabled: false,
            muted: false,
            instrument: 0,
            instrument_position: 0,
            table: 0,
            table_position: 0,
            table_counter: 0,
            pattern_volume: DEFAULT_PATTERN_VOLUME,
            envelope_enabled: false,
            last_volume: 15,
            tone_accumulator: 0,
            noise_accumulator: 0,
            amplitude_sliding: 0,
            slide: None,
            portamento: None,
            on_off: None,
            arpeggio: None,
            vibrato: None,
            last_tone: 0,
        }
    }

    /// Clear macro accumulators and pitch slides
    pub fn clear_accumulators(&mut self) {
        self.tone_accumulator = 0;
        self.noise_accumulator = 0;
        self.amplitude_sliding = 0;
        self.slide = None;
        self.portamento = None;
    }

    /// Drop arpeggio, vibrato and the on/off gate
    pub fn clear_modulation(&mut self) {
        self.arpeggio = None;
        self.vibrato = None;
        self.on_off = None;
    }

    /// Combined period offset of slide and portamento
    pub fn slide_offset(&self) -> i32 {
        self.slide.map_or(0, |s| s.offset) + self.portamento.map_or(0, |p| p.offset)
    }

    /// Whether the on/off gate currently lets the channel sound
    pub fn gate_open(&self) -> bool {
        self.on_off.map_or(true, |gate| gate.enabled)
    }
}

impl Default for ChannelEffectState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the tracker mutates while playing. Owned by the render loop
/// and passed by reference into the row interpreter, effect stepping and
/// the instrument driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    pub position: Position,
    pub channels: [ChannelEffectState; CHANNELS],
    /// Noise period from the pattern, 0-31
    pub noise_base: u8,
    /// Envelope period from the pattern
    pub envelope_base: u16,
    pub envelope_slide: Option<Slide>,
    pub envelope_shape: u8,
    /// Shape was assigned this row and must be rewritten
    pub force_envelope_shape: bool,
}

impl TrackerState {
    pub fn new(speed: u8) -> Self {
        Self {
            position: Position::new(speed),
            channels: std::array::from_fn(|_| ChannelEffectState::new()),
            noise_base: 0,
            envelope_base: 0,
            envelope_slide: None,
            envelope_shape: 0,
            force_envelope_shape: false,
        }
    }

    /// Zero the transient playback fields. Speed, order length and channel
    /// mutes survive; loaded song data lives elsewhere and is untouched.
    pub fn reset(&mut self) {
        self.position.reset();
        for channel in self.channels.iter_mut() {
            let muted = channel.muted;
            *channel = ChannelEffectState::new();
            channel.muted = muted;
        }
        self.noise_base = 0;
        self.envelope_base = 0;
        self.envelope_slide = None;
        self.envelope_shape = 0;
        self.force_envelope_shape = false;
    }

    /// Envelope period including the running envelope slide, clamped to 16 bits
    pub fn envelope_period(&self) -> u16 {
        let offset = self.envelope_slide.map_or(0, |s| s.offset);
        (self.envelope_base as i32 + offset).clamp(0, u16::MAX as i32) as u16
    }

    pub fn set_muted(&mut self, channel: usize, muted: bool) {
        if let Some(channel) = self.channels.get_mut(channel) {
            channel.muted = muted;
        }
    }
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new(crate::sequencer::DEFAULT_SPEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_keeps_mute_and_speed() {
        let mut state = TrackerState::new(3);
        state.set_muted(1, true);
        state.channels[1].base_note = 40;
        state.channels[1].tone_accumulator = 9;
        state.position.row = 12;
        state.envelope_base = 500;

        state.reset();
        assert!(state.channels[1].muted);
        assert_eq!(state.channels[1].base_note, 0);
        assert_eq!(state.channels[1].tone_accumulator, 0);
        assert_eq!(state.position.row, 0);
        assert_eq!(state.position.speed, 3);
        assert_eq!(state.envelope_base, 0);
    }

    #[test]
    fn test_envelope_period_clamps() {
        let mut state = TrackerState::default();
        state.envelope_base = 65_000;
        state.envelope_slide = Some(Slide::new(1000, 1, 1000));
        assert_eq!(state.envelope_period(), u16::MAX);
        state.envelope_base = 10;
        state.envelope_slide = Some(Slide::new(-1000, 1, -1000));
        assert_eq!(state.envelope_period(), 0);
    }

    #[test]
    fn test_mute_out_of_range_ignored() {
        let mut state = TrackerState::default();
        state.set_muted(9, true);
        assert!(state.channels.iter().all(|c| !c.muted));
    }
}
