//! Per-tick effect state machines.
//!
//! Pattern effect columns are decoded once into [`Effect`] when a row is
//! interpreted; the resulting state records are then stepped every tick
//! with their `next` transitions, which are pure functions of the state.

pub mod arpeggio;
pub mod duty;
pub mod portamento;
pub mod slide;
pub mod vibrato;

use serde::{Deserialize, Serialize};

use crate::sequencer::RawEffect;

pub use arpeggio::Arpeggio;
pub use duty::OnOff;
pub use portamento::Portamento;
pub use slide::Slide;
pub use vibrato::Vibrato;

pub const CODE_SLIDE_UP: u8 = 0x01;
pub const CODE_SLIDE_DOWN: u8 = 0x02;
pub const CODE_PORTAMENTO: u8 = 0x03;
pub const CODE_ON_OFF: u8 = 0x06;
pub const CODE_ENVELOPE_SLIDE_UP: u8 = 0x09;
pub const CODE_ENVELOPE_SLIDE_DOWN: u8 = 0x0A;
pub const CODE_SPEED: u8 = 0x0B;
pub const CODE_ARPEGGIO: u8 = b'A';
pub const CODE_VIBRATO: u8 = b'V';
pub const CODE_PORTAMENTO_ALT: u8 = b'P';
pub const CODE_SPEED_ALT: u8 = b'S';

/// Channel effect decoded from a pattern row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Period decreases by `step` every `delay` ticks
    SlideUp { step: u16, delay: u8 },
    /// Period increases by `step` every `delay` ticks
    SlideDown { step: u16, delay: u8 },
    Portamento { step: u16, delay: u8 },
    OnOff { on: u8, off: u8 },
    Arpeggio { semitone1: u8, semitone2: u8, delay: u8 },
    Vibrato { speed: u8, depth: u8, delay: u8 },
    Speed(u8),
}

impl Effect {
    /// Decode an effect column. Empty and unknown codes yield None.
    pub fn decode(raw: RawEffect) -> Option<Self> {
        let (high, low) = nibbles(raw.parameter);
        match raw.code {
            CODE_SLIDE_UP => Some(Effect::SlideUp {
                step: raw.parameter,
                delay: raw.delay,
            }),
            CODE_SLIDE_DOWN => Some(Effect::SlideDown {
                step: raw.parameter,
                delay: raw.delay,
            }),
            CODE_PORTAMENTO | CODE_PORTAMENTO_ALT => Some(Effect::Portamento {
                step: raw.parameter,
                delay: raw.delay,
            }),
            CODE_ON_OFF => Some(Effect::OnOff { on: high, off: low }),
            CODE_ARPEGGIO => Some(Effect::Arpeggio {
                semitone1: high,
                semitone2: low,
                delay: raw.delay,
            }),
            CODE_VIBRATO => Some(Effect::Vibrato {
                speed: high,
                depth: low,
                delay: raw.delay,
            }),
            CODE_SPEED | CODE_SPEED_ALT => match (raw.parameter & 0xFF) as u8 {
                0 => None,
                speed => Some(Effect::Speed(speed)),
            },
            _ => None,
        }
    }
}

/// Effect on the shared envelope period, from the pattern's global column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeEffect {
    SlideUp { step: u16, delay: u8 },
    SlideDown { step: u16, delay: u8 },
}

impl EnvelopeEffect {
    pub fn decode(raw: RawEffect) -> Option<Self> {
        match raw.code {
            CODE_ENVELOPE_SLIDE_UP => Some(EnvelopeEffect::SlideUp {
                step: raw.parameter,
                delay: raw.delay,
            }),
            CODE_ENVELOPE_SLIDE_DOWN => Some(EnvelopeEffect::SlideDown {
                step: raw.parameter,
                delay: raw.delay,
            }),
            _ => None,
        }
    }

    /// Slide state for this effect, continuing from `offset`
    pub fn slide(self, offset: i32) -> Slide {
        match self {
            EnvelopeEffect::SlideUp { step, delay } => Slide::new(step as i32, delay, offset),
            EnvelopeEffect::SlideDown { step, delay } => Slide::new(-(step as i32), delay, offset),
        }
    }
}

/// High and low nibble of a parameter's low byte
fn nibbles(parameter: u16) -> (u8, u8) {
    (((parameter >> 4) & 0x0F) as u8, (parameter & 0x0F) as u8)
}

/// Count one tick down. Returns true when the counter ran out, after
/// reloading it with `delay`.
pub(crate) fn count_down(counter: &mut u8, delay: u8) -> bool {
    if *counter > 0 {
        *counter -= 1;
    }
    if *counter == 0 {
        *counter = delay;
        return true;
    }
    false
}
