pub mod clock;
pub mod pattern;
pub mod position;

pub use clock::Clock;
pub use pattern::{
    Note, NoteName, Pattern, PatternRow, RawEffect, Row, TableRef, CHANNELS,
    DEFAULT_PATTERN_LENGTH, ENVELOPE_SHAPE_KEEP, ENVELOPE_SHAPE_OFF, MAX_PATTERN_LENGTH,
};
pub use position::{Position, DEFAULT_SPEED};
