//! Playback engine for AY-3-8910 / YM2149 tracker songs.
//!
//! The control side loads song data and drives transport through
//! [`Command`]s; a [`RenderLoop`] running on the audio thread turns the
//! song into chip register writes tick by tick and pulls synthesized
//! samples out of an external [`ChipCore`].

pub mod audio;
pub mod chip;
pub mod command;
pub mod config;
pub mod effects;
pub mod error;
pub mod event;
pub mod instrument;
pub mod sequencer;
pub mod tracker;

pub use audio::{EngineHandle, RenderLoop};
pub use chip::{ChipCore, ChipLoader, ChipType, RecordingChip};
pub use command::Command;
pub use config::{EngineConfig, StereoLayout};
pub use error::{ChipError, EngineError, Result};
pub use event::EngineEvent;
