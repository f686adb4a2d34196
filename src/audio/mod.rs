#[cfg(feature = "audio-output")]
pub mod engine;
pub mod render;

#[cfg(feature = "audio-output")]
pub use engine::AudioEngine;
pub use render::RenderLoop;

use crate::command::CommandSender;
use crate::event::EventReceiver;

/// Control-side ends of the command and event buses
#[derive(Clone)]
pub struct EngineHandle {
    pub commands: CommandSender,
    pub events: EventReceiver,
}
