pub mod bus;
pub mod types;

pub use bus::{EventBus, EventReceiver, EventSender, EVENT_CAPACITY};
pub use types::EngineEvent;
