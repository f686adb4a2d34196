use serde::{Deserialize, Serialize};

/// Notification from the render loop to the control side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Emitted on the first tick of every row
    PositionUpdate {
        row: usize,
        tick: u8,
        order_index: usize,
    },
    /// The head crossed into an order entry whose pattern is not loaded.
    /// Answer with `Command::InitPattern` for that order index.
    RequestPattern(usize),
    /// A speed effect changed ticks per row
    SpeedUpdate(u8),
    /// The chip core could not be loaded or faulted; output is silent
    ChipFailed(String),
}

impl EngineEvent {
    pub fn description(&self) -> String {
        match self {
            EngineEvent::PositionUpdate {
                row,
                tick,
                order_index,
            } => format!("Order {:02} row {:02} tick {}", order_index, row, tick),
            EngineEvent::RequestPattern(index) => format!("Pattern requested for order entry {}", index),
            EngineEvent::SpeedUpdate(speed) => format!("Speed changed to {}", speed),
            EngineEvent::ChipFailed(reason) => format!("Chip failed: {}", reason),
        }
    }
}
