use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::types::Command;

/// Room for a full song upload (order, tables, instruments, patterns)
/// before the render thread gets to drain it
pub const COMMAND_CAPACITY: usize = 256;

/// Central command bus from the control side to the render loop
pub struct CommandBus {
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl CommandBus {
    pub fn new() -> Self {
        let (tx, rx) = bounded(COMMAND_CAPACITY);
        Self { tx, rx }
    }

    /// Get a sender that can be cloned and shared
    pub fn sender(&self) -> CommandSender {
        CommandSender { tx: self.tx.clone() }
    }

    /// Get a receiver (typically for the audio thread)
    pub fn receiver(&self) -> CommandReceiver {
        CommandReceiver { rx: self.rx.clone() }
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sender for dispatching commands
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Send a command (non-blocking, drops if buffer full)
    pub fn send(&self, cmd: Command) -> bool {
        match self.tx.try_send(cmd) {
            Ok(()) => true,
            Err(TrySendError::Full(cmd)) => {
                tracing::warn!("command buffer full, dropping '{}'", cmd.description());
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Receiver for consuming commands
#[derive(Clone)]
pub struct CommandReceiver {
    rx: Receiver<Command>,
}

impl CommandReceiver {
    /// Try to receive a command (non-blocking)
    pub fn try_recv(&self) -> Option<Command> {
        self.rx.try_recv().ok()
    }
}
