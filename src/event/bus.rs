use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use super::types::EngineEvent;

/// Position updates arrive once per row; this covers several seconds of
/// playback when the control side stalls
pub const EVENT_CAPACITY: usize = 1024;

/// Event bus from the render loop back to the control side
pub struct EventBus {
    tx: Sender<EngineEvent>,
    rx: Receiver<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = bounded(EVENT_CAPACITY);
        Self { tx, rx }
    }

    /// Sender for the render loop
    pub fn sender(&self) -> EventSender {
        EventSender { tx: self.tx.clone() }
    }

    pub fn receiver(&self) -> EventReceiver {
        EventReceiver { rx: self.rx.clone() }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct EventSender {
    tx: Sender<EngineEvent>,
}

impl EventSender {
    /// Send an event (non-blocking, drops if nobody keeps up)
    pub fn send(&self, event: EngineEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[derive(Clone)]
pub struct EventReceiver {
    rx: Receiver<EngineEvent>,
}

impl EventReceiver {
    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event. None on timeout or when
    /// the render loop is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// All events queued right now
    pub fn drain(&self) -> Vec<EngineEvent> {
        self.rx.try_iter().collect()
    }
}
