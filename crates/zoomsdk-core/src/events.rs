use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::errors::BridgeError;
use crate::sdk::MeetingStatus;

/// Events emitted by the gateway to host listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    Initialized,
    MeetingStatusChanged {
        status: MeetingStatus,
        error_code: i32,
        internal_error_code: i32,
    },
    AuthIdentityExpired,
}

/// Trait for receiving events from the gateway.
/// Implementations must be Send + Sync (called from SDK callback threads).
pub trait BridgeEventListener: Send + Sync {
    fn on_event(&self, event: BridgeEvent);
}

/// Internal event emitter that dispatches to registered listeners.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<std::sync::RwLock<Vec<Arc<dyn BridgeEventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn BridgeEventListener>) {
        self.listeners.write().unwrap().push(listener);
    }

    /// Deliver `event` to every listener.
    ///
    /// Listeners run outside the lock, so they may register further
    /// listeners. A panicking listener is logged and skipped.
    pub fn emit(&self, event: BridgeEvent) {
        let listeners = self.listeners.read().unwrap().clone();
        for listener in listeners {
            let delivered = catch_unwind(AssertUnwindSafe(|| listener.on_event(event.clone())));
            if let Err(payload) = delivered {
                let err = BridgeError::from_panic(payload);
                tracing::error!(?event, "event listener panicked: {err}");
            }
        }
    }
}
