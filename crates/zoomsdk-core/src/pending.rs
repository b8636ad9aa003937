use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::errors::BridgeError;

/// Final outcome of a bridged request: a success message or a coded error.
pub type Outcome = Result<String, BridgeError>;

/// The two independent request families the gateway correlates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Initialize,
    Meeting,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialize => f.write_str("initialize"),
            Self::Meeting => f.write_str("meeting"),
        }
    }
}

/// Identifies one armed request, so late completions can be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Caller side of a bridged request.
///
/// Resolves once the gateway settles the request, either synchronously
/// (validation failure, short-circuit) or from a later SDK callback.
#[derive(Debug)]
pub struct PendingResult {
    rx: oneshot::Receiver<Outcome>,
}

impl PendingResult {
    /// A result that is already settled.
    pub fn ready(outcome: Outcome) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self { rx }
    }

    pub fn resolved(message: impl Into<String>) -> Self {
        Self::ready(Ok(message.into()))
    }

    pub fn rejected(err: BridgeError) -> Self {
        Self::ready(Err(err))
    }
}

impl Future for PendingResult {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(BridgeError::Unexpected(
                    "request dropped before completion".to_string(),
                ))
            })
        })
    }
}

struct Armed {
    id: RequestId,
    tx: oneshot::Sender<Outcome>,
}

/// Single-slot holder for the outstanding request of one [`RequestKind`].
///
/// At most one request is armed at a time. Settling takes the sender out of
/// the slot, so each request completes exactly once and any later terminal
/// event for the same kind is a no-op.
pub struct PendingSlot {
    kind: RequestKind,
    armed: Mutex<Option<Armed>>,
}

impl PendingSlot {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            armed: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Arm the slot for a new request.
    ///
    /// A request still waiting in the slot is rejected with
    /// [`BridgeError::Superseded`].
    pub fn arm(&self) -> (RequestId, PendingResult) {
        let (tx, rx) = oneshot::channel();
        let id = RequestId::new();
        let previous = self.armed.lock().unwrap().replace(Armed { id, tx });
        if let Some(previous) = previous {
            tracing::warn!(
                kind = %self.kind,
                superseded = %previous.id,
                by = %id,
                "pending request superseded"
            );
            let _ = previous.tx.send(Err(BridgeError::Superseded(self.kind)));
        }
        (id, PendingResult { rx })
    }

    /// Settle the armed request successfully. Returns false if nothing was pending.
    pub fn resolve(&self, message: impl Into<String>) -> bool {
        self.settle(None, Ok(message.into()))
    }

    /// Reject the armed request. Returns false if nothing was pending.
    pub fn reject(&self, err: BridgeError) -> bool {
        self.settle(None, Err(err))
    }

    /// Reject only if the slot still holds request `id`.
    pub fn reject_if(&self, id: RequestId, err: BridgeError) -> bool {
        self.settle(Some(id), Err(err))
    }

    pub fn is_pending(&self) -> bool {
        self.armed.lock().unwrap().is_some()
    }

    pub fn current(&self) -> Option<RequestId> {
        self.armed.lock().unwrap().as_ref().map(|a| a.id)
    }

    fn settle(&self, expected: Option<RequestId>, outcome: Outcome) -> bool {
        let armed = {
            let mut guard = self.armed.lock().unwrap();
            let stale = matches!((guard.as_ref(), expected), (Some(a), Some(id)) if a.id != id);
            if stale { None } else { guard.take() }
        };
        let Some(armed) = armed else {
            return false;
        };
        tracing::debug!(kind = %self.kind, id = %armed.id, ok = outcome.is_ok(), "settling request");
        // The caller may have dropped its PendingResult; that is not an error here.
        let _ = armed.tx.send(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    #[tokio::test]
    async fn resolve_delivers_once() {
        let slot = PendingSlot::new(RequestKind::Meeting);
        let (_, result) = slot.arm();
        assert!(slot.is_pending());

        assert!(slot.resolve("Connected to zoom meeting"));
        assert!(!slot.is_pending());
        assert!(!slot.resolve("again"));
        assert!(!slot.reject(BridgeError::Unexpected("late".into())));

        assert_eq!(result.await, Ok("Connected to zoom meeting".to_string()));
    }

    #[test]
    fn armed_result_stays_pending_until_settled() {
        let slot = PendingSlot::new(RequestKind::Initialize);
        let (_, mut result) = slot.arm();
        assert!((&mut result).now_or_never().is_none());

        slot.reject(BridgeError::Initialization {
            error_code: 1,
            internal_error_code: 2,
        });
        let outcome = result.now_or_never().expect("settled");
        assert_eq!(outcome.unwrap_err().code(), "ERR_ZOOM_INITIALIZATION");
    }

    #[tokio::test]
    async fn arming_again_supersedes_previous_request() {
        let slot = PendingSlot::new(RequestKind::Meeting);
        let (first_id, first) = slot.arm();
        let (second_id, second) = slot.arm();
        assert_ne!(first_id, second_id);
        assert_eq!(slot.current(), Some(second_id));

        assert_eq!(
            first.await,
            Err(BridgeError::Superseded(RequestKind::Meeting))
        );

        slot.resolve("ok");
        assert_eq!(second.await, Ok("ok".to_string()));
    }

    #[tokio::test]
    async fn reject_if_ignores_stale_id() {
        let slot = PendingSlot::new(RequestKind::Meeting);
        let (stale, _first) = slot.arm();
        let (_, second) = slot.arm();

        assert!(!slot.reject_if(stale, BridgeError::Start("nope".into())));
        assert!(slot.is_pending());

        slot.resolve("ok");
        assert_eq!(second.await, Ok("ok".to_string()));
    }

    #[tokio::test]
    async fn dropped_slot_surfaces_unexpected() {
        let slot = PendingSlot::new(RequestKind::Meeting);
        let (_, result) = slot.arm();
        drop(slot);

        let err = result.await.unwrap_err();
        assert_eq!(err.code(), "ERR_UNEXPECTED_EXCEPTION");
    }

    #[tokio::test]
    async fn ready_results_are_already_settled() {
        let result = PendingResult::resolved("done");
        assert_eq!(result.await, Ok("done".to_string()));

        let result = PendingResult::rejected(BridgeError::Join("bad".into()));
        assert_eq!(result.await, Err(BridgeError::Join("bad".into())));
    }
}
