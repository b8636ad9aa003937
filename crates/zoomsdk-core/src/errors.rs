use thiserror::Error;

use crate::pending::RequestKind;

/// Failure of a bridged request, surfaced to the host as a rejected promise.
///
/// Every variant carries a stable string code (see [`BridgeError::code`])
/// which the host side exposes verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("{0}")]
    Unexpected(String),
    #[error("Error: {error_code}, internalErrorCode={internal_error_code}")]
    Initialization {
        error_code: i32,
        internal_error_code: i32,
    },
    #[error("{0}")]
    Start(String),
    #[error("{0}")]
    Join(String),
    #[error("Error: {error_code}, internalErrorCode={internal_error_code}")]
    Meeting {
        error_code: i32,
        internal_error_code: i32,
    },
    #[error("{0} request superseded by a newer one")]
    Superseded(RequestKind),
}

impl BridgeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unexpected(_) => "ERR_UNEXPECTED_EXCEPTION",
            Self::Initialization { .. } => "ERR_ZOOM_INITIALIZATION",
            Self::Start(_) => "ERR_ZOOM_START",
            Self::Join(_) => "ERR_ZOOM_JOIN",
            Self::Meeting { .. } => "ERR_ZOOM_MEETING",
            Self::Superseded(_) => "ERR_ZOOM_SUPERSEDED",
        }
    }

    /// Build an `Unexpected` error from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::Unexpected(msg)
    }
}
