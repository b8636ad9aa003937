//! Zoom SDK bridge core.
//!
//! Pure Rust crate with no platform dependencies. Correlates host requests
//! (initialize, start/join meeting) with the native SDK's asynchronous
//! callbacks. Consumed by native shells via UniFFI bindings.

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod pending;
pub mod sdk;
pub mod state;

pub use config::{ConfigStore, SdkConfig};
pub use dispatch::{DispatchError, InlineDispatcher, RuntimeDispatcher, UiDispatcher, UiTask};
pub use errors::BridgeError;
pub use events::{BridgeEvent, BridgeEventListener, EventEmitter};
pub use gateway::SdkGateway;
pub use pending::{Outcome, PendingResult, PendingSlot, RequestId, RequestKind};
pub use sdk::{
    InitParams, JoinMeetingParams, MEETING_ERROR_SUCCESS, MeetingService, MeetingStatus,
    SdkListener, StartMeetingParams, ZOOM_ERROR_SUCCESS, ZoomSdk,
};
pub use state::SessionState;
