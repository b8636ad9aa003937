//! Abstraction over the native video-conferencing SDK.
//!
//! The SDK itself (authentication, media, meeting UI) lives outside this
//! crate. Platform shells implement these traits over the real SDK; the
//! gateway only talks to them.

use std::sync::Arc;

/// Success value of the SDK's initialize callback.
pub const ZOOM_ERROR_SUCCESS: i32 = 0;

/// Success value returned by start/join calls.
pub const MEETING_ERROR_SUCCESS: i32 = 0;

/// Meeting status as reported by the SDK's meeting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingStatus {
    Idle,
    Connecting,
    WaitingForHost,
    InMeeting,
    Disconnecting,
    Reconnecting,
    Failed,
    InWaitingRoom,
    WebinarPromote,
    WebinarDepromote,
    Unknown,
}

impl MeetingStatus {
    /// Whether this status ends a pending meeting request.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::InMeeting | Self::Failed)
    }
}

/// Parameters for SDK initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitParams {
    pub app_key: String,
    pub app_secret: String,
    pub domain: String,
    pub enable_log: bool,
    pub log_size: u32,
}

/// Parameters for starting a meeting without an SDK login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartMeetingParams {
    pub display_name: String,
    pub meeting_no: String,
    pub user_id: String,
    pub user_type: i32,
    pub zoom_access_token: String,
    pub zoom_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinMeetingParams {
    pub display_name: String,
    pub meeting_no: String,
    pub password: Option<String>,
}

/// Callbacks fired by the SDK, on whatever thread it chooses.
pub trait SdkListener: Send + Sync {
    fn on_initialize_result(&self, error_code: i32, internal_error_code: i32);
    fn on_meeting_status_changed(
        &self,
        status: MeetingStatus,
        error_code: i32,
        internal_error_code: i32,
    );
    fn on_auth_identity_expired(&self);
}

/// Entry point of the native SDK.
pub trait ZoomSdk: Send + Sync {
    fn is_initialized(&self) -> bool;

    /// Start asynchronous initialization. The outcome arrives through
    /// [`SdkListener::on_initialize_result`].
    fn initialize(&self, params: InitParams, listener: Arc<dyn SdkListener>);

    /// The meeting service, available once the SDK is initialized.
    fn meeting_service(&self) -> Option<Arc<dyn MeetingService>>;
}

/// Meeting operations of the native SDK.
///
/// `start_meeting` and `join_meeting` return a meeting error code;
/// [`MEETING_ERROR_SUCCESS`] means the request was accepted and its
/// outcome will arrive through [`SdkListener::on_meeting_status_changed`].
pub trait MeetingService: Send + Sync {
    fn meeting_status(&self) -> MeetingStatus;
    fn current_meeting_number(&self) -> i64;
    fn start_meeting(&self, params: &StartMeetingParams) -> i32;
    fn join_meeting(&self, params: &JoinMeetingParams) -> i32;
    fn return_to_meeting(&self);
    fn add_listener(&self, listener: Arc<dyn SdkListener>);
    fn remove_listener(&self, listener: &Arc<dyn SdkListener>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_in_meeting_and_failed_are_terminal() {
        assert!(MeetingStatus::InMeeting.is_terminal());
        assert!(MeetingStatus::Failed.is_terminal());
        for status in [
            MeetingStatus::Idle,
            MeetingStatus::Connecting,
            MeetingStatus::WaitingForHost,
            MeetingStatus::Disconnecting,
            MeetingStatus::Reconnecting,
            MeetingStatus::InWaitingRoom,
            MeetingStatus::Unknown,
        ] {
            assert!(!status.is_terminal(), "{status:?}");
        }
    }
}
