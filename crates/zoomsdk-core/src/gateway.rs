//! The SDK gateway: turns host requests into native SDK calls and settles
//! the host's pending results when the SDK reports back.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::config::SdkConfig;
use crate::dispatch::UiDispatcher;
use crate::errors::BridgeError;
use crate::events::{BridgeEvent, BridgeEventListener, EventEmitter};
use crate::pending::{PendingResult, PendingSlot, RequestKind};
use crate::sdk::{
    InitParams, JoinMeetingParams, MEETING_ERROR_SUCCESS, MeetingService, MeetingStatus,
    SdkListener, StartMeetingParams, ZOOM_ERROR_SUCCESS, ZoomSdk,
};
use crate::state::SessionState;

const MSG_ALREADY_INITIALIZED: &str = "Already initialize Zoom SDK successfully.";
const MSG_INITIALIZED: &str = "Initialize Zoom SDK successfully.";
const MSG_ALREADY_JOINED: &str = "Already joined zoom meeting";
const MSG_CONNECTED: &str = "Connected to zoom meeting";
const MSG_NOT_INITIALIZED: &str = "ZoomSDK has not been initialized successfully";

/// Run a native SDK call, turning a panic into [`BridgeError::Unexpected`].
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, BridgeError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(BridgeError::from_panic)
}

/// Bridges host requests to the native SDK.
///
/// Holds one pending slot per request kind. Request methods never block:
/// they either settle the returned [`PendingResult`] right away or leave it
/// pending until the matching SDK callback arrives.
pub struct SdkGateway {
    shared: Arc<Shared>,
}

struct Shared {
    sdk: Arc<dyn ZoomSdk>,
    dispatcher: Arc<dyn UiDispatcher>,
    config: Mutex<SdkConfig>,
    state: Mutex<SessionState>,
    init_slot: PendingSlot,
    meeting_slot: PendingSlot,
    emitter: EventEmitter,
    me: Weak<Shared>,
    /// Handed to the SDK; holds only a weak reference back to us.
    listener: Arc<dyn SdkListener>,
    listener_registered: AtomicBool,
}

/// Forwards SDK callbacks to the gateway without keeping it alive.
struct CallbackListener {
    shared: Weak<Shared>,
}

impl SdkListener for CallbackListener {
    fn on_initialize_result(&self, error_code: i32, internal_error_code: i32) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_initialize_result(error_code, internal_error_code);
        }
    }

    fn on_meeting_status_changed(
        &self,
        status: MeetingStatus,
        error_code: i32,
        internal_error_code: i32,
    ) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_meeting_status_changed(status, error_code, internal_error_code);
        }
    }

    fn on_auth_identity_expired(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_auth_identity_expired();
        }
    }
}

impl SdkGateway {
    pub fn new(
        sdk: Arc<dyn ZoomSdk>,
        dispatcher: Arc<dyn UiDispatcher>,
        config: SdkConfig,
    ) -> Self {
        let shared = Arc::new_cyclic(|me: &Weak<Shared>| Shared {
            sdk,
            dispatcher,
            config: Mutex::new(config),
            state: Mutex::new(SessionState::Uninitialized),
            init_slot: PendingSlot::new(RequestKind::Initialize),
            meeting_slot: PendingSlot::new(RequestKind::Meeting),
            emitter: EventEmitter::new(),
            me: me.clone(),
            listener: Arc::new(CallbackListener { shared: me.clone() }),
            listener_registered: AtomicBool::new(false),
        });
        Self { shared }
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn has_pending(&self, kind: RequestKind) -> bool {
        match kind {
            RequestKind::Initialize => self.shared.init_slot.is_pending(),
            RequestKind::Meeting => self.shared.meeting_slot.is_pending(),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn BridgeEventListener>) {
        self.shared.emitter.add_listener(listener);
    }

    /// Replace the settings used by the next native initialization.
    pub fn set_config(&self, config: SdkConfig) {
        *self.shared.config.lock().unwrap() = config;
    }

    /// Initialize the SDK on the UI context.
    ///
    /// Settles immediately when the SDK is already initialized; otherwise the
    /// result is settled by [`SdkGateway::on_initialize_result`].
    pub fn initialize(&self, sdk_key: &str, sdk_secret: &str, domain: &str) -> PendingResult {
        tracing::info!(domain, "initialize requested");
        guarded(|| self.shared.initialize(sdk_key, sdk_secret, domain))
            .unwrap_or_else(PendingResult::rejected)
    }

    /// Start a meeting as host, without an SDK login.
    pub fn start_meeting(&self, params: StartMeetingParams) -> PendingResult {
        tracing::info!(
            display_name = %params.display_name,
            meeting_no = %params.meeting_no,
            user_id = %params.user_id,
            user_type = params.user_type,
            "startMeeting requested"
        );
        guarded(|| self.shared.start_meeting(params)).unwrap_or_else(PendingResult::rejected)
    }

    pub fn join_meeting(&self, display_name: &str, meeting_no: &str) -> PendingResult {
        tracing::info!(display_name, meeting_no, "joinMeeting requested");
        let params = JoinMeetingParams {
            display_name: display_name.to_string(),
            meeting_no: meeting_no.to_string(),
            password: None,
        };
        guarded(|| self.shared.join_meeting(params)).unwrap_or_else(PendingResult::rejected)
    }

    pub fn join_meeting_with_password(
        &self,
        display_name: &str,
        meeting_no: &str,
        password: &str,
    ) -> PendingResult {
        tracing::info!(display_name, meeting_no, "joinMeetingWithPassword requested");
        let params = JoinMeetingParams {
            display_name: display_name.to_string(),
            meeting_no: meeting_no.to_string(),
            password: Some(password.to_string()),
        };
        guarded(|| self.shared.join_meeting(params)).unwrap_or_else(PendingResult::rejected)
    }

    pub fn on_initialize_result(&self, error_code: i32, internal_error_code: i32) {
        self.shared.on_initialize_result(error_code, internal_error_code);
    }

    pub fn on_meeting_status_changed(
        &self,
        status: MeetingStatus,
        error_code: i32,
        internal_error_code: i32,
    ) {
        self.shared
            .on_meeting_status_changed(status, error_code, internal_error_code);
    }

    pub fn on_auth_identity_expired(&self) {
        self.shared.on_auth_identity_expired();
    }

    /// Detach from the SDK when the host goes away.
    ///
    /// Removes the meeting listener and rejects anything still pending.
    /// A later `initialize` re-attaches to the still-initialized SDK.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl Shared {
    fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, state: SessionState) {
        let mut guard = self.state.lock().unwrap();
        if *guard != state {
            tracing::debug!(from = ?*guard, to = ?state, "session state changed");
            *guard = state;
        }
    }

    fn initialize(&self, sdk_key: &str, sdk_secret: &str, domain: &str) -> PendingResult {
        if self.state().is_ready() {
            return PendingResult::resolved(MSG_ALREADY_INITIALIZED);
        }

        if self.sdk.is_initialized() {
            tracing::info!("SDK already initialized natively, attaching");
            self.mark_ready();
            self.emitter.emit(BridgeEvent::Initialized);
            return PendingResult::resolved(MSG_ALREADY_INITIALIZED);
        }

        let config = self.config.lock().unwrap().clone();
        let params = InitParams {
            app_key: sdk_key.to_string(),
            app_secret: sdk_secret.to_string(),
            domain: config.resolve_domain(domain),
            enable_log: config.enable_log,
            log_size: config.log_size,
        };

        let (id, result) = self.init_slot.arm();
        self.set_state(SessionState::Initializing);

        let sdk = self.sdk.clone();
        let listener = self.listener.clone();
        let me = self.me.clone();
        let task = Box::new(move || {
            if let Err(e) = guarded(|| sdk.initialize(params, listener)) {
                tracing::error!(request = %id, "native initialize failed: {e}");
                if let Some(shared) = me.upgrade() {
                    if shared.init_slot.reject_if(id, e) {
                        shared.set_state(SessionState::Uninitialized);
                    }
                }
            }
        });

        if let Err(e) = self.dispatcher.dispatch(task) {
            tracing::warn!(request = %id, "cannot dispatch initialize: {e}");
            if self.init_slot.reject_if(id, BridgeError::Unexpected(e.to_string())) {
                self.set_state(SessionState::Uninitialized);
            }
        }

        result
    }

    fn mark_ready(&self) {
        self.set_state(SessionState::Ready);
        self.register_listener();
    }

    fn register_listener(&self) {
        // Claim registration up front; the SDK thread and the host thread can race here.
        if self
            .listener_registered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let registered = match guarded(|| self.sdk.meeting_service()) {
            Ok(Some(service)) => {
                tracing::info!("registering meeting listener");
                let listener = self.listener.clone();
                match guarded(|| service.add_listener(listener)) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!("add_listener failed: {e}");
                        false
                    }
                }
            }
            Ok(None) => {
                tracing::warn!("meeting service unavailable, listener not registered");
                false
            }
            Err(e) => {
                tracing::error!("meeting_service failed: {e}");
                false
            }
        };
        if !registered {
            self.listener_registered.store(false, Ordering::SeqCst);
        }
    }

    fn unregister_listener(&self) {
        if !self.listener_registered.swap(false, Ordering::SeqCst) {
            return;
        }
        tracing::info!("unregistering meeting listener");
        let removed = guarded(|| {
            if self.sdk.is_initialized() {
                if let Some(service) = self.sdk.meeting_service() {
                    service.remove_listener(&self.listener);
                }
            }
        });
        if let Err(e) = removed {
            tracing::error!("remove_listener failed: {e}");
        }
    }

    /// Meeting service, provided the session is ready.
    fn ready_service(
        &self,
        not_ready: fn(String) -> BridgeError,
    ) -> Result<Arc<dyn MeetingService>, BridgeError> {
        if !self.state().is_ready() || !self.sdk.is_initialized() {
            return Err(not_ready(MSG_NOT_INITIALIZED.to_string()));
        }
        self.sdk
            .meeting_service()
            .ok_or_else(|| BridgeError::Unexpected("meeting service unavailable".to_string()))
    }

    fn start_meeting(&self, params: StartMeetingParams) -> PendingResult {
        let service = match self.ready_service(BridgeError::Start) {
            Ok(service) => service,
            Err(e) => return self.rejected(e),
        };

        let Ok(meeting_no) = params.meeting_no.parse::<i64>() else {
            return self.rejected(BridgeError::Start(format!(
                "Invalid meeting number: {}",
                params.meeting_no
            )));
        };

        if service.meeting_status() != MeetingStatus::Idle
            && service.current_meeting_number() == meeting_no
        {
            tracing::info!(meeting_no, "meeting already active, returning to it");
            service.return_to_meeting();
            return PendingResult::resolved(MSG_ALREADY_JOINED);
        }

        self.issue_meeting_call(
            "startMeeting",
            || service.start_meeting(&params),
            BridgeError::Start,
        )
    }

    fn join_meeting(&self, params: JoinMeetingParams) -> PendingResult {
        let service = match self.ready_service(BridgeError::Join) {
            Ok(service) => service,
            Err(e) => return self.rejected(e),
        };

        self.issue_meeting_call(
            "joinMeeting",
            || service.join_meeting(&params),
            BridgeError::Join,
        )
    }

    /// Arm the meeting slot and issue the native call.
    ///
    /// A non-success return code rejects right away; success leaves the
    /// request pending for the status callback.
    fn issue_meeting_call(
        &self,
        op: &str,
        call: impl FnOnce() -> i32,
        on_error: fn(String) -> BridgeError,
    ) -> PendingResult {
        let (id, result) = self.meeting_slot.arm();
        match guarded(call) {
            Ok(MEETING_ERROR_SUCCESS) => {
                tracing::info!(request = %id, "{op} accepted, awaiting meeting status");
            }
            Ok(code) => {
                tracing::warn!(request = %id, "{op} rejected by SDK, errorCode={code}");
                self.meeting_slot
                    .reject_if(id, on_error(format!("{op}, errorCode={code}")));
            }
            Err(e) => {
                tracing::error!(request = %id, "{op} failed: {e}");
                self.meeting_slot.reject_if(id, e);
            }
        }
        result
    }

    fn rejected(&self, err: BridgeError) -> PendingResult {
        tracing::warn!(code = err.code(), "request rejected: {err}");
        PendingResult::rejected(err)
    }

    fn on_initialize_result(&self, error_code: i32, internal_error_code: i32) {
        tracing::info!(error_code, internal_error_code, "onZoomSDKInitializeResult");
        if error_code != ZOOM_ERROR_SUCCESS {
            self.set_state(SessionState::Uninitialized);
            let rejected = self.init_slot.reject(BridgeError::Initialization {
                error_code,
                internal_error_code,
            });
            if !rejected {
                tracing::debug!("initialize failure with no pending request");
            }
        } else {
            self.mark_ready();
            if !self.init_slot.resolve(MSG_INITIALIZED) {
                tracing::debug!("initialize success with no pending request");
            }
            self.emitter.emit(BridgeEvent::Initialized);
        }
    }

    fn on_meeting_status_changed(
        &self,
        status: MeetingStatus,
        error_code: i32,
        internal_error_code: i32,
    ) {
        tracing::info!(?status, error_code, internal_error_code, "onMeetingStatusChanged");

        // Settle before notifying listeners, so host code cannot hold up the request.
        if self.meeting_slot.is_pending() {
            match status {
                MeetingStatus::Failed => {
                    self.meeting_slot.reject(BridgeError::Meeting {
                        error_code,
                        internal_error_code,
                    });
                }
                MeetingStatus::InMeeting => {
                    self.meeting_slot.resolve(MSG_CONNECTED);
                }
                _ => tracing::debug!(?status, "transient status, request stays pending"),
            }
        }

        self.emitter.emit(BridgeEvent::MeetingStatusChanged {
            status,
            error_code,
            internal_error_code,
        });
    }

    fn on_auth_identity_expired(&self) {
        tracing::info!("onZoomAuthIdentityExpired");
        self.emitter.emit(BridgeEvent::AuthIdentityExpired);
    }

    fn shutdown(&self) {
        tracing::info!("gateway shutting down");
        self.unregister_listener();
        let reason = || BridgeError::Unexpected("bridge shut down".to_string());
        self.init_slot.reject(reason());
        self.meeting_slot.reject(reason());
        self.set_state(SessionState::Uninitialized);
    }
}
