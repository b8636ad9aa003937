//! UniFFI bindings for zoomsdk-core.
//!
//! Provides a ZoomModule object that wraps the SDK gateway behind a
//! promise-style, FFI-safe interface. The host implements `NativeZoomSdk`
//! over the real SDK and forwards the SDK's listener callbacks back into
//! the module.

use std::sync::{Arc, Mutex as StdMutex};

use zoomsdk_core::{
    BridgeEvent as CoreBridgeEvent, ConfigStore, DispatchError, InitParams,
    JoinMeetingParams, MeetingService, MeetingStatus as CoreMeetingStatus, PendingResult,
    SdkConfig as CoreSdkConfig, SdkGateway, SdkListener, SessionState as CoreSessionState,
    StartMeetingParams, UiDispatcher, ZoomSdk,
};

uniffi::include_scaffolding!("zoomsdk");

const MODULE_NAME: &str = "zoomsdk";

// ── Android logcat helper ────────────────────────────────────────────

/// Write a message to logcat on Android, or stderr on other platforms.
fn zoomsdk_log(msg: &str) {
    #[cfg(target_os = "android")]
    {
        use std::ffi::CString;
        unsafe extern "C" {
            fn __android_log_write(prio: i32, tag: *const std::ffi::c_char, text: *const std::ffi::c_char) -> i32;
        }
        let Ok(tag) = CString::new(MODULE_NAME) else {
            return;
        };
        let Ok(text) = CString::new(msg.replace('\0', " ")) else {
            return;
        };
        unsafe { __android_log_write(4 /* INFO */, tag.as_ptr(), text.as_ptr()); }
    }
    #[cfg(not(target_os = "android"))]
    eprintln!("{msg}");
}

// ── Namespace functions ──────────────────────────────────────────────

/// Initialize tracing/logging. Call once from the host before using ZoomModule.
fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("zoomsdk_core=debug,zoomsdk_ffi=debug"));
        // Another subscriber may already be installed by the host.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .try_init();
    });
}

// ── FFI-safe type conversions ──────────────────────────────────────────

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

impl From<MeetingStatus> for CoreMeetingStatus {
    fn from(s: MeetingStatus) -> Self {
        match s {
            MeetingStatus::Idle => Self::Idle,
            MeetingStatus::Connecting => Self::Connecting,
            MeetingStatus::WaitingForHost => Self::WaitingForHost,
            MeetingStatus::InMeeting => Self::InMeeting,
            MeetingStatus::Disconnecting => Self::Disconnecting,
            MeetingStatus::Reconnecting => Self::Reconnecting,
            MeetingStatus::Failed => Self::Failed,
            MeetingStatus::InWaitingRoom => Self::InWaitingRoom,
            MeetingStatus::WebinarPromote => Self::WebinarPromote,
            MeetingStatus::WebinarDepromote => Self::WebinarDepromote,
            MeetingStatus::Unknown => Self::Unknown,
        }
    }
}

impl From<CoreMeetingStatus> for MeetingStatus {
    fn from(s: CoreMeetingStatus) -> Self {
        match s {
            CoreMeetingStatus::Idle => Self::Idle,
            CoreMeetingStatus::Connecting => Self::Connecting,
            CoreMeetingStatus::WaitingForHost => Self::WaitingForHost,
            CoreMeetingStatus::InMeeting => Self::InMeeting,
            CoreMeetingStatus::Disconnecting => Self::Disconnecting,
            CoreMeetingStatus::Reconnecting => Self::Reconnecting,
            CoreMeetingStatus::Failed => Self::Failed,
            CoreMeetingStatus::InWaitingRoom => Self::InWaitingRoom,
            CoreMeetingStatus::WebinarPromote => Self::WebinarPromote,
            CoreMeetingStatus::WebinarDepromote => Self::WebinarDepromote,
            CoreMeetingStatus::Unknown => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
}

impl From<CoreSessionState> for SessionState {
    fn from(s: CoreSessionState) -> Self {
        match s {
            CoreSessionState::Uninitialized => Self::Uninitialized,
            CoreSessionState::Initializing => Self::Initializing,
            CoreSessionState::Ready => Self::Ready,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SdkConfig {
    pub enable_log: bool,
    pub log_size: u32,
    pub default_domain: String,
}

impl From<CoreSdkConfig> for SdkConfig {
    fn from(c: CoreSdkConfig) -> Self {
        Self {
            enable_log: c.enable_log,
            log_size: c.log_size,
            default_domain: c.default_domain,
        }
    }
}

#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Initialized,
    MeetingStatusChanged { status: MeetingStatus, error_code: i32, internal_error_code: i32 },
    AuthIdentityExpired,
}

impl From<CoreBridgeEvent> for BridgeEvent {
    fn from(e: CoreBridgeEvent) -> Self {
        match e {
            CoreBridgeEvent::Initialized => Self::Initialized,
            CoreBridgeEvent::MeetingStatusChanged { status, error_code, internal_error_code } => {
                Self::MeetingStatusChanged { status: status.into(), error_code, internal_error_code }
            }
            CoreBridgeEvent::AuthIdentityExpired => Self::AuthIdentityExpired,
        }
    }
}

// ── Callback interfaces ───────────────────────────────────────────────

/// Host-side promise, settled once per request.
pub trait Promise: Send + Sync {
    fn resolve(&self, message: String);
    fn reject(&self, code: String, message: String);
}

pub trait BridgeEventListener: Send + Sync {
    fn on_event(&self, event: BridgeEvent);
}

/// The host's UI thread. `post` returns false when no UI context
/// (foreground activity) is available; the task is then not run.
pub trait UiExecutor: Send + Sync {
    fn post(&self, task: Arc<UiTask>) -> bool;
}

/// The native SDK as implemented by the host.
///
/// The host forwards the SDK's initialize and meeting-status callbacks to
/// [`ZoomModule::on_initialize_result`] and
/// [`ZoomModule::on_meeting_status_changed`]; `add_meeting_listener` asks it
/// to start doing so for meeting events.
pub trait NativeZoomSdk: Send + Sync {
    fn is_initialized(&self) -> bool;
    fn initialize(&self, app_key: String, app_secret: String, domain: String, enable_log: bool, log_size: u32);
    fn has_meeting_service(&self) -> bool;
    fn meeting_status(&self) -> MeetingStatus;
    fn current_meeting_number(&self) -> i64;
    fn start_meeting(
        &self,
        display_name: String,
        meeting_no: String,
        user_id: String,
        user_type: i32,
        zoom_access_token: String,
        zoom_token: String,
    ) -> i32;
    fn join_meeting(&self, display_name: String, meeting_no: String, password: Option<String>) -> i32;
    fn return_to_meeting(&self);
    fn add_meeting_listener(&self);
    fn remove_meeting_listener(&self);
}

// ── UI task: one-shot closure handed to the host's UI thread ──────────

pub struct UiTask {
    task: StdMutex<Option<zoomsdk_core::UiTask>>,
}

impl UiTask {
    fn new(task: zoomsdk_core::UiTask) -> Self {
        Self { task: StdMutex::new(Some(task)) }
    }

    /// Run the task. Only the first call has an effect.
    pub fn run(&self) {
        let task = self.task.lock().unwrap().take();
        if let Some(task) = task {
            task();
        }
    }
}

// ── Bridges: host callback interfaces → core traits ───────────────────

struct HostDispatcher {
    executor: Box<dyn UiExecutor>,
}

impl UiDispatcher for HostDispatcher {
    fn dispatch(&self, task: zoomsdk_core::UiTask) -> Result<(), DispatchError> {
        if self.executor.post(Arc::new(UiTask::new(task))) {
            Ok(())
        } else {
            zoomsdk_log("ZOOMSDK FFI: no foreground activity, UI task rejected");
            Err(DispatchError::Unavailable)
        }
    }
}

struct HostSdk {
    host: Arc<dyn NativeZoomSdk>,
}

impl ZoomSdk for HostSdk {
    fn is_initialized(&self) -> bool {
        self.host.is_initialized()
    }

    // Results come back through ZoomModule::on_initialize_result.
    fn initialize(&self, params: InitParams, _listener: Arc<dyn SdkListener>) {
        self.host.initialize(
            params.app_key,
            params.app_secret,
            params.domain,
            params.enable_log,
            params.log_size,
        );
    }

    fn meeting_service(&self) -> Option<Arc<dyn MeetingService>> {
        if self.host.has_meeting_service() {
            Some(Arc::new(HostMeetingService { host: self.host.clone() }) as Arc<dyn MeetingService>)
        } else {
            None
        }
    }
}

struct HostMeetingService {
    host: Arc<dyn NativeZoomSdk>,
}

impl MeetingService for HostMeetingService {
    fn meeting_status(&self) -> CoreMeetingStatus {
        self.host.meeting_status().into()
    }

    fn current_meeting_number(&self) -> i64 {
        self.host.current_meeting_number()
    }

    fn start_meeting(&self, params: &StartMeetingParams) -> i32 {
        let params = params.clone();
        self.host.start_meeting(
            params.display_name,
            params.meeting_no,
            params.user_id,
            params.user_type,
            params.zoom_access_token,
            params.zoom_token,
        )
    }

    fn join_meeting(&self, params: &JoinMeetingParams) -> i32 {
        let params = params.clone();
        self.host.join_meeting(params.display_name, params.meeting_no, params.password)
    }

    fn return_to_meeting(&self) {
        self.host.return_to_meeting();
    }

    // Meeting events come back through ZoomModule::on_meeting_status_changed.
    fn add_listener(&self, _listener: Arc<dyn SdkListener>) {
        self.host.add_meeting_listener();
    }

    fn remove_listener(&self, _listener: &Arc<dyn SdkListener>) {
        self.host.remove_meeting_listener();
    }
}

struct BridgeListener {
    ffi_listener: Arc<dyn BridgeEventListener>,
}

impl zoomsdk_core::BridgeEventListener for BridgeListener {
    fn on_event(&self, event: CoreBridgeEvent) {
        self.ffi_listener.on_event(event.into());
    }
}

// ── ZoomModule: main FFI object ───────────────────────────────────────

pub struct ZoomModule {
    gateway: SdkGateway,
    config: ConfigStore,
    rt: tokio::runtime::Runtime,
}

impl ZoomModule {
    pub fn new(data_dir: String, sdk: Box<dyn NativeZoomSdk>, executor: Box<dyn UiExecutor>) -> Self {
        zoomsdk_log("ZOOMSDK FFI: ZoomModule::new() called");
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("zoomsdk-ffi")
            .enable_all()
            .build()
            .expect("failed to create tokio runtime");
        let config = ConfigStore::new(&data_dir);
        let gateway = SdkGateway::new(
            Arc::new(HostSdk { host: Arc::from(sdk) }),
            Arc::new(HostDispatcher { executor }),
            config.get(),
        );
        zoomsdk_log("ZOOMSDK FFI: ZoomModule::new() completed");
        Self { gateway, config, rt }
    }

    pub fn name(&self) -> String {
        MODULE_NAME.to_string()
    }

    pub fn state(&self) -> SessionState {
        self.gateway.state().into()
    }

    pub fn initialize(&self, sdk_key: String, sdk_secret: String, domain: String, promise: Box<dyn Promise>) {
        let pending = self.gateway.initialize(&sdk_key, &sdk_secret, &domain);
        self.settle(pending, promise);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn start_meeting(
        &self,
        display_name: String,
        meeting_no: String,
        user_id: String,
        user_type: i32,
        zoom_access_token: String,
        zoom_token: String,
        promise: Box<dyn Promise>,
    ) {
        let pending = self.gateway.start_meeting(StartMeetingParams {
            display_name,
            meeting_no,
            user_id,
            user_type,
            zoom_access_token,
            zoom_token,
        });
        self.settle(pending, promise);
    }

    pub fn join_meeting(&self, display_name: String, meeting_no: String, promise: Box<dyn Promise>) {
        let pending = self.gateway.join_meeting(&display_name, &meeting_no);
        self.settle(pending, promise);
    }

    pub fn join_meeting_with_password(
        &self,
        display_name: String,
        meeting_no: String,
        password: String,
        promise: Box<dyn Promise>,
    ) {
        let pending = self
            .gateway
            .join_meeting_with_password(&display_name, &meeting_no, &password);
        self.settle(pending, promise);
    }

    pub fn on_initialize_result(&self, error_code: i32, internal_error_code: i32) {
        self.gateway.on_initialize_result(error_code, internal_error_code);
    }

    pub fn on_meeting_status_changed(&self, status: MeetingStatus, error_code: i32, internal_error_code: i32) {
        self.gateway
            .on_meeting_status_changed(status.into(), error_code, internal_error_code);
    }

    pub fn on_auth_identity_expired(&self) {
        self.gateway.on_auth_identity_expired();
    }

    pub fn on_host_destroy(&self) {
        zoomsdk_log("ZOOMSDK FFI: host destroyed, detaching from SDK");
        self.gateway.shutdown();
    }

    pub fn add_listener(&self, listener: Box<dyn BridgeEventListener>) {
        let bridge = Arc::new(BridgeListener {
            ffi_listener: Arc::from(listener),
        });
        self.gateway.add_listener(bridge);
    }

    pub fn get_config(&self) -> SdkConfig {
        self.config.get().into()
    }

    pub fn set_enable_log(&self, enabled: bool) {
        self.config.set_enable_log(enabled);
        self.gateway.set_config(self.config.get());
    }

    pub fn set_log_size(&self, size: u32) {
        self.config.set_log_size(size);
        self.gateway.set_config(self.config.get());
    }

    pub fn set_default_domain(&self, domain: String) {
        self.config.set_default_domain(domain);
        self.gateway.set_config(self.config.get());
    }

    /// Settle the host promise once the pending result completes.
    fn settle(&self, pending: PendingResult, promise: Box<dyn Promise>) {
        self.rt.spawn(async move {
            match pending.await {
                Ok(message) => promise.resolve(message),
                Err(e) => {
                    tracing::warn!(code = e.code(), "rejecting host promise: {e}");
                    promise.reject(e.code().to_string(), e.to_string());
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeHost {
        initialized: AtomicBool,
        calls: StdMutex<Vec<String>>,
    }

    impl FakeHost {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    /// Shares one FakeHost between the module and the test body.
    struct SharedHost(Arc<FakeHost>);

    impl NativeZoomSdk for SharedHost {
        fn is_initialized(&self) -> bool {
            self.0.initialized.load(Ordering::SeqCst)
        }
        fn initialize(&self, _key: String, _secret: String, domain: String, _enable_log: bool, log_size: u32) {
            self.0.record(&format!("initialize {domain} {log_size}"));
        }
        fn has_meeting_service(&self) -> bool {
            true
        }
        fn meeting_status(&self) -> MeetingStatus {
            MeetingStatus::Idle
        }
        fn current_meeting_number(&self) -> i64 {
            0
        }
        fn start_meeting(&self, _: String, meeting_no: String, _: String, _: i32, _: String, _: String) -> i32 {
            self.0.record(&format!("start {meeting_no}"));
            0
        }
        fn join_meeting(&self, _name: String, meeting_no: String, password: Option<String>) -> i32 {
            self.0.record(&format!("join {meeting_no} {}", password.unwrap_or_default()));
            0
        }
        fn return_to_meeting(&self) {
            self.0.record("return");
        }
        fn add_meeting_listener(&self) {
            self.0.record("add_listener");
        }
        fn remove_meeting_listener(&self) {
            self.0.record("remove_listener");
        }
    }

    struct ImmediateExecutor {
        available: bool,
    }

    impl UiExecutor for ImmediateExecutor {
        fn post(&self, task: Arc<UiTask>) -> bool {
            if self.available {
                task.run();
            }
            self.available
        }
    }

    struct ChannelPromise(StdMutex<mpsc::Sender<Result<String, (String, String)>>>);

    impl Promise for ChannelPromise {
        fn resolve(&self, message: String) {
            let _ = self.0.lock().unwrap().send(Ok(message));
        }
        fn reject(&self, code: String, message: String) {
            let _ = self.0.lock().unwrap().send(Err((code, message)));
        }
    }

    fn promise() -> (Box<dyn Promise>, mpsc::Receiver<Result<String, (String, String)>>) {
        let (tx, rx) = mpsc::channel();
        (Box::new(ChannelPromise(StdMutex::new(tx))), rx)
    }

    fn module(available: bool) -> (ZoomModule, Arc<FakeHost>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeHost::default());
        let module = ZoomModule::new(
            dir.path().to_str().unwrap().to_string(),
            Box::new(SharedHost(host.clone())),
            Box::new(ImmediateExecutor { available }),
        );
        (module, host, dir)
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn module_name_matches_host_registration() {
        let (module, _host, _dir) = module(true);
        assert_eq!(module.name(), "zoomsdk");
    }

    #[test]
    fn initialize_settles_promise_from_host_callback() {
        let (module, host, _dir) = module(true);
        let (p, rx) = promise();

        module.initialize("key".into(), "secret".into(), "".into(), p);
        assert_eq!(module.state(), SessionState::Initializing);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        host.initialized.store(true, Ordering::SeqCst);
        module.on_initialize_result(0, 0);

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Ok("Initialize Zoom SDK successfully.".to_string()));
        assert_eq!(module.state(), SessionState::Ready);
        assert_eq!(
            *host.calls.lock().unwrap(),
            vec!["initialize zoom.us 500".to_string(), "add_listener".to_string()]
        );
    }

    #[test]
    fn initialize_without_activity_rejects() {
        let (module, host, _dir) = module(false);
        let (p, rx) = promise();

        module.initialize("key".into(), "secret".into(), "zoom.us".into(), p);

        let (code, message) = rx.recv_timeout(WAIT).unwrap().unwrap_err();
        assert_eq!(code, "ERR_UNEXPECTED_EXCEPTION");
        assert_eq!(message, "no UI context available");
        assert!(host.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn join_with_password_resolves_when_in_meeting() {
        let (module, host, _dir) = module(true);
        let (p, rx) = promise();
        module.initialize("key".into(), "secret".into(), "zoom.us".into(), p);
        host.initialized.store(true, Ordering::SeqCst);
        module.on_initialize_result(0, 0);
        rx.recv_timeout(WAIT).unwrap().unwrap();

        let (p, rx) = promise();
        module.join_meeting_with_password("Bob".into(), "42".into(), "pw".into(), p);
        module.on_meeting_status_changed(MeetingStatus::Connecting, 0, 0);
        module.on_meeting_status_changed(MeetingStatus::InMeeting, 0, 0);

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Ok("Connected to zoom meeting".to_string()));
        assert!(host.calls.lock().unwrap().contains(&"join 42 pw".to_string()));
    }

    #[test]
    fn start_before_initialize_rejects_with_start_code() {
        let (module, host, _dir) = module(true);
        let (p, rx) = promise();

        module.start_meeting("Alice".into(), "123".into(), "u".into(), 1, "zak".into(), "tok".into(), p);

        let (code, _) = rx.recv_timeout(WAIT).unwrap().unwrap_err();
        assert_eq!(code, "ERR_ZOOM_START");
        assert!(host.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn config_setters_apply_to_next_initialize() {
        let (module, host, _dir) = module(true);
        module.set_default_domain("zoomgov.com".into());
        module.set_log_size(64);
        assert_eq!(module.get_config().default_domain, "zoomgov.com");

        let (p, _rx) = promise();
        module.initialize("key".into(), "secret".into(), "".into(), p);

        assert_eq!(host.calls.lock().unwrap()[0], "initialize zoomgov.com 64");
    }

    #[test]
    fn host_destroy_detaches_listener() {
        let (module, host, _dir) = module(true);
        let (p, rx) = promise();
        module.initialize("key".into(), "secret".into(), "zoom.us".into(), p);
        host.initialized.store(true, Ordering::SeqCst);
        module.on_initialize_result(0, 0);
        rx.recv_timeout(WAIT).unwrap().unwrap();

        module.on_host_destroy();

        assert_eq!(host.calls.lock().unwrap().last().unwrap(), "remove_listener");
        assert_eq!(module.state(), SessionState::Uninitialized);
    }
}
