/// Lifecycle of the SDK session as seen by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

impl SessionState {
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}
