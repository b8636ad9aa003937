use thiserror::Error;
use tokio::runtime::Handle;

/// Work item handed to the UI-owning execution context.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no UI context available")]
    Unavailable,
}

/// Execution context that owns the UI thread.
///
/// The SDK must be initialized from that context. Implementations return
/// [`DispatchError::Unavailable`] when there is no such context (e.g. no
/// foreground activity), and the task is not run.
pub trait UiDispatcher: Send + Sync {
    fn dispatch(&self, task: UiTask) -> Result<(), DispatchError>;
}

/// Runs tasks on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl UiDispatcher for InlineDispatcher {
    fn dispatch(&self, task: UiTask) -> Result<(), DispatchError> {
        task();
        Ok(())
    }
}

/// Runs tasks on a tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeDispatcher {
    handle: Handle,
}

impl RuntimeDispatcher {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl UiDispatcher for RuntimeDispatcher {
    fn dispatch(&self, task: UiTask) -> Result<(), DispatchError> {
        self.handle.spawn(async move { task() });
        Ok(())
    }
}
