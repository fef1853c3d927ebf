// Background invocations with a shared cancel token

use crate::process::CancelToken;
use std::future::Future;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

/// Handle to one orchestration call running on its own task
pub struct BackgroundInvocation<T> {
    cancel: CancelToken,
    handle: JoinHandle<T>,
}

impl<T> BackgroundInvocation<T> {
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Ask the running call to stop. Returns immediately.
    pub fn cancel(&self) {
        debug!("cancel requested for background invocation");
        self.cancel.request_cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Result<T, JoinError> {
        self.handle.await
    }
}

/// Run `call` on a tokio task, giving it a fresh cancel token.
///
/// ```ignore
/// let invocation = spawn_invocation(move |cancel| async move {
///     orchestrator.run("chdman", &request, &cancel, None).await
/// });
/// invocation.cancel();
/// let result = invocation.join().await?;
/// ```
pub fn spawn_invocation<F, Fut, T>(call: F) -> BackgroundInvocation<T>
where
    F: FnOnce(CancelToken) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancelToken::new();
    let handle = tokio::spawn(call(cancel.clone()));
    BackgroundInvocation { cancel, handle }
}
