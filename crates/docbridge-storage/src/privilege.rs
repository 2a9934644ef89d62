//! Execution context elevation.
//!
//! Backend calls made by the key-value adapter run with the adapter's own
//! permissions rather than the restricted context of whoever invoked it.
//! The active [`ExecutionContext`] lives in a task-local, so it follows the
//! future it was attached to and is restored as soon as that future
//! completes. Spawned tasks start without one and see the default caller
//! context.

use std::future::Future;

tokio::task_local! {
    static CONTEXT: ExecutionContext;
}

/// Whose permissions the current task runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionContext {
    /// An external caller, optionally identified.
    Caller {
        /// Caller identity, if known.
        principal: Option<String>,
    },
    /// The adapter itself, with full access to its backends.
    Adapter,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::Caller { principal: None }
    }
}

/// Run `fut` with the adapter's own permissions.
pub async fn privileged<F: Future>(fut: F) -> F::Output {
    CONTEXT.scope(ExecutionContext::Adapter, fut).await
}

/// Run `fut` as an external caller.
pub async fn as_caller<F: Future>(principal: Option<String>, fut: F) -> F::Output {
    CONTEXT
        .scope(ExecutionContext::Caller { principal }, fut)
        .await
}

/// The context of the current task.
#[must_use]
pub fn current_context() -> ExecutionContext {
    CONTEXT.try_with(Clone::clone).unwrap_or_default()
}

/// Whether the current task runs with the adapter's permissions.
#[must_use]
pub fn is_privileged() -> bool {
    CONTEXT
        .try_with(|ctx| *ctx == ExecutionContext::Adapter)
        .unwrap_or(false)
}
