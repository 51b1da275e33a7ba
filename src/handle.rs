//! # Result Handle
//!
//! Single-assignment future/promise pair delivering a task's outcome. The
//! handle is created pending at submission time and resolves exactly once, to
//! either a success value or a [`TaskError`]. The write side is a
//! [`oneshot::Sender`] consumed by its single send, so a second completion is
//! impossible by construction rather than by runtime checking.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::error::TaskError;

/// Outcome delivered through a [`ResultHandle`].
pub type TaskOutcome<T> = std::result::Result<T, TaskError>;

/// Create a pending completion/handle pair for the given task.
pub(crate) fn pending<T>(task_id: Uuid) -> (Completion<T>, ResultHandle<T>) {
    let (sender, receiver) = oneshot::channel();
    (
        Completion { task_id, sender },
        ResultHandle { task_id, receiver },
    )
}

/// Write side of a handle, owned by the executing worker. Consumed by the
/// single permitted completion.
pub(crate) struct Completion<T> {
    task_id: Uuid,
    sender: oneshot::Sender<TaskOutcome<T>>,
}

impl<T> Completion<T> {
    /// Record the task's outcome. If the caller dropped the handle the value
    /// is discarded, which is not an error.
    pub(crate) fn complete(self, outcome: TaskOutcome<T>) {
        if self.sender.send(outcome).is_err() {
            debug!(task_id = %self.task_id, "Result discarded, handle was dropped");
        }
    }
}

/// Read side of a task's eventual outcome, owned by the submitting caller.
///
/// The handle can be `.await`ed directly, waited on with [`wait`], polled
/// without blocking with [`try_result`], or given a continuation with
/// [`on_complete`]. If the write side disappears before producing an outcome
/// the handle resolves to [`TaskError::Abandoned`], so it always resolves
/// exactly once.
///
/// [`wait`]: ResultHandle::wait
/// [`try_result`]: ResultHandle::try_result
/// [`on_complete`]: ResultHandle::on_complete
pub struct ResultHandle<T> {
    task_id: Uuid,
    receiver: oneshot::Receiver<TaskOutcome<T>>,
}

impl<T> ResultHandle<T> {
    /// Identifier of the task this handle belongs to.
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Wait for the outcome.
    pub async fn wait(self) -> TaskOutcome<T> {
        self.receiver.await.unwrap_or(Err(TaskError::Abandoned))
    }

    /// Non-blocking probe for the outcome. Returns `None` while the task is
    /// still pending or executing.
    pub fn try_result(&mut self) -> Option<TaskOutcome<T>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(TaskError::Abandoned)),
        }
    }

    /// Attach a continuation invoked once the outcome is available. If the
    /// outcome is already available the continuation fires without delay.
    pub fn on_complete<F>(self, callback: F)
    where
        T: Send + 'static,
        F: FnOnce(TaskOutcome<T>) + Send + 'static,
    {
        tokio::spawn(async move {
            callback(self.wait().await);
        });
    }
}

impl<T> Future for ResultHandle<T> {
    type Output = TaskOutcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TaskError::Abandoned)))
    }
}

impl<T> fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("task_id", &self.task_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn resolves_to_success() {
        let (completion, handle) = pending(Uuid::new_v4());
        completion.complete(Ok(42));
        assert_eq!(handle.wait().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn resolves_to_failure() {
        let (completion, handle) = pending::<u32>(Uuid::new_v4());
        completion.complete(Err(TaskError::failed("boom")));
        assert_eq!(handle.await.unwrap_err(), TaskError::failed("boom"));
    }

    #[tokio::test]
    async fn dropped_completion_resolves_to_abandoned() {
        let (completion, handle) = pending::<u32>(Uuid::new_v4());
        drop(completion);
        assert_eq!(handle.wait().await.unwrap_err(), TaskError::Abandoned);
    }

    #[tokio::test]
    async fn try_result_reports_pending_then_outcome() {
        let (completion, mut handle) = pending(Uuid::new_v4());
        assert!(handle.try_result().is_none());
        completion.complete(Ok("done"));
        assert_eq!(handle.try_result().unwrap().unwrap(), "done");
    }

    #[tokio::test]
    async fn continuation_fires_exactly_once() {
        let (completion, handle) = pending(Uuid::new_v4());
        let fired = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&fired);
        handle.on_complete(move |outcome| {
            assert_eq!(outcome.unwrap(), 7);
            observer.fetch_add(1, Ordering::SeqCst);
        });
        completion.complete(Ok(7));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn continuation_on_resolved_handle_fires_immediately() {
        let (completion, handle) = pending(Uuid::new_v4());
        completion.complete(Ok(1));
        let fired = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&fired);
        handle.on_complete(move |_| {
            observer.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
