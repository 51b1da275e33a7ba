//! # Structured Error Handling
//!
//! Two error surfaces exist in this crate and they never mix:
//!
//! - [`ExecutorError`] is returned synchronously from executor API calls
//!   (invalid arguments, invalid configuration, submission after shutdown).
//! - [`TaskError`] is the failure half of a task's outcome and is delivered
//!   only through that task's [`ResultHandle`](crate::handle::ResultHandle).
//!   It is an explicit value, not a panic or a thrown exception, so one task's
//!   failure can never crash a worker or affect a neighboring task.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced synchronously to callers of the executor API.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Invalid task: {reason}")]
    InvalidTask { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Submission was rejected because `shutdown()` has already been invoked.
    #[error("Executor is shutting down, task {task_id} rejected")]
    ShuttingDown { task_id: Uuid },

    /// The dispatcher is gone and the queue no longer accepts items.
    #[error("Task queue is closed, task {task_id} rejected")]
    QueueClosed { task_id: Uuid },
}

impl ExecutorError {
    /// Create an invalid-task error.
    pub fn invalid_task(reason: impl Into<String>) -> Self {
        Self::InvalidTask {
            reason: reason.into(),
        }
    }

    /// Create an invalid-configuration error.
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Failure outcome of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The task's action reported a failure.
    #[error("Task action failed: {message}")]
    Failed { message: String },

    /// The executing side went away before an outcome was produced. Seen only
    /// when the executor is torn down with work still queued.
    #[error("Task abandoned before a result was produced")]
    Abandoned,
}

impl TaskError {
    /// Create an action-failure error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executor_error_display() {
        let err = ExecutorError::invalid_configuration("worker_count must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: worker_count must be greater than 0"
        );
    }

    #[test]
    fn task_error_equality() {
        assert_eq!(TaskError::failed("boom"), TaskError::failed("boom"));
        assert_ne!(TaskError::failed("boom"), TaskError::Abandoned);
    }
}
