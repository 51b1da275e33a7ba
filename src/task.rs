//! # Task Model
//!
//! Immutable task values submitted to the executor: [`Task`] pairs an identity
//! and a [`TaskGroup`] with an async action producing a typed result. Two
//! tasks belong to the same mutual-exclusion class iff their group ids compare
//! equal. The [`TaskType`] tag is advisory metadata; scheduling never consults
//! it.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::error::{ExecutorError, Result, TaskError};

/// Advisory classification of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Read,
    Write,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Read => write!(f, "read"),
            TaskType::Write => write!(f, "write"),
        }
    }
}

/// Identifier partitioning tasks into mutual-exclusion classes.
///
/// Tasks sharing a group never execute concurrently; tasks in distinct groups
/// impose no ordering on each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskGroup {
    id: Uuid,
}

impl TaskGroup {
    /// Create a group with a fresh random identifier.
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Wrap an existing group identifier. The nil UUID is rejected.
    pub fn from_id(id: Uuid) -> Result<Self> {
        if id.is_nil() {
            return Err(ExecutorError::invalid_task("group id must not be nil"));
        }
        Ok(Self { id })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Boxed async action producing the task's result or an explicit failure.
pub type TaskAction<T> =
    Box<dyn FnOnce() -> BoxFuture<'static, std::result::Result<T, TaskError>> + Send>;

/// A unit of work with an identity, a group, a type tag, and an action.
///
/// Tasks can only be built through the constructors below, which validate the
/// identifier, so any `Task` value reaching `submit` is well formed.
pub struct Task<T> {
    id: Uuid,
    group: TaskGroup,
    task_type: TaskType,
    action: TaskAction<T>,
}

impl<T> Task<T> {
    /// Create a task with a fresh random identifier.
    pub fn new<F, Fut>(group: TaskGroup, task_type: TaskType, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, TaskError>> + Send + 'static,
    {
        let action: TaskAction<T> = Box::new(move || {
            let fut: BoxFuture<'static, std::result::Result<T, TaskError>> = Box::pin(action());
            fut
        });
        Self {
            id: Uuid::new_v4(),
            group,
            task_type,
            action,
        }
    }

    /// Create a task with a caller-supplied identifier. The nil UUID is
    /// rejected with an invalid-argument error.
    pub fn with_id<F, Fut>(
        id: Uuid,
        group: TaskGroup,
        task_type: TaskType,
        action: F,
    ) -> Result<Self>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, TaskError>> + Send + 'static,
    {
        if id.is_nil() {
            return Err(ExecutorError::invalid_task("task id must not be nil"));
        }
        let action: TaskAction<T> = Box::new(move || {
            let fut: BoxFuture<'static, std::result::Result<T, TaskError>> = Box::pin(action());
            fut
        });
        Ok(Self {
            id,
            group,
            task_type,
            action,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn group(&self) -> TaskGroup {
        self.group
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub(crate) fn into_action(self) -> TaskAction<T> {
        self.action
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("task_type", &self.task_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_rejects_nil_id() {
        let err = TaskGroup::from_id(Uuid::nil()).unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidTask { .. }));
    }

    #[test]
    fn group_equality_follows_id() {
        let id = Uuid::new_v4();
        let a = TaskGroup::from_id(id).unwrap();
        let b = TaskGroup::from_id(id).unwrap();
        assert_eq!(a, b);
        assert_ne!(TaskGroup::new(), TaskGroup::new());
    }

    #[test]
    fn task_rejects_nil_id() {
        let result = Task::with_id(Uuid::nil(), TaskGroup::new(), TaskType::Read, || async {
            Ok(1)
        });
        assert!(result.is_err());
    }

    #[test]
    fn task_keeps_construction_fields() {
        let id = Uuid::new_v4();
        let group = TaskGroup::new();
        let task =
            Task::with_id(id, group, TaskType::Write, || async { Ok("done") }).unwrap();
        assert_eq!(task.id(), id);
        assert_eq!(task.group(), group);
        assert_eq!(task.task_type(), TaskType::Write);
    }

    #[tokio::test]
    async fn action_runs_once_converted() {
        let task = Task::new(TaskGroup::new(), TaskType::Read, || async { Ok(41 + 1) });
        let action = task.into_action();
        assert_eq!(action().await.unwrap(), 42);
    }
}
