//! # Task Executor
//!
//! Public facade over the dispatch pipeline. Owns the task queue, the
//! dispatcher loop, the worker pool, and the group lock registry, and exposes
//! submit / shutdown plus lifecycle and statistics accessors.
//!
//! ## Guarantees
//!
//! - Submission order across all callers equals dispatch order (single FIFO
//!   queue, one consumer).
//! - Tasks sharing a group never execute concurrently, and run in submission
//!   order; tasks in distinct groups impose no mutual ordering beyond
//!   pool-size-bounded parallelism.
//! - Every returned handle resolves exactly once.
//! - One task's failure never affects another task's scheduling or outcome.

mod dispatcher;
mod worker;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ExecutorConfig;
use crate::error::{ExecutorError, Result};
use crate::group_lock::GroupLockRegistry;
use crate::handle::{self, ResultHandle};
use crate::task::Task;

use dispatcher::{Dispatcher, InternalTask};
use worker::WorkerPool;

/// Lifecycle of the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// Accepting submissions and dispatching.
    Running,
    /// Shutdown requested; consuming what is already queued.
    Draining,
    /// Dispatch loop exited; nothing further is consumed.
    Stopped,
}

const STATE_RUNNING: u8 = 0;
const STATE_DRAINING: u8 = 1;
const STATE_STOPPED: u8 = 2;

/// Atomic holder for the dispatcher state machine. Transitions are one-way:
/// `Running -> Draining -> Stopped`.
#[derive(Debug)]
pub(crate) struct LifecycleState(AtomicU8);

impl LifecycleState {
    fn new() -> Self {
        Self(AtomicU8::new(STATE_RUNNING))
    }

    pub(crate) fn load(&self) -> ExecutorState {
        match self.0.load(Ordering::Acquire) {
            STATE_RUNNING => ExecutorState::Running,
            STATE_DRAINING => ExecutorState::Draining,
            _ => ExecutorState::Stopped,
        }
    }

    /// `Running -> Draining`. Returns false if already past `Running`.
    fn begin_draining(&self) -> bool {
        self.0
            .compare_exchange(
                STATE_RUNNING,
                STATE_DRAINING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn mark_stopped(&self) {
        self.0.store(STATE_STOPPED, Ordering::Release);
    }
}

/// Point-in-time view of the executor, in the shape the rest of the codebase
/// exposes for pool-like components.
#[derive(Debug, Clone)]
pub struct ExecutorStats {
    pub worker_count: usize,
    pub available_workers: usize,
    /// Groups currently holding a lock registry entry (queued or running).
    pub tracked_groups: usize,
    pub state: ExecutorState,
}

/// In-process task execution service with per-group serialization.
///
/// Construction spawns the dispatcher onto the current tokio runtime, so an
/// executor must be created from within a runtime context.
#[derive(Debug)]
pub struct TaskExecutor {
    executor_id: Uuid,
    config: ExecutorConfig,
    queue: mpsc::UnboundedSender<InternalTask>,
    pool: WorkerPool,
    group_locks: GroupLockRegistry,
    lifecycle: Arc<LifecycleState>,
    shutdown: Arc<Notify>,
    dispatcher_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskExecutor {
    /// Create an executor with the given worker pool size.
    pub fn new(worker_count: usize) -> Result<Self> {
        Self::with_config(ExecutorConfig::new(worker_count))
    }

    /// Create an executor with a custom configuration.
    pub fn with_config(config: ExecutorConfig) -> Result<Self> {
        config.validate()?;

        let executor_id = Uuid::new_v4();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::new(config.worker_count);
        let group_locks = GroupLockRegistry::new();
        let lifecycle = Arc::new(LifecycleState::new());
        let shutdown = Arc::new(Notify::new());

        let dispatcher = Dispatcher::new(
            queue_rx,
            pool.clone(),
            group_locks.clone(),
            Arc::clone(&lifecycle),
            Arc::clone(&shutdown),
        );
        let dispatcher_handle = tokio::spawn(dispatcher.run());

        info!(
            executor_id = %executor_id,
            worker_count = config.worker_count,
            "TaskExecutor started"
        );

        Ok(Self {
            executor_id,
            config,
            queue: queue_tx,
            pool,
            group_locks,
            lifecycle,
            shutdown,
            dispatcher_handle: Mutex::new(Some(dispatcher_handle)),
        })
    }

    /// Submit a task for execution and return the handle to its eventual
    /// outcome. Never blocks and returns before the action starts.
    ///
    /// Fails with [`ExecutorError::ShuttingDown`] once `shutdown()` has been
    /// invoked; late submissions are rejected loudly instead of being silently
    /// left unserviced.
    pub fn submit<T>(&self, task: Task<T>) -> Result<ResultHandle<T>>
    where
        T: Send + 'static,
    {
        if self.lifecycle.load() != ExecutorState::Running {
            return Err(ExecutorError::ShuttingDown { task_id: task.id() });
        }

        let task_id = task.id();
        let group_id = task.group().id();
        let task_type = task.task_type();

        let (completion, result_handle) = handle::pending(task_id);
        let action = task.into_action();
        let run: Box<dyn FnOnce() -> futures::future::BoxFuture<'static, ()> + Send> =
            Box::new(move || {
                let fut: futures::future::BoxFuture<'static, ()> = Box::pin(async move {
                    let outcome = action().await;
                    match &outcome {
                        Ok(_) => debug!(task_id = %task_id, "Task completed"),
                        Err(err) => {
                            warn!(task_id = %task_id, error = %err, "Task action failed")
                        }
                    }
                    completion.complete(outcome);
                });
                fut
            });

        let internal = InternalTask {
            task_id,
            group_id,
            task_type,
            run,
        };
        self.queue
            .send(internal)
            .map_err(|_| ExecutorError::QueueClosed { task_id })?;

        debug!(task_id = %task_id, group = %group_id, "Task submitted");
        Ok(result_handle)
    }

    /// Request graceful termination and wait until every already-queued task
    /// has been handed to the worker pool.
    ///
    /// One-way and idempotent: the first call moves the dispatcher to
    /// `Draining`, later calls only wait. Tasks already dispatched run to
    /// completion and still resolve their handles; shutdown does not cancel
    /// them or wait for them.
    pub async fn shutdown(&self) {
        if self.lifecycle.begin_draining() {
            info!(executor_id = %self.executor_id, "Shutdown requested, draining queue");
        } else {
            debug!(executor_id = %self.executor_id, "Shutdown already requested");
        }
        // Wake the dispatcher if it is blocked on an empty queue.
        self.shutdown.notify_one();

        let dispatcher_handle = self.dispatcher_handle.lock().take();
        if let Some(dispatcher_handle) = dispatcher_handle {
            if let Err(err) = dispatcher_handle.await {
                warn!(
                    executor_id = %self.executor_id,
                    error = %err,
                    "Dispatcher task ended abnormally"
                );
            }
        }
        info!(executor_id = %self.executor_id, "Shutdown complete, queue drained");
    }

    /// Current lifecycle state of the dispatcher.
    pub fn state(&self) -> ExecutorState {
        self.lifecycle.load()
    }

    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            worker_count: self.pool.size(),
            available_workers: self.pool.available_slots(),
            tracked_groups: self.group_locks.tracked_groups(),
            state: self.lifecycle.load(),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskGroup, TaskType};

    #[test]
    fn lifecycle_transitions_are_one_way() {
        let lifecycle = LifecycleState::new();
        assert_eq!(lifecycle.load(), ExecutorState::Running);
        assert!(lifecycle.begin_draining());
        assert_eq!(lifecycle.load(), ExecutorState::Draining);
        // Second request is a no-op.
        assert!(!lifecycle.begin_draining());
        lifecycle.mark_stopped();
        assert_eq!(lifecycle.load(), ExecutorState::Stopped);
        assert!(!lifecycle.begin_draining());
    }

    #[tokio::test]
    async fn rejects_zero_worker_pool() {
        let err = TaskExecutor::new(0).unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConfiguration { .. }));
    }

    #[tokio::test]
    async fn stats_reflect_configuration() {
        let executor = TaskExecutor::new(3).unwrap();
        let stats = executor.stats();
        assert_eq!(stats.worker_count, 3);
        assert_eq!(stats.available_workers, 3);
        assert_eq!(stats.tracked_groups, 0);
        assert_eq!(stats.state, ExecutorState::Running);
        executor.shutdown().await;
        assert_eq!(executor.state(), ExecutorState::Stopped);
    }

    #[tokio::test]
    async fn submit_after_shutdown_fails_loudly() {
        let executor = TaskExecutor::new(1).unwrap();
        executor.shutdown().await;

        let task = Task::new(TaskGroup::new(), TaskType::Read, || async { Ok(1) });
        let err = executor.submit(task).unwrap_err();
        assert!(matches!(err, ExecutorError::ShuttingDown { .. }));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let executor = TaskExecutor::new(1).unwrap();
        executor.shutdown().await;
        executor.shutdown().await;
        assert_eq!(executor.state(), ExecutorState::Stopped);
    }
}
