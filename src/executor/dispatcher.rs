//! # Dispatcher
//!
//! Single control loop draining the task queue and handing each item to the
//! worker pool. Lifecycle is a three-state machine: `Running` (block on the
//! queue, interruptible by shutdown), `Draining` (shutdown requested, consume
//! whatever is still queued without blocking), `Stopped` (loop exited).

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ExecutorState, LifecycleState};
use crate::group_lock::GroupLockRegistry;
use crate::task::TaskType;

use super::worker::WorkerPool;

/// A submitted task paired with its completion side, type-erased for the
/// queue. Owned exclusively by the pipeline until the handle is fulfilled.
pub(crate) struct InternalTask {
    pub(crate) task_id: Uuid,
    pub(crate) group_id: Uuid,
    pub(crate) task_type: TaskType,
    /// Runs the action and records the outcome on the result handle.
    pub(crate) run: Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>,
}

pub(crate) struct Dispatcher {
    queue: mpsc::UnboundedReceiver<InternalTask>,
    pool: WorkerPool,
    group_locks: GroupLockRegistry,
    lifecycle: Arc<LifecycleState>,
    shutdown: Arc<Notify>,
}

impl Dispatcher {
    pub(crate) fn new(
        queue: mpsc::UnboundedReceiver<InternalTask>,
        pool: WorkerPool,
        group_locks: GroupLockRegistry,
        lifecycle: Arc<LifecycleState>,
        shutdown: Arc<Notify>,
    ) -> Self {
        Self {
            queue,
            pool,
            group_locks,
            lifecycle,
            shutdown,
        }
    }

    /// Main dispatch loop. Exits once shutdown has drained the queue, or once
    /// every submitter is gone.
    pub(crate) async fn run(mut self) {
        debug!("Dispatcher running");
        loop {
            match self.lifecycle.load() {
                ExecutorState::Running => {
                    tokio::select! {
                        received = self.queue.recv() => match received {
                            Some(internal) => self.dispatch(internal),
                            // Executor dropped without shutdown; nothing more
                            // can arrive.
                            None => break,
                        },
                        _ = self.shutdown.notified() => {
                            // Woken by shutdown(); loop around and re-read the
                            // lifecycle state.
                        }
                    }
                }
                ExecutorState::Draining => match self.queue.try_recv() {
                    Ok(internal) => self.dispatch(internal),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                },
                ExecutorState::Stopped => break,
            }
        }
        self.lifecycle.mark_stopped();
        info!("Dispatcher stopped");
    }

    fn dispatch(&self, internal: InternalTask) {
        debug!(
            task_id = %internal.task_id,
            group = %internal.group_id,
            "Dispatching task"
        );
        // Group permits are issued here, in dispatch order, so same-group
        // execution order matches submission order.
        let permit = self.group_locks.register(internal.group_id);
        self.pool.execute(internal, permit);
    }
}
