//! # Worker Pool
//!
//! Fixed-size set of execution slots for dispatched tasks. Concurrency is
//! bounded with a semaphore rather than dedicated threads: each dispatched
//! item is spawned onto the runtime and must hold one of the pool's permits
//! while its action runs.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, trace};

use super::dispatcher::InternalTask;
use crate::group_lock::GroupPermit;

#[derive(Debug, Clone)]
pub(crate) struct WorkerPool {
    slots: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Pool slots currently free.
    pub(crate) fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Hand one dispatched task to the pool without waiting for it to finish.
    ///
    /// The spawned execution: (a) acquires the task's group permit, blocking
    /// while an earlier same-group task holds it; (b) takes a pool slot; (c)
    /// runs the action and records the outcome on the result handle; (d)
    /// releases slot and group permit. A task blocked on its group does not
    /// occupy a slot, so a busy group cannot starve other groups out of the
    /// pool. The group permit is dropped only after the outcome is recorded,
    /// keeping same-group executions strictly non-overlapping.
    pub(crate) fn execute(&self, internal: InternalTask, mut permit: GroupPermit) {
        let slots = Arc::clone(&self.slots);
        tokio::spawn(async move {
            trace!(
                task_id = %internal.task_id,
                group = %internal.group_id,
                "Waiting for group lock"
            );
            permit.acquire().await;

            // acquire_owned only fails on a closed semaphore; the pool never
            // closes its slots.
            let Ok(_slot) = slots.acquire_owned().await else {
                return;
            };
            debug!(
                task_id = %internal.task_id,
                group = %internal.group_id,
                task_type = %internal.task_type,
                "Executing task"
            );
            (internal.run)().await;
            drop(permit);
        });
    }
}
