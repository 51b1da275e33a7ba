//! # Group Lock Registry
//!
//! Per-group mutual exclusion with FIFO handoff. The registry maps a group
//! identifier to a chain of release signals, created lazily and atomically on
//! the first reference to that group. Each [`GroupPermit`] must be acquired
//! before its task's action runs; acquisition completes only after every
//! earlier permit for the same group has been released, so at most one holder
//! exists per group at any instant and same-group execution order equals the
//! order in which permits were issued.
//!
//! Release is unconditional: dropping a permit releases it, on success,
//! failure, and cancellation paths alike. A group's entry is evicted once its
//! last outstanding permit is released, so the registry's footprint is bounded
//! by in-flight work rather than by the number of groups ever seen.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::trace;
use uuid::Uuid;

/// Chain state for one group.
#[derive(Debug, Default)]
struct GroupEntry {
    /// Number of permits issued and not yet released.
    active: usize,
    /// Release signal of the most recently issued permit; becomes the next
    /// permit's predecessor.
    tail: Option<oneshot::Receiver<()>>,
}

/// Concurrent map from group identifier to its mutual-exclusion chain.
#[derive(Debug, Clone, Default)]
pub struct GroupLockRegistry {
    groups: Arc<DashMap<Uuid, GroupEntry>>,
}

impl GroupLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a permit for the given group, creating the group's entry if this
    /// is the first reference to it. The get-or-create step is atomic under
    /// concurrent first references (DashMap entry API), so two callers can
    /// never observe two different chains for the same group.
    ///
    /// Permits must be issued in the order executions are meant to serialize;
    /// the dispatcher calls this in dispatch order.
    pub fn register(&self, group_id: Uuid) -> GroupPermit {
        let (release_tx, release_rx) = oneshot::channel();
        let predecessor = {
            let mut entry = self.groups.entry(group_id).or_default();
            entry.active += 1;
            std::mem::replace(&mut entry.tail, Some(release_rx))
        };
        trace!(group = %group_id, chained = predecessor.is_some(), "Group permit issued");
        GroupPermit {
            registry: self.clone(),
            group_id,
            predecessor,
            release: Some(release_tx),
        }
    }

    /// Number of groups currently holding an entry.
    pub fn tracked_groups(&self) -> usize {
        self.groups.len()
    }

    /// Drop one outstanding permit and evict the entry if the group went idle.
    fn retire(&self, group_id: Uuid) {
        if let Some(mut entry) = self.groups.get_mut(&group_id) {
            entry.active -= 1;
            let idle = entry.active == 0;
            drop(entry);
            if idle {
                // Re-checked under the shard lock; a concurrent register wins.
                self.groups.remove_if(&group_id, |_, entry| entry.active == 0);
            }
        }
    }
}

/// One position in a group's mutual-exclusion chain.
///
/// Dropping the permit releases the group lock and retires the registry
/// entry's refcount, whether or not the permit was ever acquired.
#[derive(Debug)]
pub struct GroupPermit {
    registry: GroupLockRegistry,
    group_id: Uuid,
    predecessor: Option<oneshot::Receiver<()>>,
    release: Option<oneshot::Sender<()>>,
}

impl GroupPermit {
    pub fn group_id(&self) -> Uuid {
        self.group_id
    }

    /// Block until every earlier permit for this group has been released.
    ///
    /// Cancel-safe: an interrupted wait can be resumed by calling `acquire`
    /// again. A predecessor dropped without an explicit release counts as
    /// released.
    pub async fn acquire(&mut self) {
        if let Some(predecessor) = self.predecessor.as_mut() {
            let _ = predecessor.await;
            self.predecessor = None;
        }
    }
}

impl Drop for GroupPermit {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            let _ = release.send(());
        }
        self.registry.retire(self.group_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn first_reference_creates_entry() {
        let registry = GroupLockRegistry::new();
        assert_eq!(registry.tracked_groups(), 0);

        let mut permit = registry.register(Uuid::new_v4());
        assert_eq!(registry.tracked_groups(), 1);
        // Nothing ahead of the first permit.
        timeout(Duration::from_millis(50), permit.acquire())
            .await
            .expect("first permit must acquire immediately");
    }

    #[tokio::test]
    async fn same_group_hands_off_in_order() {
        let registry = GroupLockRegistry::new();
        let group = Uuid::new_v4();

        let mut first = registry.register(group);
        let mut second = registry.register(group);
        first.acquire().await;

        // Second permit is blocked while the first is held.
        assert!(timeout(Duration::from_millis(50), second.acquire())
            .await
            .is_err());

        drop(first);
        timeout(Duration::from_millis(100), second.acquire())
            .await
            .expect("release must unblock the next permit");
    }

    #[tokio::test]
    async fn unacquired_drop_still_releases() {
        let registry = GroupLockRegistry::new();
        let group = Uuid::new_v4();

        let first = registry.register(group);
        let mut second = registry.register(group);
        drop(first);

        timeout(Duration::from_millis(100), second.acquire())
            .await
            .expect("dropped predecessor counts as released");
    }

    #[tokio::test]
    async fn distinct_groups_do_not_block_each_other() {
        let registry = GroupLockRegistry::new();

        let mut a = registry.register(Uuid::new_v4());
        let mut b = registry.register(Uuid::new_v4());
        a.acquire().await;
        timeout(Duration::from_millis(50), b.acquire())
            .await
            .expect("groups must be independent");
        assert_eq!(registry.tracked_groups(), 2);
    }

    #[tokio::test]
    async fn idle_group_entry_is_evicted() {
        let registry = GroupLockRegistry::new();
        let group = Uuid::new_v4();

        let first = registry.register(group);
        let second = registry.register(group);
        assert_eq!(registry.tracked_groups(), 1);

        drop(first);
        assert_eq!(registry.tracked_groups(), 1);
        drop(second);
        assert_eq!(registry.tracked_groups(), 0);

        // A later reference recreates the entry from scratch.
        let mut again = registry.register(group);
        assert_eq!(registry.tracked_groups(), 1);
        timeout(Duration::from_millis(50), again.acquire())
            .await
            .expect("recreated entry starts unlocked");
    }
}
