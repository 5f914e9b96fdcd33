//! Deferred reclamation capability
//!
//! The table's mutation path cannot free a displaced value immediately:
//! concurrent readers protected by the epoch scheme may still reference it.
//! Instead it hands the reclamation registry an action to run once no reader
//! can observe the old value.
//!
//! Two implementations live here:
//! - `DeferredQueue` — the live-path registry that queues actions for a later
//!   `drain()` by the epoch machinery.
//! - `LoadGuard` — the registry paired with snapshot loading, where deferred
//!   reclamation is provably unreachable and any request is a fatal bug.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// A deferred reclamation action, run when it is provably safe.
pub type Action = Box<dyn FnOnce() + Send>;

/// Capability that accepts deferred-reclamation requests from the mutation path.
pub trait ReclamationRegistry {
    /// Register an action to run once no concurrent reader can observe the
    /// memory it reclaims.
    fn register_action(&self, action: Action);
}

/// Live-path registry: queues actions until the owner drains them.
pub struct DeferredQueue {
    /// Actions waiting for a safe reclamation point
    pending: Mutex<Vec<Action>>,
    /// Total actions registered since creation
    total_registered: AtomicU64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            total_registered: AtomicU64::new(0),
        }
    }

    /// Run every pending action. Returns how many ran.
    ///
    /// The caller decides when this is safe (e.g. after an epoch boundary);
    /// the queue itself imposes no timing.
    pub fn drain(&self) -> usize {
        let actions = {
            let mut pending = self.pending.lock();
            std::mem::take(&mut *pending)
        };
        let count = actions.len();
        for action in actions {
            action();
        }
        count
    }

    /// Actions currently waiting.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Total actions registered since creation.
    pub fn total_registered(&self) -> u64 {
        self.total_registered.load(Ordering::Relaxed)
    }
}

impl Default for DeferredQueue {
    fn default() -> Self { Self::new() }
}

impl ReclamationRegistry for DeferredQueue {
    fn register_action(&self, action: Action) {
        let mut pending = self.pending.lock();
        pending.push(action);
        self.total_registered.fetch_add(1, Ordering::Relaxed);
    }
}

/// Registry used while reconstructing a table from a snapshot.
///
/// During load the table is not yet visible to any reader and every incoming
/// key is unique (a property of the source hash table), so the mutation path
/// has no legitimate reason to defer reclamation. A request here means either
/// the snapshot producer emitted a duplicate key or the mutation path is
/// broken — both are logic bugs, so this fails fatally instead of queuing.
pub struct LoadGuard;

impl ReclamationRegistry for LoadGuard {
    fn register_action(&self, _action: Action) {
        panic!("deferred reclamation requested during snapshot load");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_queue_defers_until_drain() {
        let queue = DeferredQueue::new();
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let ran = Arc::clone(&ran);
            queue.register_action(Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(queue.pending_count(), 3);
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        assert_eq!(queue.drain(), 3);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.total_registered(), 3);
    }

    #[test]
    fn test_drain_empty_queue() {
        let queue = DeferredQueue::new();
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    #[should_panic(expected = "deferred reclamation requested during snapshot load")]
    fn test_load_guard_is_fatal() {
        LoadGuard.register_action(Box::new(|| {}));
    }
}
