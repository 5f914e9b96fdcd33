//! The fixed-schema hash table the snapshot codecs drive
//!
//! The concurrent lookup/insert/resize machinery of the full engine is not
//! this crate's business; what lives here is the minimal table surface the
//! codecs consume:
//!
//! - a fixed-size settings block copied verbatim into every snapshot
//! - per-table perf counters published across the sync boundary by one fence
//! - a read-only iteration view, safe under concurrent mutation
//! - a mutation view that routes displaced values through a reclamation
//!   registry

use std::sync::atomic::{self, AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::reclaim::ReclamationRegistry;

/// Size of the serialized settings block in bytes.
///
/// Not encoded in the stream — reader and writer agree on it through the
/// table type itself.
pub const SETTINGS_SIZE: usize = 12;

/// Fixed-size table configuration, copied byte-for-byte into snapshots.
///
/// Layout (little-endian):
///   [0..4]   bucket_count:   u32
///   [4..8]   max_key_size:   u32
///   [8..12]  max_value_size: u32
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct TableSettings {
    /// Number of hash buckets the table is sized for
    pub bucket_count: u32,
    /// Maximum key size in bytes
    pub max_key_size: u32,
    /// Maximum value size in bytes
    pub max_value_size: u32,
}

impl TableSettings {
    /// Serialize to the fixed-size wire block.
    pub fn to_bytes(&self) -> [u8; SETTINGS_SIZE] {
        let mut buf = [0u8; SETTINGS_SIZE];
        buf[0..4].copy_from_slice(&self.bucket_count.to_le_bytes());
        buf[4..8].copy_from_slice(&self.max_key_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.max_value_size.to_le_bytes());
        buf
    }

    /// Parse from the fixed-size wire block. Any byte pattern is a valid
    /// settings block — the codec copies it verbatim and does not judge it.
    pub fn from_bytes(buf: &[u8; SETTINGS_SIZE]) -> Self {
        Self {
            bucket_count: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            max_key_size: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            max_value_size: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        }
    }
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            bucket_count: 1024,
            max_key_size: 128,
            max_value_size: 32 * 1024 * 1024,
        }
    }
}

/// Per-table observability counters.
///
/// Increments are relaxed — during a serialize or deserialize only one thread
/// touches them. `publish()` issues the single release fence that makes the
/// final values visible to any thread that later observes the operation as
/// finished; it is a publish point, not a per-record barrier.
pub struct PerfCounters {
    records_saved: AtomicU64,
    records_loaded: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            records_saved: AtomicU64::new(0),
            records_loaded: AtomicU64::new(0),
        }
    }

    pub fn increment_saved(&self) {
        self.records_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_loaded(&self) {
        self.records_loaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Every save starts a fresh per-call count.
    pub fn reset_saved(&self) {
        self.records_saved.store(0, Ordering::Relaxed);
    }

    /// Flush counters so the values are up to date for any later observer.
    pub fn publish(&self) {
        atomic::fence(Ordering::Release);
    }

    pub fn records_saved(&self) -> u64 {
        self.records_saved.load(Ordering::Acquire)
    }

    pub fn records_loaded(&self) -> u64 {
        self.records_loaded.load(Ordering::Acquire)
    }
}

impl Default for PerfCounters {
    fn default() -> Self { Self::new() }
}

/// RAM hash table with a fixed settings block and perf counters.
///
/// All public methods take `&self`; concurrent readers go through the RwLock.
pub struct Table {
    settings: TableSettings,
    slots: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
    perf: PerfCounters,
}

impl Table {
    pub fn new(settings: TableSettings) -> Self {
        Self {
            settings,
            slots: RwLock::new(HashMap::new()),
            perf: PerfCounters::new(),
        }
    }

    /// Get a copy of the value for a key, if present.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let slots = self.slots.read();
        slots.get(key).cloned()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        let slots = self.slots.read();
        slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        let slots = self.slots.read();
        slots.len()
    }

    pub fn is_empty(&self) -> bool {
        let slots = self.slots.read();
        slots.is_empty()
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn perf(&self) -> &PerfCounters {
        &self.perf
    }

    /// Obtain the read-only iteration capability.
    ///
    /// Safe to use while other threads mutate the same table: writers block
    /// on the lock for the lifetime of the view, so the view never observes
    /// a torn entry. Callers that need a point-in-time snapshot get one only
    /// for as long as they hold the view.
    pub fn read_only_view(&self) -> ReadOnlyView<'_> {
        ReadOnlyView { guard: self.slots.read() }
    }
}

/// Read-only iteration capability over a table.
///
/// Iteration order is whatever the underlying hash map yields; the snapshot
/// format neither requires nor guarantees any key ordering.
pub struct ReadOnlyView<'t> {
    guard: RwLockReadGuard<'t, HashMap<Vec<u8>, Vec<u8>>>,
}

impl<'t> ReadOnlyView<'t> {
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        self.guard.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

/// Mutation capability over a table.
///
/// Requires a reclamation registry: overwriting a key displaces a value that
/// concurrent readers protected by the epoch scheme may still reference, so
/// the old value is handed to the registry instead of being dropped inline.
pub struct WritableView<'t> {
    table: &'t Table,
    reclaim: &'t dyn ReclamationRegistry,
}

impl<'t> WritableView<'t> {
    pub fn new(table: &'t Table, reclaim: &'t dyn ReclamationRegistry) -> Self {
        Self { table, reclaim }
    }

    /// Insert a key/value pair, copying both into table-owned storage.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        let displaced = {
            let mut slots = self.table.slots.write();
            slots.insert(key.to_vec(), value.to_vec())
        };
        if let Some(old) = displaced {
            self.reclaim.register_action(Box::new(move || drop(old)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reclaim::DeferredQueue;

    #[test]
    fn test_settings_byte_layout() {
        let settings = TableSettings {
            bucket_count: 0x0102_0304,
            max_key_size: 5,
            max_value_size: 6,
        };
        let bytes = settings.to_bytes();
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(TableSettings::from_bytes(&bytes), settings);
    }

    #[test]
    fn test_settings_accept_any_pattern() {
        let zero = TableSettings::from_bytes(&[0u8; SETTINGS_SIZE]);
        assert_eq!(zero.to_bytes(), [0u8; SETTINGS_SIZE]);

        let ones = TableSettings::from_bytes(&[0xFF; SETTINGS_SIZE]);
        assert_eq!(ones.to_bytes(), [0xFF; SETTINGS_SIZE]);
    }

    #[test]
    fn test_add_and_get() {
        let table = Table::new(TableSettings::default());
        let queue = DeferredQueue::new();
        let mut view = WritableView::new(&table, &queue);

        view.add(b"hello", b"world");
        assert_eq!(table.get(b"hello"), Some(b"world".to_vec()));
        assert_eq!(table.len(), 1);
        assert!(table.contains_key(b"hello"));
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_overwrite_defers_displaced_value() {
        let table = Table::new(TableSettings::default());
        let queue = DeferredQueue::new();
        let mut view = WritableView::new(&table, &queue);

        view.add(b"k", b"v1");
        view.add(b"k", b"v2");

        assert_eq!(table.get(b"k"), Some(b"v2".to_vec()));
        assert_eq!(table.len(), 1);
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(queue.drain(), 1);
    }

    #[test]
    fn test_view_iterates_all_entries() {
        let table = Table::new(TableSettings::default());
        let queue = DeferredQueue::new();
        let mut writable = WritableView::new(&table, &queue);
        writable.add(b"a", b"1");
        writable.add(b"b", b"2");
        drop(writable);

        let view = table.read_only_view();
        assert_eq!(view.len(), 2);
        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = view
            .iter()
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .collect();
        pairs.sort();
        assert_eq!(pairs, vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
        ]);
    }

    #[test]
    fn test_counters_publish_final_values() {
        let perf = PerfCounters::new();
        for _ in 0..5 {
            perf.increment_saved();
        }
        perf.increment_loaded();
        perf.publish();
        assert_eq!(perf.records_saved(), 5);
        assert_eq!(perf.records_loaded(), 1);

        perf.reset_saved();
        assert_eq!(perf.records_saved(), 0);
        assert_eq!(perf.records_loaded(), 1);
    }
}
