//! Allocator abstraction for table construction
//!
//! Deserialization materializes a brand-new table owned exclusively by the
//! caller. Which arena that table lives in is the caller's concern, consumed
//! here through a single narrow seam.

use crate::table::{Table, TableSettings};

/// Produces an exclusively-owned table instance from a settings block.
///
/// Consulted exactly once per deserialize call; key/value storage inside the
/// table is managed by the table itself, not through this trait.
pub trait TableAllocator {
    fn allocate_table(&self, settings: TableSettings) -> Box<Table>;
}

/// Default allocator backed by the global heap.
pub struct HeapAllocator;

impl TableAllocator for HeapAllocator {
    fn allocate_table(&self, settings: TableSettings) -> Box<Table> {
        Box::new(Table::new(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_allocator_applies_settings() {
        let settings = TableSettings {
            bucket_count: 64,
            max_key_size: 32,
            max_value_size: 1024,
        };
        let table = HeapAllocator.allocate_table(settings);
        assert_eq!(*table.settings(), settings);
        assert!(table.is_empty());
    }
}
