//! Versioned snapshot codecs and their dispatchers
//!
//! Snapshot format:
//! <version u8> <settings block, fixed size> followed by, per record:
//! if the next byte is 1: <key len u32> <key bytes> <value len u32> <value bytes>
//! otherwise: end of the records.
//!
//! The dispatchers own version handling. Serialization always goes through
//! the current codec. Deserialization reads the version tag first and selects
//! the matching codec; the bracket is split asymmetrically on the read path —
//! the dispatcher calls `begin()` and consumes the version (it must know the
//! version before it can pick a codec), the selected codec calls `end()`
//! exactly once before returning.

use crate::config::Properties;
use crate::error::{SnapError, SnapResult};
use crate::memory::TableAllocator;
use crate::stream::{StreamReader, StreamWriter};
use crate::table::Table;

/// Codecs for the current snapshot version.
pub mod current {
    use super::*;
    use crate::reclaim::LoadGuard;
    use crate::table::{TableSettings, WritableView, SETTINGS_SIZE};
    use crate::wire::{WireReader, WireWriter};

    /// Version tag written by the current codec.
    pub const VERSION: u8 = 3;

    /// Writer path of the current codec.
    ///
    /// Walks a read-only view of the table and emits the wire format. The
    /// table may be mutated concurrently by other threads; safety of the
    /// iteration is the table's guarantee, and the snapshot reflects each
    /// concurrent change entry-by-entry or not at all.
    pub struct SnapshotWriter;

    impl SnapshotWriter {
        /// Serialize `table` onto `writer`.
        ///
        /// Assumes the writer bracket has not been opened: this codec owns
        /// both `begin()` and `end()`.
        pub fn serialize(&self, table: &Table, writer: &mut dyn StreamWriter) -> SnapResult<()> {
            writer.begin()?;

            // Every save is a fresh per-call count.
            table.perf().reset_saved();

            let mut wire = WireWriter::new(&mut *writer);
            wire.write_u8(VERSION)?;
            wire.write_raw(&table.settings().to_bytes())?;

            let view = table.read_only_view();
            for (key, value) in view.iter() {
                wire.write_bool(true)?; // a record follows
                wire.write_buf(key)?;
                wire.write_buf(value)?;
                table.perf().increment_saved();
            }
            wire.write_bool(false)?; // end of the records

            // Publish the counters for any thread that later observes the
            // snapshot as complete.
            table.perf().publish();

            writer.end()
        }
    }

    /// Reader path of the current codec.
    ///
    /// Reconstructs a fresh table by driving its mutation capability. The new
    /// table is not visible to any other thread until this returns, and keys
    /// in a well-formed snapshot are unique, so the mutation path must never
    /// request deferred reclamation — `LoadGuard` turns that assumption into
    /// a detectable invariant.
    pub struct SnapshotReader;

    impl SnapshotReader {
        /// The current codec takes no tunables; the bag is reserved for
        /// codec versions that do.
        pub fn new(_properties: &Properties) -> Self {
            SnapshotReader
        }

        /// Deserialize a table from `reader`.
        ///
        /// Assumes `reader.begin()` was already called and the version tag
        /// consumed by the dispatcher. Calls `reader.end()` exactly once
        /// before returning.
        pub fn deserialize(
            &self,
            memory: &dyn TableAllocator,
            reader: &mut dyn StreamReader,
        ) -> SnapResult<Box<Table>> {
            let mut wire = WireReader::new(&mut *reader);

            let mut settings_buf = [0u8; SETTINGS_SIZE];
            wire.read_raw(&mut settings_buf)?;
            let settings = TableSettings::from_bytes(&settings_buf);

            let table = memory.allocate_table(settings);

            let guard = LoadGuard;
            let mut writable = WritableView::new(&table, &guard);

            // Scratch buffers reused across records.
            let mut key_buf = Vec::new();
            let mut value_buf = Vec::new();

            let mut has_more = wire.read_bool()?;
            while has_more {
                wire.read_buf_into(&mut key_buf)?;
                wire.read_buf_into(&mut value_buf)?;

                writable.add(&key_buf, &value_buf);
                table.perf().increment_loaded();

                has_more = wire.read_bool()?;
            }

            table.perf().publish();

            reader.end()?;

            Ok(table)
        }
    }
}

/// Retained read-only codecs for historical snapshot versions.
///
/// Append-only: a legacy codec stays here for as long as snapshots of its
/// version may exist, and removing one is a compatibility break requiring a
/// major version bump of this crate. Legacy codecs are never used for writing.
pub mod deprecated {}

/// Main driver for serializing a table. Always uses the current codec.
pub struct SnapshotSerializer;

impl SnapshotSerializer {
    pub fn serialize(&self, table: &Table, writer: &mut dyn StreamWriter) -> SnapResult<()> {
        current::SnapshotWriter.serialize(table, writer)
    }
}

/// Main driver for deserializing a snapshot stream into a new table.
pub struct SnapshotDeserializer {
    properties: Properties,
}

impl SnapshotDeserializer {
    pub fn new(properties: Properties) -> Self {
        Self { properties }
    }

    /// Read the version tag and delegate to the matching codec.
    ///
    /// An unknown version fails before any settings or record bytes are read.
    pub fn deserialize(
        &self,
        memory: &dyn TableAllocator,
        reader: &mut dyn StreamReader,
    ) -> SnapResult<Box<Table>> {
        reader.begin()?;

        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;

        match version[0] {
            current::VERSION => {
                current::SnapshotReader::new(&self.properties).deserialize(memory, reader)
            }
            unsupported => Err(SnapError::UnsupportedVersion { version: unsupported }),
        }
    }
}
