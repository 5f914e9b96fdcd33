//! SnapStore Core — Versioned Snapshot Serialization Engine
//!
//! Converts a live in-memory hash table into a durable byte stream and
//! reconstructs an equivalent table from that stream, across codec versions.
//!
//! # Architecture
//!
//! - **Write path**: the current codec walks a read-only view of the table
//!   (safe under concurrent mutation) and emits the wire format
//! - **Read path**: the dispatcher reads the version tag and hands the open
//!   stream to the matching codec, which repopulates a fresh table through
//!   its mutation capability
//! - **Transport**: in-memory and file-backed streams with a scoped
//!   Begin/End bracket (magic header, CRC32C trailer, durable sync on files)
//!
//! # Versioning
//!
//! Serialization always uses the current codec. Historical codecs are
//! retained read-only in `serializer::deprecated`; removing one is a major
//! compatibility break.

pub mod config;
pub mod durability;
pub mod error;
pub mod memory;
pub mod reclaim;
pub mod serializer;
pub mod snapfile;
pub mod stream;
pub mod table;
pub mod wire;

// Re-export key types for convenience
pub use config::Properties;
pub use error::{SnapError, SnapResult};
pub use memory::{HeapAllocator, TableAllocator};
pub use reclaim::{Action, DeferredQueue, LoadGuard, ReclamationRegistry};
pub use serializer::{SnapshotDeserializer, SnapshotSerializer};
pub use snapfile::{SnapFileReader, SnapFileWriter};
pub use stream::{MemStreamReader, MemStreamWriter, StreamReader, StreamWriter};
pub use table::{PerfCounters, ReadOnlyView, Table, TableSettings, WritableView, SETTINGS_SIZE};
