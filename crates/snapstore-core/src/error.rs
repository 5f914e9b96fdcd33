//! Error types for snapshot operations
//!
//! All recoverable failures are represented by the SnapError enum. Invariant
//! violations (deferred reclamation during load, bracket misuse) are panics,
//! not error values — they indicate logic bugs, not environmental conditions.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Snapshot error types with detailed context
#[derive(Debug, Clone)]
pub enum SnapError {
    /// I/O operation failed on the underlying transport
    Io {
        /// The file path where the error occurred, if any
        path: Option<PathBuf>,
        /// The underlying I/O error kind
        kind: std::io::ErrorKind,
        /// Human-readable description
        message: String,
    },

    /// Snapshot version tag is not the current or a retained legacy value
    UnsupportedVersion {
        /// The version byte observed in the stream
        version: u8,
    },

    /// Stream framing magic not found at the start of the stream
    BadMagic {
        /// Bytes actually found where the magic was expected
        found: [u8; 4],
    },

    /// Stream trailer checksum verification failed
    ChecksumMismatch {
        /// Checksum recorded in the stream trailer
        expected: u32,
        /// Checksum computed over the payload actually read
        actual: u32,
    },
}

impl fmt::Display for SnapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapError::Io { path, kind, message } => {
                if let Some(path) = path {
                    write!(f, "I/O error in {}: {} ({})", path.display(), message, kind)
                } else {
                    write!(f, "I/O error: {} ({})", message, kind)
                }
            }

            SnapError::UnsupportedVersion { version } => {
                write!(f, "Unsupported snapshot version '{}'", version)
            }

            SnapError::BadMagic { found } => {
                write!(f, "Stream magic not found: got {:02x}{:02x}{:02x}{:02x}",
                       found[0], found[1], found[2], found[3])
            }

            SnapError::ChecksumMismatch { expected, actual } => {
                write!(f, "Stream checksum mismatch: expected 0x{:08x}, got 0x{:08x}",
                       expected, actual)
            }
        }
    }
}

impl Error for SnapError {}

/// Convert std::io::Error to SnapError::Io
impl From<std::io::Error> for SnapError {
    fn from(err: std::io::Error) -> Self {
        SnapError::Io {
            path: None,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for snapshot operations
pub type SnapResult<T> = Result<T, SnapError>;
