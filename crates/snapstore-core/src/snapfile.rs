//! File-backed snapshot transport
//!
//! Implements the stream bracket over an on-disk file with the same framing
//! as the in-memory transport: SNAP magic on Begin, CRC32C trailer on End.
//! The writer durably syncs on End — a snapshot file is only declared good
//! once its bytes are on persistent media.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::durability::sync_file;
use crate::error::{SnapError, SnapResult};
use crate::stream::{StreamReader, StreamWriter, STREAM_MAGIC};

/// Writes a framed snapshot stream to a file.
pub struct SnapFileWriter {
    file: File,
    path: PathBuf,
    crc: u32,
    open: bool,
}

impl SnapFileWriter {
    /// Create (or truncate) the snapshot file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> SnapResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| SnapError::Io {
                path: Some(path.clone()),
                kind: e.kind(),
                message: format!("Failed to create snapshot file: {}", e),
            })?;

        Ok(Self { file, path, crc: 0, open: false })
    }

    /// Path of the snapshot file (for diagnostics).
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&mut self, buf: &[u8], what: &str) -> SnapResult<()> {
        self.file.write_all(buf).map_err(|e| SnapError::Io {
            path: Some(self.path.clone()),
            kind: e.kind(),
            message: format!("Snapshot file {} write failed: {}", what, e),
        })
    }
}

impl StreamWriter for SnapFileWriter {
    fn begin(&mut self) -> SnapResult<()> {
        assert!(!self.open, "begin() called on an already-opened stream");
        self.write_all(&STREAM_MAGIC, "magic")?;
        self.crc = 0;
        self.open = true;
        Ok(())
    }

    fn write_bytes(&mut self, buf: &[u8]) -> SnapResult<()> {
        assert!(self.open, "write_bytes() called outside the stream bracket");
        self.write_all(buf, "payload")?;
        self.crc = crc32c::crc32c_append(self.crc, buf);
        Ok(())
    }

    fn end(&mut self) -> SnapResult<()> {
        assert!(self.open, "end() called without a matching begin()");
        let trailer = self.crc.to_le_bytes();
        self.write_all(&trailer, "trailer")?;

        // The snapshot must survive power loss before End reports success.
        sync_file(&self.file).map_err(|e| SnapError::Io {
            path: Some(self.path.clone()),
            kind: e.kind(),
            message: format!("Snapshot file sync failed: {}", e),
        })?;

        self.open = false;
        Ok(())
    }
}

/// Reads a framed snapshot stream from a file.
pub struct SnapFileReader {
    file: File,
    path: PathBuf,
    /// Total file length, stat'ed at open; the final 4 bytes are the trailer.
    len: u64,
    pos: u64,
    crc: u32,
    open: bool,
}

impl SnapFileReader {
    /// Open the snapshot file at `path` for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> SnapResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| SnapError::Io {
            path: Some(path.clone()),
            kind: e.kind(),
            message: format!("Failed to open snapshot file: {}", e),
        })?;

        let len = file
            .metadata()
            .map_err(|e| SnapError::Io {
                path: Some(path.clone()),
                kind: e.kind(),
                message: format!("Failed to stat snapshot file: {}", e),
            })?
            .len();

        Ok(Self { file, path, len, pos: 0, crc: 0, open: false })
    }

    fn short_read(&self, wanted: u64, available: u64) -> SnapError {
        SnapError::Io {
            path: Some(self.path.clone()),
            kind: std::io::ErrorKind::UnexpectedEof,
            message: format!("short read: wanted {} bytes, {} available", wanted, available),
        }
    }

    fn fill(&mut self, buf: &mut [u8]) -> SnapResult<()> {
        self.file.read_exact(buf).map_err(|e| SnapError::Io {
            path: Some(self.path.clone()),
            kind: e.kind(),
            message: format!("Snapshot file read failed: {}", e),
        })?;
        self.pos += buf.len() as u64;
        Ok(())
    }
}

impl StreamReader for SnapFileReader {
    fn begin(&mut self) -> SnapResult<()> {
        assert!(!self.open && self.pos == 0, "begin() called on an already-opened stream");
        if self.len < STREAM_MAGIC.len() as u64 {
            return Err(self.short_read(STREAM_MAGIC.len() as u64, self.len));
        }
        let mut magic = [0u8; 4];
        self.fill(&mut magic)?;
        if magic != STREAM_MAGIC {
            return Err(SnapError::BadMagic { found: magic });
        }
        self.crc = 0;
        self.open = true;
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> SnapResult<()> {
        assert!(self.open, "read_exact() called outside the stream bracket");
        // The final 4 bytes of the file are the trailer, never payload.
        let payload_end = self.len.saturating_sub(4);
        let available = payload_end.saturating_sub(self.pos);
        if buf.len() as u64 > available {
            return Err(self.short_read(buf.len() as u64, available));
        }
        self.fill(buf)?;
        self.crc = crc32c::crc32c_append(self.crc, buf);
        Ok(())
    }

    fn end(&mut self) -> SnapResult<()> {
        assert!(self.open, "end() called without a matching begin()");
        if self.pos + 4 > self.len {
            return Err(self.short_read(4, self.len.saturating_sub(self.pos)));
        }
        let mut trailer = [0u8; 4];
        self.fill(&mut trailer)?;
        self.open = false;

        let expected = u32::from_le_bytes(trailer);
        if expected != self.crc {
            return Err(SnapError::ChecksumMismatch { expected, actual: self.crc });
        }
        Ok(())
    }
}
