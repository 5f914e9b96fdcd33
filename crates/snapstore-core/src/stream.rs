//! Stream abstraction for snapshot transport
//!
//! Every serialize/deserialize operation is bracketed by a Begin/End pair on
//! the underlying stream. Begin performs setup (framing header), End performs
//! teardown (checksum trailer on write, trailer verification on read).
//!
//! Framing: SNAP magic (4 bytes) + payload bytes + CRC32C trailer (4 bytes LE).
//! The checksum covers exactly the payload bytes between Begin and End.
//!
//! Bracket misuse (writing before Begin, calling Begin twice, End without
//! Begin) is a logic bug in the caller and asserts rather than returning
//! an error.

use crate::error::{SnapError, SnapResult};

/// Magic bytes identifying a snapshot stream: "SNAP" in ASCII
pub const STREAM_MAGIC: [u8; 4] = [0x53, 0x4E, 0x41, 0x50]; // 'S','N','A','P'

/// Write half of the snapshot transport.
///
/// The serializer owns the entire bracket: it calls `begin()` before the
/// version tag and `end()` after the record terminator.
pub trait StreamWriter {
    /// Open the stream bracket. Writes the framing header.
    fn begin(&mut self) -> SnapResult<()>;

    /// Write raw bytes to the stream payload.
    fn write_bytes(&mut self, buf: &[u8]) -> SnapResult<()>;

    /// Close the stream bracket. Finalizes the checksum trailer.
    fn end(&mut self) -> SnapResult<()>;
}

/// Read half of the snapshot transport.
///
/// The deserializer dispatcher owns `begin()` and the version-tag read (the
/// version must be known before a codec can be selected); the selected codec
/// owns `end()` and must call it exactly once before returning.
pub trait StreamReader {
    /// Open the stream bracket. Reads and validates the framing header.
    fn begin(&mut self) -> SnapResult<()>;

    /// Read exactly `buf.len()` payload bytes. Short reads are an error.
    fn read_exact(&mut self, buf: &mut [u8]) -> SnapResult<()>;

    /// Close the stream bracket. Reads the trailer and verifies the checksum
    /// of everything read since `begin()`.
    fn end(&mut self) -> SnapResult<()>;
}

/// In-memory stream writer backed by a growable buffer.
pub struct MemStreamWriter {
    buf: Vec<u8>,
    crc: u32,
    open: bool,
    finished: bool,
}

impl MemStreamWriter {
    /// Create an empty writer. `begin()` must be called before any writes.
    pub fn new() -> Self {
        Self { buf: Vec::new(), crc: 0, open: false, finished: false }
    }

    /// Consume the writer and return the complete framed stream.
    pub fn into_bytes(self) -> Vec<u8> {
        assert!(self.finished, "stream bracket not closed before into_bytes()");
        self.buf
    }

    /// Total bytes written so far, including framing.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for MemStreamWriter {
    fn default() -> Self { Self::new() }
}

impl StreamWriter for MemStreamWriter {
    fn begin(&mut self) -> SnapResult<()> {
        assert!(!self.open && !self.finished, "begin() called on an already-opened stream");
        self.buf.extend_from_slice(&STREAM_MAGIC);
        self.crc = 0;
        self.open = true;
        Ok(())
    }

    fn write_bytes(&mut self, buf: &[u8]) -> SnapResult<()> {
        assert!(self.open, "write_bytes() called outside the stream bracket");
        self.buf.extend_from_slice(buf);
        self.crc = crc32c::crc32c_append(self.crc, buf);
        Ok(())
    }

    fn end(&mut self) -> SnapResult<()> {
        assert!(self.open, "end() called without a matching begin()");
        let trailer = self.crc.to_le_bytes();
        self.buf.extend_from_slice(&trailer);
        self.open = false;
        self.finished = true;
        Ok(())
    }
}

/// In-memory stream reader over a complete framed byte buffer.
pub struct MemStreamReader {
    buf: Vec<u8>,
    pos: usize,
    crc: u32,
    open: bool,
}

impl MemStreamReader {
    /// Create a reader over a framed stream (as produced by MemStreamWriter).
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0, crc: 0, open: false }
    }

    /// Current read position in the underlying buffer, including framing.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Error for a read that would run past the payload.
    fn short_read(&self, wanted: usize, available: usize) -> SnapError {
        SnapError::Io {
            path: None,
            kind: std::io::ErrorKind::UnexpectedEof,
            message: format!("short read: wanted {} bytes, {} available", wanted, available),
        }
    }
}

impl StreamReader for MemStreamReader {
    fn begin(&mut self) -> SnapResult<()> {
        assert!(!self.open && self.pos == 0, "begin() called on an already-opened stream");
        if self.buf.len() < STREAM_MAGIC.len() {
            return Err(self.short_read(STREAM_MAGIC.len(), self.buf.len()));
        }
        if self.buf[..4] != STREAM_MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(&self.buf[..4]);
            return Err(SnapError::BadMagic { found });
        }
        self.pos = 4;
        self.crc = 0;
        self.open = true;
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> SnapResult<()> {
        assert!(self.open, "read_exact() called outside the stream bracket");
        // The final 4 bytes are the trailer and never part of the payload.
        let payload_end = self.buf.len().saturating_sub(4);
        let available = payload_end.saturating_sub(self.pos);
        if buf.len() > available {
            return Err(self.short_read(buf.len(), available));
        }
        buf.copy_from_slice(&self.buf[self.pos..self.pos + buf.len()]);
        self.crc = crc32c::crc32c_append(self.crc, buf);
        self.pos += buf.len();
        Ok(())
    }

    fn end(&mut self) -> SnapResult<()> {
        assert!(self.open, "end() called without a matching begin()");
        if self.pos + 4 > self.buf.len() {
            return Err(self.short_read(4, self.buf.len().saturating_sub(self.pos)));
        }
        let expected = u32::from_le_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]);
        self.pos += 4;
        self.open = false;
        if expected != self.crc {
            return Err(SnapError::ChecksumMismatch { expected, actual: self.crc });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(payload: &[u8]) -> Vec<u8> {
        let mut writer = MemStreamWriter::new();
        writer.begin().unwrap();
        writer.write_bytes(payload).unwrap();
        writer.end().unwrap();
        writer.into_bytes()
    }

    #[test]
    fn test_writer_frames_payload() {
        let bytes = framed(b"hello");
        assert_eq!(&bytes[..4], &STREAM_MAGIC);
        assert_eq!(&bytes[4..9], b"hello");
        assert_eq!(bytes.len(), 4 + 5 + 4);

        let trailer = u32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]);
        assert_eq!(trailer, crc32c::crc32c(b"hello"));
    }

    #[test]
    fn test_read_roundtrip() {
        let mut reader = MemStreamReader::new(framed(b"payload"));
        reader.begin().unwrap();
        let mut buf = [0u8; 7];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"payload");
        reader.end().unwrap();
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let mut reader = MemStreamReader::new(framed(b""));
        reader.begin().unwrap();
        reader.end().unwrap();
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = framed(b"data");
        bytes[0] = 0xFF;
        let mut reader = MemStreamReader::new(bytes);
        assert!(matches!(reader.begin(), Err(SnapError::BadMagic { .. })));
    }

    #[test]
    fn test_corrupted_payload_detected_at_end() {
        let mut bytes = framed(b"data");
        bytes[5] ^= 0xFF; // flip a payload byte
        let mut reader = MemStreamReader::new(bytes);
        reader.begin().unwrap();
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).unwrap();
        assert!(matches!(reader.end(), Err(SnapError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_short_read_surfaces_eof() {
        let mut reader = MemStreamReader::new(framed(b"ab"));
        reader.begin().unwrap();
        let mut buf = [0u8; 10];
        match reader.read_exact(&mut buf) {
            Err(SnapError::Io { kind, .. }) => {
                assert_eq!(kind, std::io::ErrorKind::UnexpectedEof);
            }
            other => panic!("expected short-read Io error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_unread_payload_fails_checksum() {
        // Reading less than the full payload leaves the trailer misaligned,
        // so end() must not silently succeed.
        let mut reader = MemStreamReader::new(framed(b"abcd"));
        reader.begin().unwrap();
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).unwrap();
        assert!(reader.end().is_err());
    }

    #[test]
    #[should_panic(expected = "write_bytes() called outside the stream bracket")]
    fn test_write_before_begin_asserts() {
        let mut writer = MemStreamWriter::new();
        let _ = writer.write_bytes(b"early");
    }
}
