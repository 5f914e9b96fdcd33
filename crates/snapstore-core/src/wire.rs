//! Scalar and buffer codec over the stream abstraction
//!
//! Primitive encode/decode shared by every snapshot codec version: fixed-width
//! integers (little-endian), one-byte booleans, raw byte runs, and
//! u32-length-prefixed byte buffers. The wire helpers never touch the stream
//! bracket — Begin/End remain the responsibility of the codec and dispatcher.

use crate::error::SnapResult;
use crate::stream::{StreamReader, StreamWriter};

/// Encodes scalars and buffers onto a stream writer.
pub struct WireWriter<'a> {
    out: &'a mut dyn StreamWriter,
}

impl<'a> WireWriter<'a> {
    pub fn new(out: &'a mut dyn StreamWriter) -> Self {
        Self { out }
    }

    pub fn write_u8(&mut self, value: u8) -> SnapResult<()> {
        self.out.write_bytes(&[value])
    }

    pub fn write_u32(&mut self, value: u32) -> SnapResult<()> {
        self.out.write_bytes(&value.to_le_bytes())
    }

    /// One-byte boolean: 1 = true, 0 = false.
    pub fn write_bool(&mut self, value: bool) -> SnapResult<()> {
        self.write_u8(value as u8)
    }

    /// Raw byte run with no length prefix. The reader must know the size
    /// out-of-band (used for the fixed-size settings block).
    pub fn write_raw(&mut self, buf: &[u8]) -> SnapResult<()> {
        self.out.write_bytes(buf)
    }

    /// u32 length prefix followed by the bytes.
    pub fn write_buf(&mut self, buf: &[u8]) -> SnapResult<()> {
        self.write_u32(buf.len() as u32)?;
        self.write_raw(buf)
    }
}

/// Decodes scalars and buffers from a stream reader.
pub struct WireReader<'a> {
    input: &'a mut dyn StreamReader,
}

impl<'a> WireReader<'a> {
    pub fn new(input: &'a mut dyn StreamReader) -> Self {
        Self { input }
    }

    pub fn read_u8(&mut self) -> SnapResult<u8> {
        let mut buf = [0u8; 1];
        self.input.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u32(&mut self) -> SnapResult<u32> {
        let mut buf = [0u8; 4];
        self.input.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// One-byte boolean. Any nonzero byte decodes as true.
    pub fn read_bool(&mut self) -> SnapResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Fill `buf` exactly. Short reads surface as the transport's error.
    pub fn read_raw(&mut self, buf: &mut [u8]) -> SnapResult<()> {
        self.input.read_exact(buf)
    }

    /// Read a u32 length prefix, resize `buf` to it, and fill it. The buffer
    /// is reused across calls so record loops do not reallocate per record.
    pub fn read_buf_into(&mut self, buf: &mut Vec<u8>) -> SnapResult<()> {
        let len = self.read_u32()? as usize;
        buf.resize(len, 0);
        self.read_raw(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{MemStreamReader, MemStreamWriter};

    fn write_then_read<W, R, T>(write: W, read: R) -> T
    where
        W: FnOnce(&mut WireWriter<'_>),
        R: FnOnce(&mut WireReader<'_>) -> T,
    {
        let mut writer = MemStreamWriter::new();
        writer.begin().unwrap();
        {
            let mut wire = WireWriter::new(&mut writer);
            write(&mut wire);
        }
        writer.end().unwrap();

        let mut reader = MemStreamReader::new(writer.into_bytes());
        reader.begin().unwrap();
        let result = {
            let mut wire = WireReader::new(&mut reader);
            read(&mut wire)
        };
        reader.end().unwrap();
        result
    }

    #[test]
    fn test_u32_little_endian() {
        let mut writer = MemStreamWriter::new();
        writer.begin().unwrap();
        WireWriter::new(&mut writer).write_u32(0x0102_0304).unwrap();
        writer.end().unwrap();

        let bytes = writer.into_bytes();
        assert_eq!(&bytes[4..8], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_scalar_roundtrip() {
        let (a, b, c) = write_then_read(
            |w| {
                w.write_u8(0xAB).unwrap();
                w.write_u32(u32::MAX).unwrap();
                w.write_bool(true).unwrap();
            },
            |r| {
                (
                    r.read_u8().unwrap(),
                    r.read_u32().unwrap(),
                    r.read_bool().unwrap(),
                )
            },
        );
        assert_eq!(a, 0xAB);
        assert_eq!(b, u32::MAX);
        assert!(c);
    }

    #[test]
    fn test_length_prefixed_buffer_roundtrip() {
        let got = write_then_read(
            |w| w.write_buf(b"key-bytes").unwrap(),
            |r| {
                let mut buf = Vec::new();
                r.read_buf_into(&mut buf).unwrap();
                buf
            },
        );
        assert_eq!(got, b"key-bytes");
    }

    #[test]
    fn test_zero_length_buffer() {
        let got = write_then_read(
            |w| w.write_buf(b"").unwrap(),
            |r| {
                let mut buf = vec![0xFF; 8]; // stale contents must be discarded
                r.read_buf_into(&mut buf).unwrap();
                buf
            },
        );
        assert!(got.is_empty());
    }

    #[test]
    fn test_nonzero_byte_decodes_true() {
        let got = write_then_read(
            |w| w.write_u8(7).unwrap(),
            |r| r.read_bool().unwrap(),
        );
        assert!(got);
    }
}
