use std::{io::Cursor, mem::size_of};

use binrw::{BinRead, BinResult, BinWrite, Endian};

use crate::error::{Error, Result};

/// Random-access reader over an immutable byte buffer.
///
/// Nested tables are entered with [`push_position`](Self::push_position) and left with
/// [`pop_position`](Self::pop_position), which restores the cursor saved by the matching push.
pub struct ResourceReader<'a> {
    data: &'a [u8],
    pos: usize,
    stack: Vec<usize>,
}

impl<'a> ResourceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self { Self { data, pos: 0, stack: Vec::new() } }

    /// Current absolute position.
    #[inline]
    pub fn bytes_read(&self) -> usize { self.pos }

    #[inline]
    pub fn len(&self) -> usize { self.data.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    #[inline]
    pub fn remaining(&self) -> usize { self.data.len().saturating_sub(self.pos) }

    /// Seeks to an absolute offset. Seeking exactly to the end is allowed.
    pub fn set_position(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::OutOfBounds { offset, len: self.data.len() });
        }
        self.pos = offset;
        Ok(())
    }

    pub fn advance(&mut self, n: usize) -> Result<()> {
        let offset = self.pos.checked_add(n).ok_or(Error::OutOfBounds {
            offset: usize::MAX,
            len: self.data.len(),
        })?;
        self.set_position(offset)
    }

    /// Saves the current position and jumps to `offset`.
    pub fn push_position(&mut self, offset: usize) -> Result<()> {
        let saved = self.pos;
        self.set_position(offset)?;
        self.stack.push(saved);
        Ok(())
    }

    /// Restores the most recently pushed position.
    ///
    /// Panics if there is no matching [`push_position`](Self::push_position).
    pub fn pop_position(&mut self) {
        match self.stack.pop() {
            Some(pos) => self.pos = pos,
            None => panic!("pop_position called with an empty position stack"),
        }
    }

    /// Reads a fixed-width big-endian integer.
    pub fn read<T>(&mut self) -> Result<T>
    where T: for<'b> BinRead<Args<'b> = ()> {
        self.read_record(size_of::<T>(), |r| T::read_options(r, Endian::Big, ()))
    }

    pub fn read_data(&mut self, length: usize) -> Result<Vec<u8>> {
        Ok(self.take(length)?.to_vec())
    }

    /// Reads a length-prefixed string (1 byte length, 0-255 bytes of text).
    pub fn read_pstring(&mut self) -> Result<String> {
        let offset = self.pos;
        let length = self.read::<u8>()? as usize;
        let bytes = self.take(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            Error::CorruptFile(format!("invalid string at offset {offset:#X}: {e}"))
        })
    }

    /// Parses a fixed-size record of `size` bytes at the current position with `f`.
    pub fn read_record<T, F>(&mut self, size: usize, f: F) -> Result<T>
    where F: FnOnce(&mut Cursor<&'a [u8]>) -> BinResult<T> {
        let offset = self.pos;
        let bytes = self.take(size)?;
        let mut cursor = Cursor::new(bytes);
        f(&mut cursor).map_err(|e| match Error::from(e) {
            // The record parser read past its declared size
            Error::TruncatedInput { .. } => {
                Error::TruncatedInput { offset, need: size + 1, have: size }
            }
            e => e,
        })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::TruncatedInput { offset: self.pos, need: n, have: self.remaining() });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

/// Append-only writer with support for backpatching already written bytes.
#[derive(Default)]
pub struct ResourceWriter {
    buf: Vec<u8>,
}

impl ResourceWriter {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(capacity: usize) -> Self { Self { buf: Vec::with_capacity(capacity) } }

    /// Current buffer length, which is always the write position.
    #[inline]
    pub fn bytes_written(&self) -> usize { self.buf.len() }

    /// Appends a fixed-width big-endian integer.
    pub fn write<T>(&mut self, value: T) -> Result<()>
    where T: for<'b> BinWrite<Args<'b> = ()> {
        self.write_record(|w| value.write_options(w, Endian::Big, ()))
    }

    /// Overwrites `size_of::<T>()` bytes at `offset`. Never extends the buffer.
    pub fn write_at<T>(&mut self, value: T, offset: usize) -> Result<()>
    where T: for<'b> BinWrite<Args<'b> = ()> {
        self.write_record_at(offset, |w| value.write_options(w, Endian::Big, ()))
    }

    /// Appends `n` zero bytes, reserving space for a later backpatch.
    pub fn advance(&mut self, n: usize) { self.buf.resize(self.buf.len() + n, 0); }

    pub fn write_data(&mut self, bytes: &[u8]) { self.buf.extend_from_slice(bytes); }

    pub fn write_data_at(&mut self, bytes: &[u8], offset: usize) -> Result<()> {
        match offset.checked_add(bytes.len()) {
            Some(end) if end <= self.buf.len() => {
                self.buf[offset..end].copy_from_slice(bytes);
                Ok(())
            }
            _ => Err(Error::OutOfBounds { offset, len: self.buf.len() }),
        }
    }

    /// Writes a length byte followed by the string's bytes.
    pub fn write_pstring(&mut self, s: &str) -> Result<()> {
        let length = u8::try_from(s.len()).map_err(|_| Error::ValueOverflow {
            what: "string length",
            value: s.len(),
            max: u8::MAX as usize,
        })?;
        self.write(length)?;
        self.write_data(s.as_bytes());
        Ok(())
    }

    /// Writes the string's bytes followed by a zero terminator.
    pub fn write_cstring(&mut self, s: &str) -> Result<()> {
        self.write_data(s.as_bytes());
        self.write(0u8)
    }

    /// Serializes a record with `f` and appends it.
    pub fn write_record<F>(&mut self, f: F) -> Result<()>
    where F: FnOnce(&mut Cursor<Vec<u8>>) -> BinResult<()> {
        let bytes = Self::encode_record(f)?;
        self.write_data(&bytes);
        Ok(())
    }

    /// Serializes a record with `f` and overwrites it at `offset`.
    pub fn write_record_at<F>(&mut self, offset: usize, f: F) -> Result<()>
    where F: FnOnce(&mut Cursor<Vec<u8>>) -> BinResult<()> {
        let bytes = Self::encode_record(f)?;
        self.write_data_at(&bytes, offset)
    }

    pub fn as_slice(&self) -> &[u8] { &self.buf }

    pub fn into_inner(self) -> Vec<u8> { self.buf }

    fn encode_record<F>(f: F) -> Result<Vec<u8>>
    where F: FnOnce(&mut Cursor<Vec<u8>>) -> BinResult<()> {
        let mut cursor = Cursor::new(Vec::new());
        f(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78, 0xFF, 0xFE];
        let mut reader = ResourceReader::new(&data);
        assert_eq!(reader.read::<u32>().unwrap(), 0x12345678);
        assert_eq!(reader.read::<i16>().unwrap(), -2);
        assert_eq!(reader.bytes_read(), 6);
        assert!(matches!(
            reader.read::<u8>(),
            Err(Error::TruncatedInput { offset: 6, need: 1, have: 0 })
        ));
    }

    #[test]
    fn truncated_read_does_not_move() {
        let data = [0u8; 3];
        let mut reader = ResourceReader::new(&data);
        reader.advance(1).unwrap();
        assert!(matches!(reader.read::<u32>(), Err(Error::TruncatedInput { .. })));
        assert_eq!(reader.bytes_read(), 1);
        assert!(matches!(reader.read_data(3), Err(Error::TruncatedInput { .. })));
        assert_eq!(reader.read_data(2).unwrap(), vec![0, 0]);
    }

    #[test]
    fn record_reading_past_its_size_is_truncated() {
        let data = [0u8; 8];
        let mut reader = ResourceReader::new(&data);
        reader.advance(2).unwrap();
        let result = reader.read_record(2, |r| u32::read_options(r, Endian::Big, ()));
        assert!(matches!(result, Err(Error::TruncatedInput { offset: 2, need: 3, have: 2 })));
    }

    #[test]
    fn seek_bounds() {
        let data = [0u8; 4];
        let mut reader = ResourceReader::new(&data);
        reader.set_position(4).unwrap();
        assert_eq!(reader.remaining(), 0);
        assert!(matches!(reader.set_position(5), Err(Error::OutOfBounds { offset: 5, len: 4 })));
        reader.set_position(2).unwrap();
        assert!(matches!(reader.advance(3), Err(Error::OutOfBounds { .. })));
        assert_eq!(reader.bytes_read(), 2);
    }

    #[test]
    fn position_stack_is_lifo() {
        let data = [0, 1, 2, 3, 4, 5, 6, 7];
        let mut reader = ResourceReader::new(&data);
        reader.advance(1).unwrap();
        reader.push_position(4).unwrap();
        reader.push_position(6).unwrap();
        assert_eq!(reader.read::<u8>().unwrap(), 6);
        reader.pop_position();
        assert_eq!(reader.read::<u8>().unwrap(), 4);
        reader.pop_position();
        assert_eq!(reader.bytes_read(), 1);
        assert!(reader.push_position(9).is_err());
        assert_eq!(reader.bytes_read(), 1);
    }

    #[test]
    #[should_panic]
    fn pop_without_push_panics() {
        let mut reader = ResourceReader::new(&[]);
        reader.pop_position();
    }

    #[test]
    fn pstrings() {
        let data = [4, b'S', b'h', b'i', b'p', 0, 3, b'a'];
        let mut reader = ResourceReader::new(&data);
        assert_eq!(reader.read_pstring().unwrap(), "Ship");
        assert_eq!(reader.read_pstring().unwrap(), "");
        assert!(matches!(reader.read_pstring(), Err(Error::TruncatedInput { .. })));

        let bad = [2, 0xC3, 0x28];
        assert!(matches!(ResourceReader::new(&bad).read_pstring(), Err(Error::CorruptFile(_))));
    }

    #[test]
    fn writer_backpatch() {
        let mut writer = ResourceWriter::new();
        writer.advance(4);
        writer.write(0xABCDu16).unwrap();
        writer.write(-1i8).unwrap();
        assert_eq!(writer.bytes_written(), 7);
        writer.write_at(0xDEADBEEFu32, 0).unwrap();
        assert_eq!(writer.as_slice(), &[0xDE, 0xAD, 0xBE, 0xEF, 0xAB, 0xCD, 0xFF]);
        assert!(matches!(writer.write_at(0u32, 4), Err(Error::OutOfBounds { offset: 4, len: 7 })));
        assert!(writer.write_data_at(&[1, 2, 3], 4).is_ok());
        assert_eq!(writer.bytes_written(), 7);
    }

    #[test]
    fn writer_strings() {
        let mut writer = ResourceWriter::new();
        writer.write_pstring("Ship").unwrap();
        writer.write_cstring("ok").unwrap();
        assert_eq!(writer.into_inner(), b"\x04Shipok\0");

        let long = "x".repeat(256);
        let mut writer = ResourceWriter::new();
        assert!(matches!(writer.write_pstring(&long), Err(Error::ValueOverflow { value: 256, .. })));
        assert_eq!(writer.bytes_written(), 0);
        writer.write_pstring(&long[..255]).unwrap();
        assert_eq!(writer.bytes_written(), 256);
    }
}
