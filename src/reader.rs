//! Byte-budget-scoped decoding input.

use crate::value::KindMismatch;
use crate::BYTES_PER_LENGTH_OFFSET;
use std::io::{self, Read, Seek, SeekFrom};

/// Returned when SSZ decoding fails.
#[derive(Debug, PartialEq, Clone)]
pub enum DecodeError {
    /// A read of `requested` bytes would overrun the current scope, or a
    /// child scope was requested that is larger than the remaining span.
    ScopeViolation { requested: u64, span: u64 },
    /// The source ended before the requested bytes could be produced.
    ShortRead,
    /// The injected source failed.
    Io(String),
    /// A boolean byte was not `0x00` or `0x01`.
    InvalidBool(u8),
    /// The first offset of a variable-size series is not divisible by
    /// `BYTES_PER_LENGTH_OFFSET`, or is inconsistent with the element count
    /// or the enclosing scope.
    InvalidFirstOffset(u64),
    /// An offset points to bytes prior to the previous offset.
    OffsetsAreDecreasing(u64),
    /// The reader was not at the recorded offset when a variable-size
    /// element or field began.
    OffsetMismatch { expected: u64, actual: u64 },
    /// A fixed region or scope had a different size than its structure
    /// requires.
    InvalidByteLength { len: u64, expected: u64 },
    /// A list decoded to more elements than its declared limit.
    LimitExceeded { len: u64, limit: u64 },
    /// The scope of a fixed-size-element list is not a multiple of the
    /// element size.
    LengthMismatch { len: u64, elem_len: u64 },
    /// Relaxed-mode decoding ran out of bytes for the declared minimums.
    Underbudget { span: u64, required: u64 },
    /// The destination value does not match the handler tree.
    ValueMismatch(KindMismatch),
}

impl From<KindMismatch> for DecodeError {
    fn from(mismatch: KindMismatch) -> Self {
        DecodeError::ValueMismatch(mismatch)
    }
}

/// A byte source for the decoding reader.
///
/// Sources are injected; the reader performs all scope accounting and only
/// asks the source to produce or discard bytes.
pub trait Source {
    /// Fills `buf` completely, or fails.
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), DecodeError>;

    /// Discards `count` bytes.
    fn skip(&mut self, count: u64) -> Result<(), DecodeError> {
        let mut scratch = [0u8; 64];
        let mut remaining = count;
        while remaining > 0 {
            let step = remaining.min(scratch.len() as u64) as usize;
            self.fill(&mut scratch[..step])?;
            remaining -= step as u64;
        }
        Ok(())
    }
}

/// A source over an in-memory byte slice.
pub struct SliceSource<'a> {
    bytes: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl<'a> Source for SliceSource<'a> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        if self.bytes.len() < buf.len() {
            return Err(DecodeError::ShortRead);
        }
        let (head, tail) = self.bytes.split_at(buf.len());
        buf.copy_from_slice(head);
        self.bytes = tail;
        Ok(())
    }

    fn skip(&mut self, count: u64) -> Result<(), DecodeError> {
        if (self.bytes.len() as u64) < count {
            return Err(DecodeError::ShortRead);
        }
        self.bytes = &self.bytes[count as usize..];
        Ok(())
    }
}

/// A source over any `std::io::Read`.
pub struct IoSource<R> {
    inner: R,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

fn map_io_error(e: io::Error) -> DecodeError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        DecodeError::ShortRead
    } else {
        DecodeError::Io(e.to_string())
    }
}

impl<R: Read> Source for IoSource<R> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        self.inner.read_exact(buf).map_err(map_io_error)
    }
}

/// A source over a seekable reader; skips without draining bytes.
pub struct SeekSource<R> {
    inner: R,
}

impl<R: Read + Seek> SeekSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read + Seek> Source for SeekSource<R> {
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        self.inner.read_exact(buf).map_err(map_io_error)
    }

    fn skip(&mut self, count: u64) -> Result<(), DecodeError> {
        self.inner
            .seek(SeekFrom::Current(count as i64))
            .map_err(map_io_error)?;
        Ok(())
    }
}

/// A decoding reader constrained to a byte budget.
///
/// The reader tracks `index` (bytes consumed within this scope) and `max`
/// (the scope's capacity); a top-level reader is unbounded. Child scopes
/// share the parent's underlying source; after a child completes, the parent
/// advances by the child's consumption via [`SszReader::update_index`]. On
/// child failure the parent's index is left untouched.
pub struct SszReader<'a> {
    source: &'a mut dyn Source,
    index: u64,
    max: u64,
    fuzz_mode: bool,
    scratch: [u8; 8],
}

impl<'a> SszReader<'a> {
    pub fn new(source: &'a mut dyn Source) -> Self {
        Self {
            source,
            index: 0,
            max: u64::MAX,
            fuzz_mode: false,
            scratch: [0; 8],
        }
    }

    /// Carves a child scope of `count` bytes out of this reader.
    pub fn scope(&mut self, count: u64) -> Result<SszReader<'_>, DecodeError> {
        let span = self.bytes_span();
        if span < count {
            return Err(DecodeError::ScopeViolation {
                requested: count,
                span,
            });
        }
        Ok(SszReader {
            source: &mut *self.source,
            index: 0,
            max: count,
            fuzz_mode: false,
            scratch: [0; 8],
        })
    }

    /// Advances this reader's index by a completed child scope's consumption.
    pub fn update_index(&mut self, consumed: u64) {
        self.index += consumed;
    }

    /// How far we have read so far (scoped per composite).
    pub fn index(&self) -> u64 {
        self.index
    }

    /// How far we can read. When a child element is not fixed-length, the
    /// parent sets the scope so the child can infer its size from it.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// The remaining span that can be read without error.
    pub fn bytes_span(&self) -> u64 {
        self.max - self.index
    }

    /// Latches relaxed decoding for this scope: offsets are not used, and
    /// lengths are read from the input and adjusted to the remaining space.
    pub fn enable_fuzz_mode(&mut self) {
        self.fuzz_mode = true;
    }

    pub fn is_fuzz_mode(&self) -> bool {
        self.fuzz_mode
    }

    fn checked_index_update(&mut self, count: u64) -> Result<(), DecodeError> {
        let next = self.index.checked_add(count).unwrap_or(u64::MAX);
        if next > self.max {
            return Err(DecodeError::ScopeViolation {
                requested: count,
                span: self.bytes_span(),
            });
        }
        self.index = next;
        Ok(())
    }

    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        self.checked_index_update(buf.len() as u64)?;
        self.source.fill(buf)
    }

    /// Advances the index without yielding bytes.
    pub fn skip(&mut self, count: u64) -> Result<(), DecodeError> {
        self.checked_index_update(count)?;
        self.source.skip(count)
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        self.checked_index_update(1)?;
        let mut byte = [0u8; 1];
        self.source.fill(&mut byte)?;
        Ok(byte[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.checked_index_update(2)?;
        self.source.fill(&mut self.scratch[0..2])?;
        let mut bytes = [0u8; 2];
        bytes.copy_from_slice(&self.scratch[0..2]);
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.checked_index_update(4)?;
        self.source.fill(&mut self.scratch[0..4])?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.scratch[0..4]);
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.checked_index_update(8)?;
        self.source.fill(&mut self.scratch)?;
        Ok(u64::from_le_bytes(self.scratch))
    }

    /// Reads an offset, widening it to a `u64` for safe arithmetic.
    pub fn read_offset(&mut self) -> Result<u64, DecodeError> {
        debug_assert_eq!(BYTES_PER_LENGTH_OFFSET, 4);
        Ok(u64::from(self.read_u32()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_reads() {
        let bytes = [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, 0xaa];
        let mut source = SliceSource::new(&bytes);
        let mut reader = SszReader::new(&mut source);

        assert_eq!(reader.read_u64().unwrap(), 0x0102030405060708);
        assert_eq!(reader.read_byte().unwrap(), 0xaa);
        assert_eq!(reader.index(), 9);
    }

    #[test]
    fn scope_is_enforced() {
        let bytes = [0u8; 4];
        let mut source = SliceSource::new(&bytes);
        let mut reader = SszReader::new(&mut source);

        let mut scoped = reader.scope(2).unwrap();
        assert_eq!(scoped.bytes_span(), 2);
        scoped.read_u16().unwrap();
        assert_eq!(
            scoped.read_byte(),
            Err(DecodeError::ScopeViolation {
                requested: 1,
                span: 0
            })
        );
    }

    #[test]
    fn child_scope_larger_than_parent_span_fails() {
        let bytes = [0u8; 4];
        let mut source = SliceSource::new(&bytes);
        let mut reader = SszReader::new(&mut source);
        let mut outer = reader.scope(3).unwrap();

        assert_eq!(
            outer.scope(4).err(),
            Some(DecodeError::ScopeViolation {
                requested: 4,
                span: 3
            })
        );
    }

    #[test]
    fn parent_index_advances_from_child() {
        let bytes = [1, 0, 0, 0, 2, 0, 0, 0];
        let mut source = SliceSource::new(&bytes);
        let mut reader = SszReader::new(&mut source);

        let consumed = {
            let mut child = reader.scope(4).unwrap();
            child.read_u32().unwrap();
            child.index()
        };
        reader.update_index(consumed);

        assert_eq!(reader.index(), 4);
        assert_eq!(reader.read_u32().unwrap(), 2);
    }

    #[test]
    fn skip_advances_index() {
        let bytes = [0u8; 10];
        let mut source = SliceSource::new(&bytes);
        let mut reader = SszReader::new(&mut source);

        reader.skip(6).unwrap();
        assert_eq!(reader.index(), 6);
        assert_eq!(reader.read_u32().unwrap(), 0);
    }

    #[test]
    fn short_input_is_a_short_read() {
        let bytes = [1, 2];
        let mut source = SliceSource::new(&bytes);
        let mut reader = SszReader::new(&mut source);

        assert_eq!(reader.read_u32(), Err(DecodeError::ShortRead));
    }

    #[test]
    fn fuzz_mode_latches_per_scope() {
        let bytes = [0u8; 8];
        let mut source = SliceSource::new(&bytes);
        let mut reader = SszReader::new(&mut source);

        let mut child = reader.scope(4).unwrap();
        assert!(!child.is_fuzz_mode());
        child.enable_fuzz_mode();
        assert!(child.is_fuzz_mode());
        drop(child);

        assert!(!reader.is_fuzz_mode());
    }
}
