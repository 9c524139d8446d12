//! Shared encode/decode helpers for homogeneous series.
//!
//! A variable-size-element series is laid out as an offset table of `u32`
//! positions (relative to the series start) followed by the payloads in
//! order. Offsets must be non-decreasing and the first must land exactly
//! behind the table.

use crate::handler::SszHandler;
use crate::reader::{DecodeError, SszReader};
use crate::value::{KindMismatch, Value};
use crate::writer::{EncodeError, SszWriter};
use crate::BYTES_PER_LENGTH_OFFSET;
use smallvec::SmallVec;

pub(crate) type OffsetVec = SmallVec<[u64; 8]>;

pub(crate) fn encode_fixed_series(
    elem: &SszHandler,
    values: &[Value],
    writer: &mut SszWriter<'_>,
) -> Result<(), EncodeError> {
    for value in values {
        elem.encode(writer, value)?;
    }
    Ok(())
}

pub(crate) fn encode_var_series(
    elem: &SszHandler,
    values: &[Value],
    writer: &mut SszWriter<'_>,
) -> Result<(), EncodeError> {
    // The previous offset to calculate a new offset from, starting after the
    // offset table.
    let mut prev_offset = BYTES_PER_LENGTH_OFFSET * values.len() as u64;
    let mut prev_size = 0u64;

    for value in values {
        prev_offset += prev_size;
        writer.write_u32(prev_offset as u32);
        prev_size = elem.size_of(value)?;
    }

    for value in values {
        elem.encode(writer, value)?;
    }
    Ok(())
}

pub(crate) fn var_series_size(elem: &SszHandler, values: &[Value]) -> Result<u64, KindMismatch> {
    let mut size = BYTES_PER_LENGTH_OFFSET * values.len() as u64;
    for value in values {
        size += elem.size_of(value)?;
    }
    Ok(size)
}

/// Reads the offset table of a known-length series, verifying the first
/// offset implies exactly `length` elements.
pub(crate) fn read_series_offsets(
    reader: &mut SszReader<'_>,
    length: u64,
) -> Result<OffsetVec, DecodeError> {
    if length == 0 {
        return Ok(OffsetVec::new());
    }

    let first_offset = reader.read_offset()?;
    if first_offset / BYTES_PER_LENGTH_OFFSET != length {
        return Err(DecodeError::InvalidFirstOffset(first_offset));
    }

    let mut offsets = OffsetVec::with_capacity(length as usize);
    offsets.push(first_offset);
    for _ in 1..length {
        offsets.push(reader.read_offset()?);
    }
    Ok(offsets)
}

/// Reads the offset table of a limit-bounded series, deriving the element
/// count from the first offset.
pub(crate) fn read_slice_offsets(
    reader: &mut SszReader<'_>,
    min_elem_len: u64,
    limit: u64,
) -> Result<OffsetVec, DecodeError> {
    let bytes_len = reader.bytes_span();
    if bytes_len == 0 {
        return Ok(OffsetVec::new());
    }
    debug_assert_eq!(reader.index(), 0);

    let first_offset = reader.read_offset()?;
    if first_offset > bytes_len || first_offset % BYTES_PER_LENGTH_OFFSET != 0 {
        return Err(DecodeError::InvalidFirstOffset(first_offset));
    }

    let length = first_offset / BYTES_PER_LENGTH_OFFSET;
    if length > limit {
        return Err(DecodeError::LimitExceeded { len: length, limit });
    }

    let required = min_elem_len.saturating_mul(length);
    if required > reader.max() {
        return Err(DecodeError::ScopeViolation {
            requested: required,
            span: reader.max(),
        });
    }

    let mut offsets = OffsetVec::with_capacity(length as usize);
    offsets.push(first_offset);
    for _ in 1..length {
        offsets.push(reader.read_offset()?);
    }

    let expected = BYTES_PER_LENGTH_OFFSET * length;
    if reader.index() != expected {
        return Err(DecodeError::InvalidByteLength {
            len: reader.index(),
            expected,
        });
    }
    Ok(offsets)
}

/// The byte budget of element `i`: up to the next offset, or to the end of
/// the scope for the last element.
pub(crate) fn elem_scope(offsets: &[u64], i: usize, max: u64) -> Result<u64, DecodeError> {
    let current = offsets[i];
    match offsets.get(i + 1) {
        Some(&next) if next >= current => Ok(next - current),
        Some(&next) => Err(DecodeError::OffsetsAreDecreasing(next)),
        None => max.checked_sub(current).ok_or(DecodeError::ScopeViolation {
            requested: current,
            span: max,
        }),
    }
}

/// Decodes one element inside its own scope, verifying it starts exactly at
/// the recorded offset.
pub(crate) fn decode_offset_elem(
    elem: &SszHandler,
    reader: &mut SszReader<'_>,
    expected_offset: u64,
    scope: u64,
    slot: &mut Value,
) -> Result<(), DecodeError> {
    let actual = reader.index();
    if actual != expected_offset {
        return Err(DecodeError::OffsetMismatch {
            expected: expected_offset,
            actual,
        });
    }
    let mut scoped = reader.scope(scope)?;
    elem.decode(&mut scoped, slot)?;
    let consumed = scoped.index();
    reader.update_index(consumed);
    Ok(())
}

pub(crate) fn decode_series_from_offsets(
    elem: &SszHandler,
    offsets: &[u64],
    reader: &mut SszReader<'_>,
    slots: &mut [Value],
) -> Result<(), DecodeError> {
    debug_assert_eq!(offsets.len(), slots.len());
    for (i, slot) in slots.iter_mut().enumerate() {
        let scope = elem_scope(offsets, i, reader.max())?;
        decode_offset_elem(elem, reader, offsets[i], scope, slot)?;
    }
    if reader.index() != reader.max() {
        return Err(DecodeError::InvalidByteLength {
            len: reader.index(),
            expected: reader.max(),
        });
    }
    Ok(())
}

pub(crate) fn dry_check_series_from_offsets(
    elem: &SszHandler,
    offsets: &[u64],
    reader: &mut SszReader<'_>,
) -> Result<(), DecodeError> {
    for i in 0..offsets.len() {
        let actual = reader.index();
        if actual != offsets[i] {
            return Err(DecodeError::OffsetMismatch {
                expected: offsets[i],
                actual,
            });
        }
        let scope = elem_scope(offsets, i, reader.max())?;
        let mut scoped = reader.scope(scope)?;
        elem.dry_check(&mut scoped)?;
        let consumed = scoped.index();
        reader.update_index(consumed);
    }
    if reader.index() != reader.max() {
        return Err(DecodeError::InvalidByteLength {
            len: reader.index(),
            expected: reader.max(),
        });
    }
    Ok(())
}

pub(crate) fn decode_fixed_series(
    elem: &SszHandler,
    reader: &mut SszReader<'_>,
    slots: &mut [Value],
) -> Result<(), DecodeError> {
    for slot in slots {
        elem.decode(reader, slot)?;
    }
    Ok(())
}

pub(crate) fn dry_check_fixed_series(
    elem: &SszHandler,
    length: u64,
    reader: &mut SszReader<'_>,
) -> Result<(), DecodeError> {
    for _ in 0..length {
        elem.dry_check(reader)?;
    }
    Ok(())
}

/// Relaxed-mode decode: no offsets; each element is scoped to whatever the
/// span allows after reserving the fuzz minimum of the elements behind it.
pub(crate) fn decode_series_fuzz(
    elem: &SszHandler,
    reader: &mut SszReader<'_>,
    slots: &mut [Value],
) -> Result<(), DecodeError> {
    let elem_fuzz_min = elem.fuzz_min_len();
    let mut left_over = elem_fuzz_min.saturating_mul(slots.len() as u64);

    for slot in slots {
        left_over -= elem_fuzz_min;
        let span = reader.bytes_span();
        if span < left_over {
            return Err(DecodeError::Underbudget {
                span,
                required: left_over,
            });
        }
        let available = span - left_over;

        let mut scoped = reader.scope(available)?;
        scoped.enable_fuzz_mode();
        elem.decode(&mut scoped, slot)?;
        let consumed = scoped.index();
        reader.update_index(consumed);
    }
    Ok(())
}
