//! Variable-count homogeneous sequences.

use crate::handler::{Lengths, SszHandler};
use crate::merkle::{merkleize_chunks, merkleize_packed_bytes, Hash256, Hasher};
use crate::reader::{DecodeError, SszReader};
use crate::registry::BuildError;
use crate::series;
use crate::value::{reuse_sequence_storage, KindMismatch, Value};
use crate::vector::chunk_count;
use crate::writer::{EncodeError, SszWriter};
use crate::BYTES_PER_LENGTH_OFFSET;
use std::sync::Arc;

#[derive(Debug)]
pub struct ListHandler {
    elem: Arc<SszHandler>,
    limit: u64,
    lengths: Lengths,
}

impl ListHandler {
    pub fn new(elem: Arc<SszHandler>, limit: u64) -> Result<Self, BuildError> {
        if elem.is_fixed() && elem.fixed_len() == 0 {
            // The element count of a fixed-size-element list is inferred by
            // division; zero-length elements make that impossible.
            return Err(BuildError::ZeroLengthItem);
        }
        let per_elem = if elem.is_fixed() {
            elem.fixed_len()
        } else {
            BYTES_PER_LENGTH_OFFSET.saturating_add(elem.max_len())
        };
        let lengths = Lengths {
            is_fixed: false,
            fixed_len: BYTES_PER_LENGTH_OFFSET,
            min_len: 0,
            max_len: per_elem.saturating_mul(limit),
            fuzz_min_len: BYTES_PER_LENGTH_OFFSET,
            fuzz_max_len: BYTES_PER_LENGTH_OFFSET
                .saturating_add(elem.fuzz_max_len().saturating_mul(limit)),
        };
        Ok(Self {
            elem,
            limit,
            lengths,
        })
    }

    pub fn elem(&self) -> &SszHandler {
        &self.elem
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn lengths(&self) -> &Lengths {
        &self.lengths
    }

    pub fn default_value(&self) -> Value {
        Value::List(Vec::new())
    }

    pub fn size_of(&self, value: &Value) -> Result<u64, KindMismatch> {
        let elements = value.as_list()?;
        if self.elem.is_fixed() {
            Ok(self.elem.fixed_len().saturating_mul(elements.len() as u64))
        } else {
            series::var_series_size(&self.elem, elements)
        }
    }

    pub fn encode(&self, writer: &mut SszWriter<'_>, value: &Value) -> Result<(), EncodeError> {
        let elements = value.as_list().map_err(EncodeError::from)?;
        if let SszHandler::Basic(basic) = &*self.elem {
            // Basic elements lay out exactly as their packed little-endian
            // bytes; write them in one pass.
            let mut packed = Vec::with_capacity((basic.kind().width() as usize) * elements.len());
            for element in elements {
                basic.append_wire_bytes(element, &mut packed)?;
            }
            writer.write(&packed);
            Ok(())
        } else if self.elem.is_fixed() {
            series::encode_fixed_series(&self.elem, elements, writer)
        } else {
            series::encode_var_series(&self.elem, elements, writer)
        }
    }

    pub fn decode(&self, reader: &mut SszReader<'_>, slot: &mut Value) -> Result<(), DecodeError> {
        let elements = match slot {
            Value::List(elements) => elements,
            other => {
                return Err(DecodeError::ValueMismatch(KindMismatch::new(
                    "list",
                    other.kind_name(),
                )))
            }
        };

        if reader.is_fuzz_mode() {
            return self.decode_fuzz(reader, elements);
        }

        if let SszHandler::Basic(basic) = &*self.elem {
            let length = self.fixed_elem_count(reader.bytes_span())?;
            let width = basic.kind().width() as usize;

            let mut packed = vec![0u8; (length as usize) * width];
            reader.read_bytes(&mut packed)?;

            reuse_sequence_storage(elements, length as usize, || basic.default_value());
            for (element, window) in elements.iter_mut().zip(packed.chunks_exact(width)) {
                *element = basic.value_from_wire_bytes(window)?;
            }
            Ok(())
        } else if self.elem.is_fixed() {
            let length = self.fixed_elem_count(reader.bytes_span())?;
            reuse_sequence_storage(elements, length as usize, || self.elem.default_value());
            series::decode_fixed_series(&self.elem, reader, elements)
        } else {
            let offsets = series::read_slice_offsets(reader, self.elem.min_len(), self.limit)?;
            reuse_sequence_storage(elements, offsets.len(), || self.elem.default_value());
            series::decode_series_from_offsets(&self.elem, &offsets, reader, elements)
        }
    }

    /// Infers the element count of a fixed-size-element list from the scope.
    fn fixed_elem_count(&self, span: u64) -> Result<u64, DecodeError> {
        let elem_len = self.elem.fixed_len();
        if span % elem_len != 0 {
            return Err(DecodeError::LengthMismatch {
                len: span,
                elem_len,
            });
        }
        let length = span / elem_len;
        if length > self.limit {
            return Err(DecodeError::LimitExceeded {
                len: length,
                limit: self.limit,
            });
        }
        Ok(length)
    }

    fn decode_fuzz(
        &self,
        reader: &mut SszReader<'_>,
        elements: &mut Vec<Value>,
    ) -> Result<(), DecodeError> {
        // No offsets in relaxed mode: a raw length is read and clamped to
        // whatever the remaining span can cover.
        let raw = u64::from(reader.read_u32()?);
        let span_budget = reader.bytes_span() / self.elem.fuzz_min_len().max(1);
        let bound = self.limit.min(span_budget);
        let length = if bound == u64::MAX {
            raw
        } else {
            raw % (bound + 1)
        };

        reuse_sequence_storage(elements, length as usize, || self.elem.default_value());
        series::decode_series_fuzz(&self.elem, reader, elements)
    }

    pub fn dry_check(&self, reader: &mut SszReader<'_>) -> Result<(), DecodeError> {
        if let SszHandler::Basic(basic) = &*self.elem {
            let length = self.fixed_elem_count(reader.bytes_span())?;
            let mut packed = vec![0u8; (length * basic.kind().width()) as usize];
            reader.read_bytes(&mut packed)?;
            for window in packed.chunks_exact(basic.kind().width() as usize) {
                basic.value_from_wire_bytes(window)?;
            }
            Ok(())
        } else if self.elem.is_fixed() {
            let length = self.fixed_elem_count(reader.bytes_span())?;
            series::dry_check_fixed_series(&self.elem, length, reader)
        } else {
            let offsets = series::read_slice_offsets(reader, self.elem.min_len(), self.limit)?;
            series::dry_check_series_from_offsets(&self.elem, &offsets, reader)
        }
    }

    pub fn hash_tree_root(
        &self,
        hasher: &mut dyn Hasher,
        value: &Value,
    ) -> Result<Hash256, KindMismatch> {
        let elements = value.as_list()?;
        if let SszHandler::Basic(basic) = &*self.elem {
            let width = basic.kind().width();
            let mut packed = Vec::with_capacity((width as usize) * elements.len());
            for element in elements {
                basic.append_wire_bytes(element, &mut packed)?;
            }
            let padded = chunk_count(self.limit, width);
            Ok(merkleize_packed_bytes(hasher, &packed, padded))
        } else {
            let mut roots = Vec::with_capacity(elements.len());
            for element in elements {
                roots.push(self.elem.hash_tree_root(hasher, element)?.to_fixed_bytes());
            }
            Ok(merkleize_chunks(hasher, &roots, self.limit))
        }
    }
}
