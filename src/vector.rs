//! Fixed-count homogeneous sequences.

use crate::handler::{Lengths, SszHandler};
use crate::merkle::{merkleize_chunks, merkleize_packed_bytes, Hash256, Hasher, BYTES_PER_CHUNK};
use crate::reader::{DecodeError, SszReader};
use crate::registry::BuildError;
use crate::series;
use crate::value::{KindMismatch, Value};
use crate::writer::{EncodeError, SszWriter};
use crate::BYTES_PER_LENGTH_OFFSET;
use std::sync::Arc;

#[derive(Debug)]
pub struct VectorHandler {
    elem: Arc<SszHandler>,
    length: u64,
    lengths: Lengths,
}

impl VectorHandler {
    pub fn new(elem: Arc<SszHandler>, length: u64) -> Result<Self, BuildError> {
        if length == 0 {
            return Err(BuildError::UnsupportedLength(0));
        }
        let fuzz_min_len = elem.fuzz_min_len().saturating_mul(length);
        let fuzz_max_len = elem.fuzz_max_len().saturating_mul(length);
        let lengths = if elem.is_fixed() {
            let fixed_len = elem.fixed_len().saturating_mul(length);
            Lengths {
                is_fixed: true,
                fixed_len,
                min_len: fixed_len,
                max_len: fixed_len,
                fuzz_min_len,
                fuzz_max_len,
            }
        } else {
            Lengths {
                is_fixed: false,
                fixed_len: BYTES_PER_LENGTH_OFFSET,
                min_len: (BYTES_PER_LENGTH_OFFSET + elem.min_len()).saturating_mul(length),
                max_len: (BYTES_PER_LENGTH_OFFSET + elem.max_len()).saturating_mul(length),
                fuzz_min_len,
                fuzz_max_len,
            }
        };
        Ok(Self {
            elem,
            length,
            lengths,
        })
    }

    pub fn elem(&self) -> &SszHandler {
        &self.elem
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn lengths(&self) -> &Lengths {
        &self.lengths
    }

    pub fn default_value(&self) -> Value {
        let elements = (0..self.length).map(|_| self.elem.default_value()).collect();
        Value::Vector(elements)
    }

    fn elements<'v>(&self, value: &'v Value) -> Result<&'v [Value], KindMismatch> {
        let elements = value.as_vector()?;
        if elements.len() as u64 != self.length {
            return Err(KindMismatch::new("vector", "vector of a different length"));
        }
        Ok(elements)
    }

    pub fn size_of(&self, value: &Value) -> Result<u64, KindMismatch> {
        if self.lengths.is_fixed {
            self.elements(value)?;
            Ok(self.lengths.fixed_len)
        } else {
            series::var_series_size(&self.elem, self.elements(value)?)
        }
    }

    pub fn encode(&self, writer: &mut SszWriter<'_>, value: &Value) -> Result<(), EncodeError> {
        let elements = self.elements(value)?;
        if self.elem.is_fixed() {
            series::encode_fixed_series(&self.elem, elements, writer)
        } else {
            series::encode_var_series(&self.elem, elements, writer)
        }
    }

    pub fn decode(&self, reader: &mut SszReader<'_>, slot: &mut Value) -> Result<(), DecodeError> {
        let slots = match slot {
            Value::Vector(elements) if elements.len() as u64 == self.length => elements,
            other => {
                return Err(DecodeError::ValueMismatch(KindMismatch::new(
                    "vector",
                    other.kind_name(),
                )))
            }
        };
        if self.elem.is_fixed() {
            series::decode_fixed_series(&self.elem, reader, slots)
        } else if reader.is_fuzz_mode() {
            series::decode_series_fuzz(&self.elem, reader, slots)
        } else {
            let offsets = series::read_series_offsets(reader, self.length)?;
            series::decode_series_from_offsets(&self.elem, &offsets, reader, slots)
        }
    }

    pub fn dry_check(&self, reader: &mut SszReader<'_>) -> Result<(), DecodeError> {
        if self.elem.is_fixed() {
            series::dry_check_fixed_series(&self.elem, self.length, reader)
        } else {
            let offsets = series::read_series_offsets(reader, self.length)?;
            series::dry_check_series_from_offsets(&self.elem, &offsets, reader)
        }
    }

    pub fn hash_tree_root(
        &self,
        hasher: &mut dyn Hasher,
        value: &Value,
    ) -> Result<Hash256, KindMismatch> {
        let elements = self.elements(value)?;
        if let SszHandler::Basic(basic) = &*self.elem {
            let mut packed = Vec::with_capacity((basic.kind().width() * self.length) as usize);
            for element in elements {
                basic.append_wire_bytes(element, &mut packed)?;
            }
            let chunks = chunk_count(self.length, basic.kind().width());
            Ok(merkleize_packed_bytes(hasher, &packed, chunks))
        } else {
            let mut roots = Vec::with_capacity(elements.len());
            for element in elements {
                roots.push(self.elem.hash_tree_root(hasher, element)?.to_fixed_bytes());
            }
            Ok(merkleize_chunks(hasher, &roots, self.length))
        }
    }
}

/// How many 32-byte chunks `count` packed elements of `width` bytes occupy.
pub(crate) fn chunk_count(count: u64, width: u64) -> u64 {
    count
        .saturating_mul(width)
        .saturating_add(BYTES_PER_CHUNK as u64 - 1)
        / BYTES_PER_CHUNK as u64
}
