//! The handler tree and its common capability surface.

use crate::basic::BasicHandler;
use crate::container::ContainerHandler;
use crate::list::ListHandler;
use crate::merkle::{Hash256, Hasher};
use crate::pointer::PointerHandler;
use crate::reader::{DecodeError, SliceSource, SszReader};
use crate::registry::{self, BuildError};
use crate::schema::Schema;
use crate::value::{KindMismatch, Value};
use crate::vector::VectorHandler;
use crate::writer::{self, EncodeError, SszWriter};
use std::io::Write;

/// Derived length scalars, computed once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lengths {
    pub is_fixed: bool,
    /// The wire length for fixed kinds; the contribution to a parent's
    /// fixed region (one offset) for variable kinds.
    pub fixed_len: u64,
    pub min_len: u64,
    pub max_len: u64,
    pub fuzz_min_len: u64,
    pub fuzz_max_len: u64,
}

impl Lengths {
    /// Lengths of a fixed kind: every scalar equals the wire width.
    pub fn fixed(len: u64) -> Self {
        Self {
            is_fixed: true,
            fixed_len: len,
            min_len: len,
            max_len: len,
            fuzz_min_len: len,
            fuzz_max_len: len,
        }
    }
}

/// An immutable SSZ handler, dispatched by kind.
///
/// Handler trees are constructed once per schema, hold no per-value state
/// and may be shared freely across concurrent operations.
#[derive(Debug)]
pub enum SszHandler {
    Basic(BasicHandler),
    Vector(VectorHandler),
    List(ListHandler),
    Container(ContainerHandler),
    Pointer(PointerHandler),
}

impl SszHandler {
    /// Builds a handler tree for a schema without going through a registry.
    pub fn from_schema(schema: &Schema) -> Result<Self, BuildError> {
        registry::build_handler(schema)
    }

    pub fn lengths(&self) -> &Lengths {
        match self {
            SszHandler::Basic(h) => h.lengths(),
            SszHandler::Vector(h) => h.lengths(),
            SszHandler::List(h) => h.lengths(),
            SszHandler::Container(h) => h.lengths(),
            SszHandler::Pointer(h) => h.lengths(),
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.lengths().is_fixed
    }

    pub fn fixed_len(&self) -> u64 {
        self.lengths().fixed_len
    }

    pub fn min_len(&self) -> u64 {
        self.lengths().min_len
    }

    pub fn max_len(&self) -> u64 {
        self.lengths().max_len
    }

    pub fn fuzz_min_len(&self) -> u64 {
        self.lengths().fuzz_min_len
    }

    pub fn fuzz_max_len(&self) -> u64 {
        self.lengths().fuzz_max_len
    }

    /// A zeroed value of this handler's kind.
    pub fn default_value(&self) -> Value {
        match self {
            SszHandler::Basic(h) => h.default_value(),
            SszHandler::Vector(h) => h.default_value(),
            SszHandler::List(h) => h.default_value(),
            SszHandler::Container(h) => h.default_value(),
            SszHandler::Pointer(h) => h.default_value(),
        }
    }

    /// The wire size of `value`.
    pub fn size_of(&self, value: &Value) -> Result<u64, KindMismatch> {
        match self {
            SszHandler::Basic(h) => h.size_of(value),
            SszHandler::Vector(h) => h.size_of(value),
            SszHandler::List(h) => h.size_of(value),
            SszHandler::Container(h) => h.size_of(value),
            SszHandler::Pointer(h) => h.size_of(value),
        }
    }

    pub fn encode(&self, writer: &mut SszWriter<'_>, value: &Value) -> Result<(), EncodeError> {
        match self {
            SszHandler::Basic(h) => h.encode(writer, value),
            SszHandler::Vector(h) => h.encode(writer, value),
            SszHandler::List(h) => h.encode(writer, value),
            SszHandler::Container(h) => h.encode(writer, value),
            SszHandler::Pointer(h) => h.encode(writer, value),
        }
    }

    pub fn decode(&self, reader: &mut SszReader<'_>, slot: &mut Value) -> Result<(), DecodeError> {
        match self {
            SszHandler::Basic(h) => h.decode(reader, slot),
            SszHandler::Vector(h) => h.decode(reader, slot),
            SszHandler::List(h) => h.decode(reader, slot),
            SszHandler::Container(h) => h.decode(reader, slot),
            SszHandler::Pointer(h) => h.decode(reader, slot),
        }
    }

    /// Validates a wire form without materializing values.
    pub fn dry_check(&self, reader: &mut SszReader<'_>) -> Result<(), DecodeError> {
        match self {
            SszHandler::Basic(h) => h.dry_check(reader),
            SszHandler::Vector(h) => h.dry_check(reader),
            SszHandler::List(h) => h.dry_check(reader),
            SszHandler::Container(h) => h.dry_check(reader),
            SszHandler::Pointer(h) => h.dry_check(reader),
        }
    }

    pub fn hash_tree_root(
        &self,
        hasher: &mut dyn Hasher,
        value: &Value,
    ) -> Result<Hash256, KindMismatch> {
        match self {
            SszHandler::Basic(h) => h.hash_tree_root(value),
            SszHandler::Vector(h) => h.hash_tree_root(hasher, value),
            SszHandler::List(h) => h.hash_tree_root(hasher, value),
            SszHandler::Container(h) => h.hash_tree_root(hasher, value),
            SszHandler::Pointer(h) => h.hash_tree_root(hasher, value),
        }
    }

    /// The hash tree root with the container's last field excluded.
    ///
    /// Defined for containers (and pointers to them) only.
    pub fn signing_root(
        &self,
        hasher: &mut dyn Hasher,
        value: &Value,
    ) -> Result<Hash256, KindMismatch> {
        match self {
            SszHandler::Container(h) => h.signing_root(hasher, value),
            SszHandler::Pointer(h) => h.inner().signing_root(hasher, value.as_pointer()?),
            other => Err(KindMismatch::new("container", other.kind_name())),
        }
    }

    /// The flat field list when this handler can be squashed into a parent.
    pub fn squash_fields(&self) -> Option<&[crate::container::ContainerField]> {
        match self {
            SszHandler::Container(h) => Some(h.squash_fields()),
            _ => None,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            SszHandler::Basic(_) => "basic",
            SszHandler::Vector(_) => "vector",
            SszHandler::List(_) => "list",
            SszHandler::Container(_) => "container",
            SszHandler::Pointer(_) => "pointer",
        }
    }

    /// Whether `value` is shaped like this handler tree, recursively.
    fn conforms(&self, value: &Value) -> bool {
        match (self, value) {
            (SszHandler::Basic(h), _) => h.matches_kind(value),
            (SszHandler::Vector(h), Value::Vector(elements)) => {
                elements.len() as u64 == h.length()
                    && elements.iter().all(|e| h.elem().conforms(e))
            }
            (SszHandler::List(h), Value::List(elements)) => {
                elements.iter().all(|e| h.elem().conforms(e))
            }
            (SszHandler::Container(h), Value::Container(members)) => {
                members.len() == h.members().len()
                    && h.members()
                        .iter()
                        .zip(members)
                        .all(|(m, v)| m.handler.conforms(v))
            }
            (SszHandler::Pointer(h), Value::Pointer(inner)) => h.inner().conforms(inner),
            _ => false,
        }
    }

    /// Resets `slot` to this handler's default unless it already conforms,
    /// so decoding can reuse the caller's storage.
    fn ensure_slot(&self, slot: &mut Value) {
        if !self.conforms(slot) {
            *slot = self.default_value();
        }
    }

    /// Encodes `value` into a fresh byte vector.
    pub fn as_ssz_bytes(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let size = self.size_of(value)?;
        let mut buf = Vec::with_capacity(size as usize);
        let mut writer = SszWriter::new(&mut buf);
        self.encode(&mut writer, value)?;
        drop(writer);
        Ok(buf)
    }

    /// Encodes `value` into an injected sink, returning the byte count.
    pub fn write_to(&self, value: &Value, sink: &mut dyn Write) -> Result<u64, EncodeError> {
        let bytes = self.as_ssz_bytes(value)?;
        writer::write_all(sink, &bytes)?;
        Ok(bytes.len() as u64)
    }

    /// Decodes a value from its exact wire bytes.
    pub fn from_ssz_bytes(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        let mut value = self.default_value();
        self.decode_into(bytes, &mut value)?;
        Ok(value)
    }

    /// Decodes into an existing value, reusing its storage where capacity
    /// allows. On failure the value must be treated as poisoned.
    pub fn decode_into(&self, bytes: &[u8], slot: &mut Value) -> Result<(), DecodeError> {
        self.ensure_slot(slot);
        let len = bytes.len() as u64;
        if self.is_fixed() && len != self.fixed_len() {
            return Err(DecodeError::InvalidByteLength {
                len,
                expected: self.fixed_len(),
            });
        }

        let mut source = SliceSource::new(bytes);
        let mut reader = SszReader::new(&mut source);
        let mut scoped = reader.scope(len)?;
        self.decode(&mut scoped, slot)?;
        let consumed = scoped.index();
        if consumed != len {
            return Err(DecodeError::InvalidByteLength {
                len: consumed,
                expected: len,
            });
        }
        Ok(())
    }

    /// Decodes adversarial input in relaxed mode: offsets are ignored and
    /// lengths are derived from the input, adjusted to the remaining space.
    pub fn decode_relaxed(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        let len = bytes.len() as u64;
        if len < self.fuzz_min_len() {
            return Err(DecodeError::Underbudget {
                span: len,
                required: self.fuzz_min_len(),
            });
        }

        let mut value = self.default_value();
        let mut source = SliceSource::new(bytes);
        let mut reader = SszReader::new(&mut source);
        let mut scoped = reader.scope(len)?;
        scoped.enable_fuzz_mode();
        self.decode(&mut scoped, &mut value)?;
        Ok(value)
    }

    /// Validates that `bytes` is a well-formed wire form of this kind.
    pub fn dry_check_bytes(&self, bytes: &[u8]) -> Result<(), DecodeError> {
        let len = bytes.len() as u64;
        if self.is_fixed() && len != self.fixed_len() {
            return Err(DecodeError::InvalidByteLength {
                len,
                expected: self.fixed_len(),
            });
        }

        let mut source = SliceSource::new(bytes);
        let mut reader = SszReader::new(&mut source);
        let mut scoped = reader.scope(len)?;
        self.dry_check(&mut scoped)?;
        let consumed = scoped.index();
        if consumed != len {
            return Err(DecodeError::InvalidByteLength {
                len: consumed,
                expected: len,
            });
        }
        Ok(())
    }
}
