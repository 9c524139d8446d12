//! Indirection proxy to another handler.
//!
//! Transparent to the wire format: every operation dereferences the value
//! once and delegates to the inner handler.

use crate::handler::{Lengths, SszHandler};
use crate::merkle::{Hash256, Hasher};
use crate::reader::{DecodeError, SszReader};
use crate::value::{KindMismatch, Value};
use crate::writer::{EncodeError, SszWriter};
use std::sync::Arc;

#[derive(Debug)]
pub struct PointerHandler {
    inner: Arc<SszHandler>,
}

impl PointerHandler {
    pub fn new(inner: Arc<SszHandler>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &SszHandler {
        &self.inner
    }

    pub fn lengths(&self) -> &Lengths {
        self.inner.lengths()
    }

    pub fn default_value(&self) -> Value {
        Value::Pointer(Box::new(self.inner.default_value()))
    }

    pub fn size_of(&self, value: &Value) -> Result<u64, KindMismatch> {
        self.inner.size_of(value.as_pointer()?)
    }

    pub fn encode(&self, writer: &mut SszWriter<'_>, value: &Value) -> Result<(), EncodeError> {
        let inner_value = value.as_pointer().map_err(EncodeError::from)?;
        self.inner.encode(writer, inner_value)
    }

    pub fn decode(&self, reader: &mut SszReader<'_>, slot: &mut Value) -> Result<(), DecodeError> {
        match slot {
            Value::Pointer(inner_slot) => self.inner.decode(reader, inner_slot),
            other => Err(DecodeError::ValueMismatch(KindMismatch::new(
                "pointer",
                other.kind_name(),
            ))),
        }
    }

    pub fn dry_check(&self, reader: &mut SszReader<'_>) -> Result<(), DecodeError> {
        self.inner.dry_check(reader)
    }

    pub fn hash_tree_root(
        &self,
        hasher: &mut dyn Hasher,
        value: &Value,
    ) -> Result<Hash256, KindMismatch> {
        // Delegate to the inner handler's hash, not back to this one.
        self.inner.hash_tree_root(hasher, value.as_pointer()?)
    }
}
