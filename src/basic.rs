//! Fixed-width integers and booleans.

use crate::handler::Lengths;
use crate::merkle::{packed_leaf, Hash256};
use crate::reader::{DecodeError, SszReader};
use crate::value::{KindMismatch, Value};
use crate::writer::{EncodeError, SszWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Bool,
}

impl BasicKind {
    /// The wire width in bytes, equal to the in-memory width.
    pub fn width(&self) -> u64 {
        match self {
            BasicKind::Uint8 | BasicKind::Bool => 1,
            BasicKind::Uint16 => 2,
            BasicKind::Uint32 => 4,
            BasicKind::Uint64 => 8,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Bool => "bool",
        }
    }
}

#[derive(Debug)]
pub struct BasicHandler {
    kind: BasicKind,
    lengths: Lengths,
}

impl BasicHandler {
    pub fn new(kind: BasicKind) -> Self {
        Self {
            kind,
            lengths: Lengths::fixed(kind.width()),
        }
    }

    pub fn kind(&self) -> BasicKind {
        self.kind
    }

    pub fn lengths(&self) -> &Lengths {
        &self.lengths
    }

    pub fn default_value(&self) -> Value {
        match self.kind {
            BasicKind::Uint8 => Value::Uint8(0),
            BasicKind::Uint16 => Value::Uint16(0),
            BasicKind::Uint32 => Value::Uint32(0),
            BasicKind::Uint64 => Value::Uint64(0),
            BasicKind::Bool => Value::Bool(false),
        }
    }

    pub fn matches_kind(&self, value: &Value) -> bool {
        matches!(
            (self.kind, value),
            (BasicKind::Uint8, Value::Uint8(_))
                | (BasicKind::Uint16, Value::Uint16(_))
                | (BasicKind::Uint32, Value::Uint32(_))
                | (BasicKind::Uint64, Value::Uint64(_))
                | (BasicKind::Bool, Value::Bool(_))
        )
    }

    pub fn size_of(&self, value: &Value) -> Result<u64, KindMismatch> {
        if self.matches_kind(value) {
            Ok(self.kind.width())
        } else {
            Err(KindMismatch::new(self.kind.name(), value.kind_name()))
        }
    }

    /// Appends the value's little-endian wire bytes to `out`.
    pub fn append_wire_bytes(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), KindMismatch> {
        match (self.kind, value) {
            (BasicKind::Uint8, Value::Uint8(x)) => out.extend_from_slice(&x.to_le_bytes()),
            (BasicKind::Uint16, Value::Uint16(x)) => out.extend_from_slice(&x.to_le_bytes()),
            (BasicKind::Uint32, Value::Uint32(x)) => out.extend_from_slice(&x.to_le_bytes()),
            (BasicKind::Uint64, Value::Uint64(x)) => out.extend_from_slice(&x.to_le_bytes()),
            (BasicKind::Bool, Value::Bool(x)) => out.push(*x as u8),
            (kind, other) => return Err(KindMismatch::new(kind.name(), other.kind_name())),
        }
        Ok(())
    }

    pub fn encode(&self, writer: &mut SszWriter<'_>, value: &Value) -> Result<(), EncodeError> {
        match (self.kind, value) {
            (BasicKind::Uint8, Value::Uint8(x)) => writer.write(&x.to_le_bytes()),
            (BasicKind::Uint16, Value::Uint16(x)) => writer.write(&x.to_le_bytes()),
            (BasicKind::Uint32, Value::Uint32(x)) => writer.write(&x.to_le_bytes()),
            (BasicKind::Uint64, Value::Uint64(x)) => writer.write(&x.to_le_bytes()),
            (BasicKind::Bool, Value::Bool(x)) => writer.write(&[*x as u8]),
            (kind, other) => {
                return Err(KindMismatch::new(kind.name(), other.kind_name()).into())
            }
        }
        Ok(())
    }

    pub fn decode(&self, reader: &mut SszReader<'_>, slot: &mut Value) -> Result<(), DecodeError> {
        *slot = match self.kind {
            BasicKind::Uint8 => Value::Uint8(reader.read_byte()?),
            BasicKind::Uint16 => Value::Uint16(reader.read_u16()?),
            BasicKind::Uint32 => Value::Uint32(reader.read_u32()?),
            BasicKind::Uint64 => Value::Uint64(reader.read_u64()?),
            BasicKind::Bool => Value::Bool(decode_bool_byte(reader.read_byte()?)?),
        };
        Ok(())
    }

    /// Builds a value from a little-endian window of a bulk-read buffer.
    pub fn value_from_wire_bytes(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        debug_assert_eq!(bytes.len() as u64, self.kind.width());
        Ok(match self.kind {
            BasicKind::Uint8 => Value::Uint8(bytes[0]),
            BasicKind::Uint16 => {
                let mut le = [0u8; 2];
                le.copy_from_slice(bytes);
                Value::Uint16(u16::from_le_bytes(le))
            }
            BasicKind::Uint32 => {
                let mut le = [0u8; 4];
                le.copy_from_slice(bytes);
                Value::Uint32(u32::from_le_bytes(le))
            }
            BasicKind::Uint64 => {
                let mut le = [0u8; 8];
                le.copy_from_slice(bytes);
                Value::Uint64(u64::from_le_bytes(le))
            }
            BasicKind::Bool => Value::Bool(decode_bool_byte(bytes[0])?),
        })
    }

    pub fn dry_check(&self, reader: &mut SszReader<'_>) -> Result<(), DecodeError> {
        match self.kind {
            BasicKind::Bool => {
                decode_bool_byte(reader.read_byte()?)?;
            }
            _ => {
                reader.skip(self.kind.width())?;
            }
        }
        Ok(())
    }

    /// The value serialized and right-padded with zeros to 32 bytes.
    pub fn hash_tree_root(&self, value: &Value) -> Result<Hash256, KindMismatch> {
        let mut wire = Vec::with_capacity(self.kind.width() as usize);
        self.append_wire_bytes(value, &mut wire)?;
        Ok(Hash256::from(packed_leaf(&wire, 0)))
    }
}

fn decode_bool_byte(byte: u8) -> Result<bool, DecodeError> {
    match byte {
        0x00 => Ok(false),
        0x01 => Ok(true),
        other => Err(DecodeError::InvalidBool(other)),
    }
}
