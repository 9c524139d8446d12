//! Provides encoding (serialization), decoding (deserialization) and Merkle
//! hashing in the SimpleSerialize (SSZ) format designed for use in consensus
//! layer protocols.
//!
//! Unlike derive-based SSZ crates, this one is schema-driven: a [`Schema`]
//! describes a type at runtime and the registry turns it into an immutable
//! [`SszHandler`] tree which encodes, decodes, sizes and hashes dynamic
//! [`Value`]s of that type.
//!
//! ## Example
//!
//! ```rust
//! use ssz_schema::{Schema, SchemaField, SszHandler, Value};
//!
//! let schema = Schema::container(vec![
//!     SchemaField::new("a", Schema::Uint32),
//!     SchemaField::new("b", Schema::list(Schema::Uint8, 256)),
//! ]);
//!
//! let handler = SszHandler::from_schema(&schema).unwrap();
//!
//! let value = Value::Container(vec![
//!     Value::Uint32(42),
//!     Value::List(vec![Value::Uint8(7), Value::Uint8(8), Value::Uint8(9)]),
//! ]);
//!
//! let bytes = handler.as_ssz_bytes(&value).unwrap();
//! let decoded = handler.from_ssz_bytes(&bytes).unwrap();
//!
//! assert_eq!(value, decoded);
//! ```

mod basic;
mod container;
mod handler;
mod list;
mod merkle;
mod pointer;
mod reader;
mod registry;
mod schema;
mod series;
mod value;
mod vector;
mod writer;

pub use basic::{BasicHandler, BasicKind};
pub use container::{ContainerField, ContainerHandler};
pub use handler::{Lengths, SszHandler};
pub use list::ListHandler;
pub use pointer::PointerHandler;
pub use vector::VectorHandler;
pub use merkle::{merkleize, Hash256, Hasher, Sha256Hasher, BYTES_PER_CHUNK};
pub use reader::{DecodeError, IoSource, SeekSource, SliceSource, Source, SszReader};
pub use registry::{BuildError, Registry};
pub use schema::{FieldDisposition, Schema, SchemaField};
pub use value::{KindMismatch, Value};
pub use writer::{EncodeError, SszWriter};

/// The number of bytes used to represent an offset.
pub const BYTES_PER_LENGTH_OFFSET: u64 = 4;

/// Convenience function to SSZ encode a value under the given handler.
///
/// Equivalent to `handler.as_ssz_bytes(value)`.
pub fn ssz_encode(handler: &SszHandler, value: &Value) -> Result<Vec<u8>, EncodeError> {
    handler.as_ssz_bytes(value)
}
