//! Schema-to-handler construction and memoization.

use crate::basic::{BasicHandler, BasicKind};
use crate::container::ContainerHandler;
use crate::handler::SszHandler;
use crate::list::ListHandler;
use crate::pointer::PointerHandler;
use crate::schema::{FieldDisposition, Schema};
use crate::vector::VectorHandler;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Returned when a schema cannot be mapped onto a handler tree.
#[derive(Debug, PartialEq, Clone)]
pub enum BuildError {
    /// A vector was declared with an unusable length.
    UnsupportedLength(u64),
    /// A fixed-size-element list whose element occupies zero wire bytes;
    /// the element count could never be inferred.
    ZeroLengthItem,
    /// A child handler claims to be fixed-size while its min/max lengths
    /// disagree with its fixed length. The field name is reported.
    MalformedFixedField(String),
    /// A member tagged for squashing does not expose a flat field list. The
    /// member name is reported.
    SquashNotApplicable(String),
}

/// Builds the handler for `schema`, recursing into element and field types.
pub(crate) fn build_handler(schema: &Schema) -> Result<SszHandler, BuildError> {
    Ok(match schema {
        Schema::Uint8 => SszHandler::Basic(BasicHandler::new(BasicKind::Uint8)),
        Schema::Uint16 => SszHandler::Basic(BasicHandler::new(BasicKind::Uint16)),
        Schema::Uint32 => SszHandler::Basic(BasicHandler::new(BasicKind::Uint32)),
        Schema::Uint64 => SszHandler::Basic(BasicHandler::new(BasicKind::Uint64)),
        Schema::Bool => SszHandler::Basic(BasicHandler::new(BasicKind::Bool)),
        Schema::Vector { elem, length } => {
            let elem = Arc::new(build_handler(elem)?);
            SszHandler::Vector(VectorHandler::new(elem, *length)?)
        }
        Schema::List { elem, limit } => {
            let elem = Arc::new(build_handler(elem)?);
            SszHandler::List(ListHandler::new(elem, *limit)?)
        }
        Schema::Container { fields } => {
            let mut members = Vec::with_capacity(fields.len());
            for field in fields {
                // Omitted members never get a handler built.
                if field.disposition == FieldDisposition::Omit {
                    continue;
                }
                let handler = Arc::new(build_handler(&field.schema)?);
                members.push((field.name.clone(), handler, field.disposition));
            }
            SszHandler::Container(ContainerHandler::new(members)?)
        }
        Schema::Pointer(inner) => {
            let inner = Arc::new(build_handler(inner)?);
            SszHandler::Pointer(PointerHandler::new(inner))
        }
    })
}

/// Binds schemas to handler trees, memoizing construction.
///
/// Handler trees are immutable, so the memo table is safe for concurrent
/// reads; construction races insert the first winner.
#[derive(Default)]
pub struct Registry {
    handlers: RwLock<HashMap<Schema, Arc<SszHandler>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, schema: &Schema) -> Result<Arc<SszHandler>, BuildError> {
        if let Some(handler) = self.handlers.read().get(schema) {
            return Ok(handler.clone());
        }
        let handler = Arc::new(build_handler(schema)?);
        let mut handlers = self.handlers.write();
        Ok(handlers
            .entry(schema.clone())
            .or_insert(handler)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaField;

    #[test]
    fn memoizes_handlers() {
        let registry = Registry::new();
        let schema = Schema::list(Schema::Uint16, 1024);

        let first = registry.get(&schema).unwrap();
        let second = registry.get(&schema).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn zero_length_vector_is_rejected() {
        let err = build_handler(&Schema::vector(Schema::Uint8, 0)).unwrap_err();
        assert_eq!(err, BuildError::UnsupportedLength(0));
    }

    #[test]
    fn list_of_empty_containers_is_rejected() {
        let schema = Schema::list(Schema::container(vec![]), 16);
        assert_eq!(build_handler(&schema).unwrap_err(), BuildError::ZeroLengthItem);
    }

    #[test]
    fn squashing_a_non_container_fails() {
        let schema = Schema::container(vec![SchemaField::squashed("inner", Schema::Uint64)]);
        assert_eq!(
            build_handler(&schema).unwrap_err(),
            BuildError::SquashNotApplicable("inner".to_string())
        );
    }

    #[test]
    fn anonymous_non_container_falls_back_to_a_normal_field() {
        let schema = Schema::container(vec![SchemaField::anonymous("inner", Schema::Uint64)]);
        let handler = build_handler(&schema).unwrap();
        assert!(handler.is_fixed());
        assert_eq!(handler.fixed_len(), 8);
    }

    #[test]
    fn omitted_members_do_not_contribute() {
        let schema = Schema::container(vec![
            SchemaField::new("kept", Schema::Uint32),
            SchemaField::omitted("dropped", Schema::Uint64),
        ]);
        let handler = build_handler(&schema).unwrap();
        assert_eq!(handler.fixed_len(), 4);
    }
}
