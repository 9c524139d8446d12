//! Type descriptors.
//!
//! A [`Schema`] is the compile-time replacement for runtime reflection: it
//! describes an SSZ type as plain data, and the registry maps it onto a
//! handler tree. Schemas are cheap to clone, hashable (so they can key the
//! registry's memo table) and carry no host-type coupling.

/// Describes an SSZ type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Schema {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Bool,
    /// Exactly `length` elements of `elem`.
    Vector { elem: Box<Schema>, length: u64 },
    /// Up to `limit` elements of `elem`.
    List { elem: Box<Schema>, limit: u64 },
    /// An ordered, named, heterogeneous field list.
    Container { fields: Vec<SchemaField> },
    /// An indirection whose wire form is identical to the inner type's.
    Pointer(Box<Schema>),
}

impl Schema {
    pub fn vector(elem: Schema, length: u64) -> Self {
        Schema::Vector {
            elem: Box::new(elem),
            length,
        }
    }

    pub fn list(elem: Schema, limit: u64) -> Self {
        Schema::List {
            elem: Box::new(elem),
            limit,
        }
    }

    pub fn container(fields: Vec<SchemaField>) -> Self {
        Schema::Container { fields }
    }

    pub fn pointer(inner: Schema) -> Self {
        Schema::Pointer(Box::new(inner))
    }
}

/// How a container member participates in the wire form and the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldDisposition {
    /// One field, projected at the member's position.
    Normal,
    /// The member contributes no field at all.
    Omit,
    /// The member's own fields are inlined into the parent; construction
    /// fails if the member does not expose a flat field list.
    Squash,
    /// An anonymous embedding: squash when possible, otherwise fall back to
    /// a normal field.
    Anonymous,
}

/// A single member of a container schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaField {
    pub name: String,
    pub schema: Schema,
    pub disposition: FieldDisposition,
}

impl SchemaField {
    pub fn new<N: Into<String>>(name: N, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            disposition: FieldDisposition::Normal,
        }
    }

    pub fn omitted<N: Into<String>>(name: N, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            disposition: FieldDisposition::Omit,
        }
    }

    pub fn squashed<N: Into<String>>(name: N, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            disposition: FieldDisposition::Squash,
        }
    }

    pub fn anonymous<N: Into<String>>(name: N, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            disposition: FieldDisposition::Anonymous,
        }
    }
}
