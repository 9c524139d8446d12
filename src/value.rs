/// A dynamically-typed SSZ value, one variant per kind in the SSZ algebra.
///
/// Handlers borrow values for the duration of a single operation; a `Value`
/// owns its children outright. The variant must agree with the handler the
/// value is used with, otherwise operations fail with [`KindMismatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Bool(bool),
    /// Exactly as many elements as the vector's declared length.
    Vector(Vec<Value>),
    /// Between zero and `limit` elements.
    List(Vec<Value>),
    /// One entry per retained (non-omitted) member, in declaration order.
    Container(Vec<Value>),
    Pointer(Box<Value>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Uint8(_) => "uint8",
            Value::Uint16(_) => "uint16",
            Value::Uint32(_) => "uint32",
            Value::Uint64(_) => "uint64",
            Value::Bool(_) => "bool",
            Value::Vector(_) => "vector",
            Value::List(_) => "list",
            Value::Container(_) => "container",
            Value::Pointer(_) => "pointer",
        }
    }

    pub fn as_vector(&self) -> Result<&[Value], KindMismatch> {
        match self {
            Value::Vector(elements) => Ok(elements),
            other => Err(KindMismatch::new("vector", other.kind_name())),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], KindMismatch> {
        match self {
            Value::List(elements) => Ok(elements),
            other => Err(KindMismatch::new("list", other.kind_name())),
        }
    }

    pub fn as_container(&self) -> Result<&[Value], KindMismatch> {
        match self {
            Value::Container(members) => Ok(members),
            other => Err(KindMismatch::new("container", other.kind_name())),
        }
    }

    pub fn as_pointer(&self) -> Result<&Value, KindMismatch> {
        match self {
            Value::Pointer(inner) => Ok(inner),
            other => Err(KindMismatch::new("pointer", other.kind_name())),
        }
    }
}

/// Returned when a value's variant does not match the handler operating on it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KindMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl KindMismatch {
    pub fn new(expected: &'static str, found: &'static str) -> Self {
        Self { expected, found }
    }
}

/// Resizes a decoded sequence to `len` elements.
///
/// Existing storage is reused (only the length changes) when its capacity is
/// sufficient; otherwise the sequence is rebound to freshly allocated,
/// default-initialized storage. Surviving elements keep their old contents so
/// nested storage can be reused by the element decoders.
pub(crate) fn reuse_sequence_storage<F>(sequence: &mut Vec<Value>, len: usize, default: F)
where
    F: Fn() -> Value,
{
    if sequence.capacity() >= len {
        sequence.resize_with(len, default);
    } else {
        let mut fresh = Vec::with_capacity(len);
        fresh.extend(sequence.drain(..));
        fresh.resize_with(len, default);
        *sequence = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        assert_eq!(Value::Uint64(0).kind_name(), "uint64");
        assert_eq!(Value::List(vec![]).kind_name(), "list");
    }

    #[test]
    fn accessor_mismatch() {
        let err = Value::Uint8(1).as_list().unwrap_err();
        assert_eq!(err, KindMismatch::new("list", "uint8"));
    }

    #[test]
    fn sequence_reuse_keeps_storage() {
        let mut seq = Vec::with_capacity(8);
        seq.push(Value::Uint8(1));
        seq.push(Value::Uint8(2));
        let data_ptr = seq.as_ptr();

        reuse_sequence_storage(&mut seq, 4, || Value::Uint8(0));

        assert_eq!(seq.len(), 4);
        assert_eq!(seq.as_ptr(), data_ptr);
        assert_eq!(seq[0], Value::Uint8(1));
        assert_eq!(seq[2], Value::Uint8(0));
    }

    #[test]
    fn sequence_reuse_reallocates_when_capacity_insufficient() {
        let mut seq = vec![Value::Uint8(9)];
        reuse_sequence_storage(&mut seq, 100, || Value::Uint8(0));

        assert_eq!(seq.len(), 100);
        assert_eq!(seq[0], Value::Uint8(9));
        assert_eq!(seq[99], Value::Uint8(0));
    }
}
