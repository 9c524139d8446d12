//! Heterogeneous records of named fields.

use crate::handler::{Lengths, SszHandler};
use crate::merkle::{merkleize_chunks, Hash256, Hasher};
use crate::reader::{DecodeError, SszReader};
use crate::registry::BuildError;
use crate::schema::FieldDisposition;
use crate::series::{self, OffsetVec};
use crate::value::{KindMismatch, Value};
use crate::writer::{EncodeError, PooledBuffer, SszWriter};
use crate::BYTES_PER_LENGTH_OFFSET;
use smallvec::SmallVec;
use std::sync::Arc;

/// A single wire-level field of a container.
///
/// Squashing can make several fields share one source member, so a field
/// carries a projection path from the container's member list down to the
/// value it encodes.
#[derive(Debug, Clone)]
pub struct ContainerField {
    handler: Arc<SszHandler>,
    name: String,
    path: SmallVec<[usize; 2]>,
}

impl ContainerField {
    pub fn handler(&self) -> &SszHandler {
        &self.handler
    }

    /// The display name, dotted when the field was inlined by squashing.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn wrap(&self, member_name: &str, member_index: usize) -> ContainerField {
        let mut path = SmallVec::with_capacity(self.path.len() + 1);
        path.push(member_index);
        path.extend(self.path.iter().copied());
        ContainerField {
            handler: self.handler.clone(),
            name: format!("{}.{}", member_name, self.name),
            path,
        }
    }

    fn project<'v>(&self, members: &'v [Value]) -> Result<&'v Value, KindMismatch> {
        let (&first, rest) = self
            .path
            .split_first()
            .ok_or_else(|| KindMismatch::new("container member", "nothing"))?;
        let mut current = members
            .get(first)
            .ok_or_else(|| KindMismatch::new("container member", "nothing"))?;
        for &index in rest {
            current = current
                .as_container()?
                .get(index)
                .ok_or_else(|| KindMismatch::new("container member", "nothing"))?;
        }
        Ok(current)
    }

    fn project_mut<'v>(&self, members: &'v mut [Value]) -> Result<&'v mut Value, KindMismatch> {
        let (&first, rest) = self
            .path
            .split_first()
            .ok_or_else(|| KindMismatch::new("container member", "nothing"))?;
        let mut current = members
            .get_mut(first)
            .ok_or_else(|| KindMismatch::new("container member", "nothing"))?;
        for &index in rest {
            current = match current {
                Value::Container(inner) => inner
                    .get_mut(index)
                    .ok_or_else(|| KindMismatch::new("container member", "nothing"))?,
                other => return Err(KindMismatch::new("container", other.kind_name())),
            };
        }
        Ok(current)
    }
}

/// A retained (non-omitted) source member; squashed members keep their own
/// handler here so default values can be built for them.
#[derive(Debug)]
pub(crate) struct Member {
    pub(crate) name: String,
    pub(crate) handler: Arc<SszHandler>,
}

#[derive(Debug)]
pub struct ContainerHandler {
    fields: Vec<ContainerField>,
    members: Vec<Member>,
    lengths: Lengths,
    /// Size of the fixed region on the wire: fixed fields inline plus one
    /// offset per variable field. Differs from `lengths.fixed_len` for
    /// variable containers.
    fixed_region_len: u64,
    offset_count: u64,
}

impl ContainerHandler {
    pub fn new(
        source_members: Vec<(String, Arc<SszHandler>, FieldDisposition)>,
    ) -> Result<Self, BuildError> {
        let mut fields: Vec<ContainerField> = Vec::new();
        let mut members: Vec<Member> = Vec::new();

        for (name, handler, disposition) in source_members {
            let member_index = members.len();
            match disposition {
                FieldDisposition::Omit => continue,
                FieldDisposition::Normal => {
                    fields.push(normal_field(&name, &handler, member_index));
                }
                FieldDisposition::Squash => match handler.squash_fields() {
                    Some(inner) => {
                        let wrapped: Vec<ContainerField> =
                            inner.iter().map(|f| f.wrap(&name, member_index)).collect();
                        fields.extend(wrapped);
                    }
                    None => return Err(BuildError::SquashNotApplicable(name)),
                },
                FieldDisposition::Anonymous => match handler.squash_fields() {
                    Some(inner) => {
                        let wrapped: Vec<ContainerField> =
                            inner.iter().map(|f| f.wrap(&name, member_index)).collect();
                        fields.extend(wrapped);
                    }
                    // Anonymous members fall back to normal fields when the
                    // nested handler is not squashable.
                    None => fields.push(normal_field(&name, &handler, member_index)),
                },
            }
            members.push(Member { name, handler });
        }

        let mut fixed_region_len = 0u64;
        let mut min_len = 0u64;
        let mut max_len = 0u64;
        let mut fuzz_min_len = 0u64;
        let mut fuzz_max_len = 0u64;
        let mut offset_count = 0u64;

        for field in &fields {
            let handler = field.handler();
            if handler.is_fixed() {
                if handler.fixed_len() != handler.min_len()
                    || handler.fixed_len() != handler.max_len()
                {
                    return Err(BuildError::MalformedFixedField(field.name.clone()));
                }
                fixed_region_len += handler.fixed_len();
                min_len += handler.fixed_len();
                max_len = max_len.saturating_add(handler.fixed_len());
            } else {
                fixed_region_len += BYTES_PER_LENGTH_OFFSET;
                min_len += BYTES_PER_LENGTH_OFFSET + handler.min_len();
                max_len = max_len
                    .saturating_add(BYTES_PER_LENGTH_OFFSET)
                    .saturating_add(handler.max_len());
                offset_count += 1;
            }
            fuzz_min_len = fuzz_min_len.saturating_add(handler.fuzz_min_len());
            fuzz_max_len = fuzz_max_len.saturating_add(handler.fuzz_max_len());
        }

        let is_fixed = offset_count == 0;
        let lengths = Lengths {
            is_fixed,
            fixed_len: if is_fixed {
                fixed_region_len
            } else {
                BYTES_PER_LENGTH_OFFSET
            },
            min_len,
            max_len,
            fuzz_min_len,
            fuzz_max_len,
        };

        Ok(Self {
            fields,
            members,
            lengths,
            fixed_region_len,
            offset_count,
        })
    }

    pub fn lengths(&self) -> &Lengths {
        &self.lengths
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The flat field list, as inlined into parents that squash this
    /// container.
    pub fn squash_fields(&self) -> &[ContainerField] {
        &self.fields
    }

    pub(crate) fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn default_value(&self) -> Value {
        let members = self
            .members
            .iter()
            .map(|member| member.handler.default_value())
            .collect();
        Value::Container(members)
    }

    fn member_values<'v>(&self, value: &'v Value) -> Result<&'v [Value], KindMismatch> {
        let members = value.as_container()?;
        if members.len() != self.members.len() {
            return Err(KindMismatch::new("container", "misshapen container"));
        }
        Ok(members)
    }

    fn member_slots<'v>(&self, slot: &'v mut Value) -> Result<&'v mut [Value], DecodeError> {
        let kind_name = slot.kind_name();
        match slot {
            Value::Container(members) if members.len() == self.members.len() => Ok(members),
            _ => Err(DecodeError::ValueMismatch(KindMismatch::new(
                "container",
                kind_name,
            ))),
        }
    }

    pub fn size_of(&self, value: &Value) -> Result<u64, KindMismatch> {
        let members = self.member_values(value)?;
        let mut size = self.fixed_region_len;
        for field in &self.fields {
            if !field.handler.is_fixed() {
                size += field.handler.size_of(field.project(members)?)?;
            }
        }
        Ok(size)
    }

    pub fn encode(&self, writer: &mut SszWriter<'_>, value: &Value) -> Result<(), EncodeError> {
        let members = self.member_values(value)?;
        for field in &self.fields {
            let field_value = field.project(members)?;
            if field.handler.is_fixed() {
                field.handler.encode(writer, field_value)?;
            } else {
                // An offset into the variable region, then the payload goes
                // through a pooled staging buffer onto the forward queue.
                writer.write_offset(self.fixed_region_len);

                let mut staged = PooledBuffer::acquire();
                let mut staged_writer = SszWriter::new(&mut staged);
                field.handler.encode(&mut staged_writer, field_value)?;
                drop(staged_writer);
                writer.stage(&staged);
            }
        }
        // The forward queue may hold data staged by an enclosing composite;
        // only the outermost variable composite flushes.
        if !self.lengths.is_fixed {
            writer.flush_forward();
        }
        Ok(())
    }

    pub fn decode(&self, reader: &mut SszReader<'_>, slot: &mut Value) -> Result<(), DecodeError> {
        if reader.is_fuzz_mode() {
            return self.decode_fuzz(reader, slot);
        }
        let members = self.member_slots(slot)?;
        let offsets = self.decode_fixed_part(reader, members)?;
        self.decode_dynamic_part(reader, members, &offsets)?;
        if !self.lengths.is_fixed && reader.index() != reader.max() {
            return Err(DecodeError::InvalidByteLength {
                len: reader.index(),
                expected: reader.max(),
            });
        }
        Ok(())
    }

    /// First pass: fixed fields decode inline, variable fields contribute an
    /// offset. The running index is verified after every field and against
    /// the fixed region length at the pivot.
    fn decode_fixed_part(
        &self,
        reader: &mut SszReader<'_>,
        members: &mut [Value],
    ) -> Result<OffsetVec, DecodeError> {
        let mut offsets = OffsetVec::with_capacity(self.offset_count as usize);
        let start_index = reader.index();
        let mut fixed_index = start_index;

        for field in &self.fields {
            if field.handler.is_fixed() {
                fixed_index += field.handler.fixed_len();
                field.handler.decode(reader, field.project_mut(members)?)?;
            } else {
                fixed_index += BYTES_PER_LENGTH_OFFSET;
                offsets.push(reader.read_offset()?);
            }
            if reader.index() != fixed_index {
                return Err(DecodeError::InvalidByteLength {
                    len: reader.index(),
                    expected: fixed_index,
                });
            }
        }

        let pivot = start_index + self.fixed_region_len;
        if reader.index() != pivot {
            return Err(DecodeError::InvalidByteLength {
                len: reader.index(),
                expected: pivot,
            });
        }
        Ok(offsets)
    }

    /// Second pass: every variable field is scoped between consecutive
    /// offsets (the last runs to the end of the scope) and must begin
    /// exactly at its recorded offset.
    fn decode_dynamic_part(
        &self,
        reader: &mut SszReader<'_>,
        members: &mut [Value],
        offsets: &[u64],
    ) -> Result<(), DecodeError> {
        let mut i = 0;
        for field in &self.fields {
            if field.handler.is_fixed() {
                continue;
            }
            let scope = series::elem_scope(offsets, i, reader.max())?;
            series::decode_offset_elem(
                &field.handler,
                reader,
                offsets[i],
                scope,
                field.project_mut(members)?,
            )?;
            i += 1;
        }
        Ok(())
    }

    /// Relaxed decode: offsets are skipped entirely; each field is scoped to
    /// the remaining span minus the fuzz minimum of the fields behind it.
    fn decode_fuzz(&self, reader: &mut SszReader<'_>, slot: &mut Value) -> Result<(), DecodeError> {
        let members = self.member_slots(slot)?;
        let mut left_over = self.lengths.fuzz_min_len;

        for field in &self.fields {
            left_over -= field.handler.fuzz_min_len();
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
            field.handler.decode(&mut scoped, field.project_mut(members)?)?;
            let consumed = scoped.index();
            reader.update_index(consumed);
        }
        Ok(())
    }

    pub fn dry_check(&self, reader: &mut SszReader<'_>) -> Result<(), DecodeError> {
        let mut offsets = OffsetVec::with_capacity(self.offset_count as usize);
        let start_index = reader.index();
        let mut fixed_index = start_index;

        for field in &self.fields {
            if field.handler.is_fixed() {
                fixed_index += field.handler.fixed_len();
                field.handler.dry_check(reader)?;
            } else {
                fixed_index += BYTES_PER_LENGTH_OFFSET;
                offsets.push(reader.read_offset()?);
            }
            if reader.index() != fixed_index {
                return Err(DecodeError::InvalidByteLength {
                    len: reader.index(),
                    expected: fixed_index,
                });
            }
        }

        let pivot = start_index + self.fixed_region_len;
        if reader.index() != pivot {
            return Err(DecodeError::InvalidByteLength {
                len: reader.index(),
                expected: pivot,
            });
        }

        let mut i = 0;
        for field in &self.fields {
            if field.handler.is_fixed() {
                continue;
            }
            let actual = reader.index();
            if actual != offsets[i] {
                return Err(DecodeError::OffsetMismatch {
                    expected: offsets[i],
                    actual,
                });
            }
            let scope = series::elem_scope(&offsets, i, reader.max())?;
            let mut scoped = reader.scope(scope)?;
            field.handler.dry_check(&mut scoped)?;
            let consumed = scoped.index();
            reader.update_index(consumed);
            i += 1;
        }

        if !self.lengths.is_fixed && reader.index() != reader.max() {
            return Err(DecodeError::InvalidByteLength {
                len: reader.index(),
                expected: reader.max(),
            });
        }
        Ok(())
    }

    pub fn hash_tree_root(
        &self,
        hasher: &mut dyn Hasher,
        value: &Value,
    ) -> Result<Hash256, KindMismatch> {
        self.merkleize_fields(hasher, value, self.fields.len())
    }

    /// The hash tree root with the last field excluded.
    pub fn signing_root(
        &self,
        hasher: &mut dyn Hasher,
        value: &Value,
    ) -> Result<Hash256, KindMismatch> {
        self.merkleize_fields(hasher, value, self.fields.len().saturating_sub(1))
    }

    fn merkleize_fields(
        &self,
        hasher: &mut dyn Hasher,
        value: &Value,
        leaf_count: usize,
    ) -> Result<Hash256, KindMismatch> {
        let members = self.member_values(value)?;
        let mut roots = Vec::with_capacity(leaf_count);
        for field in &self.fields[..leaf_count] {
            let root = field.handler.hash_tree_root(hasher, field.project(members)?)?;
            roots.push(root.to_fixed_bytes());
        }
        Ok(merkleize_chunks(hasher, &roots, leaf_count as u64))
    }
}

fn normal_field(name: &str, handler: &Arc<SszHandler>, member_index: usize) -> ContainerField {
    let mut path = SmallVec::new();
    path.push(member_index);
    ContainerField {
        handler: handler.clone(),
        name: name.to_string(),
        path,
    }
}
