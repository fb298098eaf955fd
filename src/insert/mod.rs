//! Insert builders.
//!
//! A builder owns a reborrowed [`MemFile`] positioned inside one container
//! and writes fields at its write cursor, growing the document as needed.
//! Nested containers are opened through guards that borrow the parent
//! builder; when a guard drops, the parent's cursor moves past the finished
//! nested container.

mod array;
mod column;
mod object;

pub use array::ArrayInsert;
pub use column::ColumnInsert;
pub use object::ObjectInsert;

use crate::error::Result;
use crate::field::{ColumnType, ListDerivation, MapDerivation, field_size};
use crate::memfile::MemFile;
use crate::types::{MARKER_ARRAY_END, MARKER_OBJECT_END};
use crate::varuint::encode_varuint_array;
use std::ops::{Deref, DerefMut};

/// Common surface of the insert builders.
pub trait Inserter {
    /// Offset the next write goes to (for columns: the column's begin).
    fn position(&self) -> usize;

    /// The whole document as currently written.
    fn document(&self) -> &[u8];
}

/// Write `bytes` at `position`, reusing zero slack and shifting the rest of
/// the document for whatever is missing. Returns the position after them.
pub(crate) fn place(file: &mut MemFile<'_>, position: usize, bytes: &[u8]) -> Result<usize> {
    file.seek(position)?;
    file.ensure_space(bytes.len())?;
    file.write(bytes)?;
    Ok(position + bytes.len())
}

pub(crate) fn encode_empty_array(buf: &mut Vec<u8>, derivation: ListDerivation, capacity: usize) {
    buf.push(derivation.array_marker());
    buf.resize(buf.len() + capacity, 0);
    buf.push(MARKER_ARRAY_END);
}

pub(crate) fn encode_empty_object(buf: &mut Vec<u8>, derivation: MapDerivation, capacity: usize) {
    buf.push(derivation.object_marker());
    buf.resize(buf.len() + capacity, 0);
    buf.push(MARKER_OBJECT_END);
}

/// Column header with `count = 0` and `capacity` sentinel slots.
pub(crate) fn encode_empty_column(
    buf: &mut Vec<u8>,
    column_type: ColumnType,
    derivation: ListDerivation,
    capacity: usize,
) {
    buf.push(column_type.marker(derivation));
    let (count, width) = encode_varuint_array(0);
    buf.extend_from_slice(&count[..width]);
    let (cap, width) = encode_varuint_array(capacity as u64);
    buf.extend_from_slice(&cap[..width]);
    let (null, width) = column_type.null_slot();
    for _ in 0..capacity {
        buf.extend_from_slice(&null[..width]);
    }
}

// ─── Nested ─────────────────────────────────────────────────────────────────

/// Builder for a container nested inside another builder's container.
///
/// Dereferences to the inner builder. Dropping it (or calling
/// [`end`](Nested::end)) moves the parent's write cursor past the nested
/// container.
pub struct Nested<'p, I: Inserter> {
    inner: I,
    parent_position: &'p mut usize,
    begin: usize,
}

pub type NestedArray<'p> = Nested<'p, ArrayInsert<'p>>;
pub type NestedObject<'p> = Nested<'p, ObjectInsert<'p>>;
pub type NestedColumn<'p> = Nested<'p, ColumnInsert<'p>>;

impl<'p, I: Inserter> Nested<'p, I> {
    pub(crate) fn new(inner: I, parent_position: &'p mut usize, begin: usize) -> Self {
        Self {
            inner,
            parent_position,
            begin,
        }
    }

    /// Offset of the nested container's begin marker.
    pub fn begin_offset(&self) -> usize {
        self.begin
    }

    pub fn end(self) {}
}

impl<I: Inserter> Deref for Nested<'_, I> {
    type Target = I;

    fn deref(&self) -> &I {
        &self.inner
    }
}

impl<I: Inserter> DerefMut for Nested<'_, I> {
    fn deref_mut(&mut self) -> &mut I {
        &mut self.inner
    }
}

impl<I: Inserter> Drop for Nested<'_, I> {
    fn drop(&mut self) {
        *self.parent_position = match field_size(self.inner.document(), self.begin) {
            Ok(size) => self.begin + size,
            Err(_) => self.inner.position(),
        };
    }
}

#[cfg(test)]
mod tests;
