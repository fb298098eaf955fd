use super::{ColumnIter, ObjectIter};
use crate::error::{CarbonError, Result};
use crate::field::{
    FieldRef, FieldType, ListDerivation, MimeType, Scalar, field_size, list_derivation_of_array,
    skip_slack,
};
use crate::insert::ArrayInsert;
use crate::memfile::MemFile;
use crate::types::MARKER_ARRAY_END;
use tracing::trace;

/// Cursor over the elements of an encoded array.
///
/// After [`next`](Self::next) returns `true` the iterator is positioned on a
/// field and the typed accessors apply. Offsets of previously visited fields
/// are kept on a history stack so [`prev`](Self::prev) can walk back without
/// any backward links in the encoding.
#[derive(Debug)]
pub struct ArrayIter<'a> {
    file: MemFile<'a>,
    begin: usize,
    /// Where the next field starts when no field is current.
    cursor: usize,
    field: Option<usize>,
    history: Vec<usize>,
}

impl<'a> ArrayIter<'a> {
    /// Open an iterator over the array whose begin marker is at `begin`.
    pub fn open(file: MemFile<'a>, begin: usize) -> Result<Self> {
        let marker = *file.data().get(begin).ok_or_else(|| {
            CarbonError::ReadOutOfBounds(format!("no array at offset {begin}"))
        })?;
        list_derivation_of_array(marker)?;
        Ok(Self {
            file,
            begin,
            cursor: begin + 1,
            field: None,
            history: Vec::new(),
        })
    }

    /// Offset of the array's begin marker.
    #[inline]
    pub fn begin_offset(&self) -> usize {
        self.begin
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.file.is_writable()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Navigation
    // ════════════════════════════════════════════════════════════════════════

    fn next_offset(&self) -> Result<usize> {
        match self.field {
            Some(offset) => Ok(offset + field_size(self.file.data(), offset)?),
            None => Ok(self.cursor),
        }
    }

    fn byte_at(&self, at: usize) -> Result<u8> {
        self.file.data().get(at).copied().ok_or_else(|| {
            CarbonError::Corrupted(format!("array at {} has no terminator", self.begin))
        })
    }

    /// Advance to the next element. Returns `false` once the end of the
    /// array is reached.
    pub fn next(&mut self) -> Result<bool> {
        let at = self.next_offset()?;
        let byte = self.byte_at(at)?;
        if byte == 0 || byte == MARKER_ARRAY_END {
            skip_slack(self.file.data(), at, MARKER_ARRAY_END, "array")?;
            if let Some(prev) = self.field.take() {
                self.history.push(prev);
            }
            self.cursor = at;
            return Ok(false);
        }
        FieldType::from_marker(byte)?;
        if let Some(prev) = self.field.replace(at) {
            self.history.push(prev);
        }
        self.cursor = at;
        Ok(true)
    }

    /// Step back to the previously visited element. Returns `false` when
    /// there is none.
    pub fn prev(&mut self) -> Result<bool> {
        match self.history.pop() {
            Some(offset) => {
                self.field = Some(offset);
                self.cursor = offset;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn rewind(&mut self) {
        self.field = None;
        self.cursor = self.begin + 1;
        self.history.clear();
    }

    pub fn has_next(&self) -> Result<bool> {
        let byte = self.byte_at(self.next_offset()?)?;
        Ok(byte != 0 && byte != MARKER_ARRAY_END)
    }

    /// Rewind and move to the element at `index`. Returns `false` if the
    /// array is shorter.
    pub fn move_to(&mut self, index: usize) -> Result<bool> {
        self.rewind();
        for _ in 0..=index {
            if !self.next()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Position of the current element, if any.
    pub fn index(&self) -> Option<usize> {
        self.field.map(|_| self.history.len())
    }

    /// Number of elements, counted by a full scan.
    pub fn length(&self) -> Result<usize> {
        let data = self.file.data();
        let mut at = self.begin + 1;
        let mut count = 0;
        loop {
            match self.byte_at(at)? {
                0 | MARKER_ARRAY_END => return Ok(count),
                _ => {
                    at += field_size(data, at)?;
                    count += 1;
                }
            }
        }
    }

    /// Offset one past the array's end marker.
    pub fn end_offset(&self) -> Result<usize> {
        Ok(self.begin + field_size(self.file.data(), self.begin)?)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Abstract type
    // ════════════════════════════════════════════════════════════════════════

    pub fn derivation(&self) -> Result<ListDerivation> {
        list_derivation_of_array(self.byte_at(self.begin)?)
    }

    pub fn is_multiset(&self) -> Result<bool> {
        Ok(self.derivation()?.is_multiset())
    }

    pub fn is_sorted(&self) -> Result<bool> {
        Ok(self.derivation()?.is_sorted())
    }

    /// Rewrite the derivation marker. Element bytes are untouched.
    pub fn update_type(&mut self, derivation: ListDerivation) -> Result<()> {
        self.file.patch_byte(self.begin, derivation.array_marker())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Current field
    // ════════════════════════════════════════════════════════════════════════

    fn current_offset(&self) -> Result<usize> {
        self.field
            .ok_or(CarbonError::IllegalState("array iterator is not on an element"))
    }

    fn current_ref(&self) -> Result<FieldRef<'_>> {
        FieldRef::at(self.file.data(), self.current_offset()?)
    }

    pub fn field_type(&self) -> Result<FieldType> {
        Ok(self.current_ref()?.field_type())
    }

    /// Offset of the current element's marker.
    pub fn field_offset(&self) -> Option<usize> {
        self.field
    }

    field_access!();

    // ════════════════════════════════════════════════════════════════════════
    // Structural changes
    // ════════════════════════════════════════════════════════════════════════

    /// Remove the current element. The iterator is left between the previous
    /// and the following element, so `next` yields the element that followed
    /// the removed one.
    pub fn remove(&mut self) -> Result<()> {
        let offset = self.field.ok_or(CarbonError::IllegalState(
            "remove requires a current element",
        ))?;
        let size = field_size(self.file.data(), offset)?;
        self.file.seek(offset)?;
        self.file.inplace_remove(size)?;
        trace!(offset, size, "array element removed");
        self.field = None;
        self.cursor = offset;
        Ok(())
    }

    /// Open an insert builder right after the current element, or at the
    /// iterator's cursor when no element is current. Elements inserted this
    /// way are visited by subsequent `next` calls.
    pub fn insert_begin(&mut self) -> Result<ArrayInsert<'_>> {
        if !self.file.is_writable() {
            return Err(CarbonError::WriteProtect);
        }
        let at = self.next_offset()?;
        Ok(ArrayInsert::new(self.file.reborrow(), at))
    }
}
