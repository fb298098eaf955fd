use super::{ArrayIter, ColumnIter};
use crate::error::{CarbonError, Result};
use crate::field::{
    FieldRef, FieldType, MapDerivation, MimeType, Scalar, field_size, key_size,
    map_derivation_of_object, skip_slack,
};
use crate::insert::ObjectInsert;
use crate::memfile::MemFile;
use crate::types::MARKER_OBJECT_END;
use tracing::trace;

/// Offsets of one property: its key and its value field.
#[derive(Debug, Clone, Copy)]
struct Prop {
    key: usize,
    value: usize,
}

/// Cursor over the properties of an encoded object. Same shape as
/// [`ArrayIter`], but every slot is a key followed by a value field and the
/// typed accessors read the value.
#[derive(Debug)]
pub struct ObjectIter<'a> {
    file: MemFile<'a>,
    begin: usize,
    cursor: usize,
    prop: Option<Prop>,
    /// Key offsets of previously visited properties.
    history: Vec<usize>,
}

impl<'a> ObjectIter<'a> {
    pub fn open(file: MemFile<'a>, begin: usize) -> Result<Self> {
        let marker = *file.data().get(begin).ok_or_else(|| {
            CarbonError::ReadOutOfBounds(format!("no object at offset {begin}"))
        })?;
        map_derivation_of_object(marker)?;
        Ok(Self {
            file,
            begin,
            cursor: begin + 1,
            prop: None,
            history: Vec::new(),
        })
    }

    #[inline]
    pub fn begin_offset(&self) -> usize {
        self.begin
    }

    fn byte_at(&self, at: usize) -> Result<u8> {
        self.file.data().get(at).copied().ok_or_else(|| {
            CarbonError::Corrupted(format!("object at {} has no terminator", self.begin))
        })
    }

    fn next_offset(&self) -> Result<usize> {
        match self.prop {
            Some(p) => Ok(p.value + field_size(self.file.data(), p.value)?),
            None => Ok(self.cursor),
        }
    }

    fn prop_at(&self, key: usize) -> Result<Prop> {
        let value = key + key_size(self.file.data(), key)?;
        FieldType::from_marker(self.byte_at(value)?)?;
        Ok(Prop { key, value })
    }

    // ════════════════════════════════════════════════════════════════════════
    // Navigation
    // ════════════════════════════════════════════════════════════════════════

    pub fn next(&mut self) -> Result<bool> {
        let at = self.next_offset()?;
        let byte = self.byte_at(at)?;
        if byte == 0 || byte == MARKER_OBJECT_END {
            skip_slack(self.file.data(), at, MARKER_OBJECT_END, "object")?;
            if let Some(prev) = self.prop.take() {
                self.history.push(prev.key);
            }
            self.cursor = at;
            return Ok(false);
        }
        let prop = self.prop_at(at)?;
        if let Some(prev) = self.prop.replace(prop) {
            self.history.push(prev.key);
        }
        self.cursor = at;
        Ok(true)
    }

    pub fn prev(&mut self) -> Result<bool> {
        let Some(key) = self.history.pop() else {
            return Ok(false);
        };
        self.prop = Some(self.prop_at(key)?);
        self.cursor = key;
        Ok(true)
    }

    pub fn rewind(&mut self) {
        self.prop = None;
        self.cursor = self.begin + 1;
        self.history.clear();
    }

    pub fn has_next(&self) -> Result<bool> {
        let byte = self.byte_at(self.next_offset()?)?;
        Ok(byte != 0 && byte != MARKER_OBJECT_END)
    }

    /// Rewind and move to the first property named `name`.
    pub fn find_key(&mut self, name: &str) -> Result<bool> {
        self.rewind();
        while self.next()? {
            if self.key()? == name {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn index(&self) -> Option<usize> {
        self.prop.map(|_| self.history.len())
    }

    /// Number of properties, counted by a full scan.
    pub fn length(&self) -> Result<usize> {
        let data = self.file.data();
        let mut at = self.begin + 1;
        let mut count = 0;
        loop {
            match self.byte_at(at)? {
                0 | MARKER_OBJECT_END => return Ok(count),
                _ => {
                    at += key_size(data, at)?;
                    at += field_size(data, at)?;
                    count += 1;
                }
            }
        }
    }

    pub fn end_offset(&self) -> Result<usize> {
        Ok(self.begin + field_size(self.file.data(), self.begin)?)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Abstract type
    // ════════════════════════════════════════════════════════════════════════

    pub fn derivation(&self) -> Result<MapDerivation> {
        map_derivation_of_object(self.byte_at(self.begin)?)
    }

    pub fn is_multimap(&self) -> Result<bool> {
        Ok(self.derivation()?.is_multimap())
    }

    pub fn is_sorted(&self) -> Result<bool> {
        Ok(self.derivation()?.is_sorted())
    }

    pub fn update_type(&mut self, derivation: MapDerivation) -> Result<()> {
        self.file.patch_byte(self.begin, derivation.object_marker())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Current property
    // ════════════════════════════════════════════════════════════════════════

    fn current(&self) -> Result<Prop> {
        self.prop
            .ok_or(CarbonError::IllegalState("object iterator is not on a property"))
    }

    fn current_offset(&self) -> Result<usize> {
        Ok(self.current()?.value)
    }

    fn current_ref(&self) -> Result<FieldRef<'_>> {
        FieldRef::at(self.file.data(), self.current_offset()?)
    }

    /// Name of the current property.
    pub fn key(&self) -> Result<&str> {
        // Keys are encoded exactly like string fields.
        FieldRef::at(self.file.data(), self.current()?.key)?.string_value()
    }

    pub fn field_type(&self) -> Result<FieldType> {
        Ok(self.current_ref()?.field_type())
    }

    field_access!();

    // ════════════════════════════════════════════════════════════════════════
    // Structural changes
    // ════════════════════════════════════════════════════════════════════════

    /// Remove the current property, key and value in one shift.
    pub fn remove(&mut self) -> Result<()> {
        let prop = self.prop.ok_or(CarbonError::IllegalState(
            "remove requires a current property",
        ))?;
        let size = (prop.value - prop.key) + field_size(self.file.data(), prop.value)?;
        self.file.seek(prop.key)?;
        self.file.inplace_remove(size)?;
        trace!(offset = prop.key, size, "object property removed");
        self.prop = None;
        self.cursor = prop.key;
        Ok(())
    }

    /// Open an insert builder after the current property, or at the cursor
    /// when no property is current.
    pub fn insert_begin(&mut self) -> Result<ObjectInsert<'_>> {
        if !self.file.is_writable() {
            return Err(CarbonError::WriteProtect);
        }
        let at = self.next_offset()?;
        Ok(ObjectInsert::new(self.file.reborrow(), at))
    }
}
