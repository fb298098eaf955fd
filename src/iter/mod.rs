//! Cursors over encoded containers.
//!
//! Every iterator owns a [`MemFile`] that was reborrowed from its parent, so a
//! nested iterator keeps its parent mutably borrowed until it is dropped and
//! only one cursor at a time can restructure the document.

/// Typed accessors and in-place updaters for iterators positioned on a field.
macro_rules! field_access {
    () => {
        pub fn bool_value(&self) -> Result<bool> {
            self.current_ref()?.bool_value()
        }

        pub fn u8_value(&self) -> Result<u8> {
            self.current_ref()?.u8_value()
        }

        pub fn u16_value(&self) -> Result<u16> {
            self.current_ref()?.u16_value()
        }

        pub fn u32_value(&self) -> Result<u32> {
            self.current_ref()?.u32_value()
        }

        pub fn u64_value(&self) -> Result<u64> {
            self.current_ref()?.u64_value()
        }

        pub fn i8_value(&self) -> Result<i8> {
            self.current_ref()?.i8_value()
        }

        pub fn i16_value(&self) -> Result<i16> {
            self.current_ref()?.i16_value()
        }

        pub fn i32_value(&self) -> Result<i32> {
            self.current_ref()?.i32_value()
        }

        pub fn i64_value(&self) -> Result<i64> {
            self.current_ref()?.i64_value()
        }

        pub fn float_value(&self) -> Result<f32> {
            self.current_ref()?.float_value()
        }

        pub fn unsigned_value(&self) -> Result<u64> {
            self.current_ref()?.unsigned_value()
        }

        pub fn signed_value(&self) -> Result<i64> {
            self.current_ref()?.signed_value()
        }

        pub fn string_value(&self) -> Result<&str> {
            self.current_ref()?.string_value()
        }

        pub fn binary_value(&self) -> Result<$crate::field::Binary<'_>> {
            self.current_ref()?.binary_value()
        }

        /// Current field decoded into an owned value tree.
        pub fn value(&self) -> Result<$crate::value::CarbonValue> {
            $crate::value::CarbonValue::decode(self.file.data(), self.current_offset()?)
        }

        /// Nested array iterator over the current field.
        pub fn array_value(&mut self) -> Result<ArrayIter<'_>> {
            let offset = self.current_offset()?;
            ArrayIter::open(self.file.reborrow(), offset)
        }

        /// Nested object iterator over the current field.
        pub fn object_value(&mut self) -> Result<ObjectIter<'_>> {
            let offset = self.current_offset()?;
            ObjectIter::open(self.file.reborrow(), offset)
        }

        /// Nested column iterator over the current field.
        pub fn column_value(&mut self) -> Result<ColumnIter<'_>> {
            let offset = self.current_offset()?;
            ColumnIter::open(self.file.reborrow(), offset)
        }

        pub fn update_null(&mut self) -> Result<()> {
            self.update(&Scalar::Null)
        }

        pub fn update_true(&mut self) -> Result<()> {
            self.update(&Scalar::Bool(true))
        }

        pub fn update_false(&mut self) -> Result<()> {
            self.update(&Scalar::Bool(false))
        }

        pub fn update_bool(&mut self, value: bool) -> Result<()> {
            self.update(&Scalar::Bool(value))
        }

        pub fn update_u8(&mut self, value: u8) -> Result<()> {
            self.update(&Scalar::U8(value))
        }

        pub fn update_u16(&mut self, value: u16) -> Result<()> {
            self.update(&Scalar::U16(value))
        }

        pub fn update_u32(&mut self, value: u32) -> Result<()> {
            self.update(&Scalar::U32(value))
        }

        pub fn update_u64(&mut self, value: u64) -> Result<()> {
            self.update(&Scalar::U64(value))
        }

        pub fn update_i8(&mut self, value: i8) -> Result<()> {
            self.update(&Scalar::I8(value))
        }

        pub fn update_i16(&mut self, value: i16) -> Result<()> {
            self.update(&Scalar::I16(value))
        }

        pub fn update_i32(&mut self, value: i32) -> Result<()> {
            self.update(&Scalar::I32(value))
        }

        pub fn update_i64(&mut self, value: i64) -> Result<()> {
            self.update(&Scalar::I64(value))
        }

        pub fn update_float(&mut self, value: f32) -> Result<()> {
            self.update(&Scalar::Float(value))
        }

        pub fn update_string(&mut self, value: &str) -> Result<()> {
            self.update(&Scalar::String(value))
        }

        pub fn update_binary(&mut self, data: &[u8], mime: MimeType) -> Result<()> {
            self.update(&Scalar::Binary { data, mime })
        }

        pub fn update_custom_binary(&mut self, data: &[u8], type_name: &str) -> Result<()> {
            self.update(&Scalar::CustomBinary { data, type_name })
        }

        pub fn update_array_begin(&mut self) -> Result<()> {
            Err(CarbonError::NotImplemented("in-place update to an array"))
        }

        pub fn update_object_begin(&mut self) -> Result<()> {
            Err(CarbonError::NotImplemented("in-place update to an object"))
        }

        pub fn update_column_begin(&mut self) -> Result<()> {
            Err(CarbonError::NotImplemented("in-place update to a column"))
        }

        /// Update the current field in place under the shared update rules.
        pub fn update(&mut self, value: &Scalar<'_>) -> Result<()> {
            let offset = self.current_offset()?;
            $crate::iter::update_field(&mut self.file, offset, value)
        }

        /// Overwrite the current field with any scalar, whatever its type.
        pub fn replace(&mut self, value: &Scalar<'_>) -> Result<()> {
            let offset = self.current_offset()?;
            $crate::iter::replace_field(&mut self.file, offset, value)
        }
    };
}

mod array;
mod column;
mod object;

pub use array::ArrayIter;
pub use column::{ColumnIter, ColumnSlots};
pub use object::ObjectIter;

use crate::error::{CarbonError, Result};
use crate::field::{FieldRef, FieldType, Scalar, field_size, write_field_into};
use crate::memfile::MemFile;

/// Replace `old_len` bytes at `offset` with `new_data` using a single shift.
pub(crate) fn splice(
    file: &mut MemFile<'_>,
    offset: usize,
    old_len: usize,
    new_data: &[u8],
) -> Result<()> {
    let new_len = new_data.len();
    if new_len > old_len {
        file.seek(offset + old_len)?;
        file.inplace_insert(new_len - old_len)?;
    } else if new_len < old_len {
        file.seek(offset + new_len)?;
        file.inplace_remove(old_len - new_len)?;
    }
    file.seek(offset)?;
    file.write(new_data)
}

/// Overwrite the field at `offset` with `value`, changing its size if needed.
pub(crate) fn replace_field(file: &mut MemFile<'_>, offset: usize, value: &Scalar<'_>) -> Result<()> {
    let old_len = field_size(file.data(), offset)?;
    let current = FieldRef::at(file.data(), offset)?.field_type();
    let new_type = value.field_type();
    if current.is_constant() && new_type.is_constant() {
        return file.patch_byte(offset, new_type.marker());
    }
    let mut buf = Vec::with_capacity(16);
    write_field_into(&mut buf, value);
    splice(file, offset, old_len, &buf)
}

/// In-place scalar update rules shared by array and object iterators.
///
/// Containers cannot be updated in place. Strings only replace strings,
/// binaries only replace binaries, and fixed-width values only replace
/// fixed-width values; anything else is a type mismatch and must go through
/// remove and insert.
pub(crate) fn update_field(file: &mut MemFile<'_>, offset: usize, value: &Scalar<'_>) -> Result<()> {
    let current = FieldRef::at(file.data(), offset)?.field_type();
    if current.is_container() {
        return Err(CarbonError::NotImplemented(
            "in-place update of a container field",
        ));
    }
    let new_type = value.field_type();
    let compatible = if new_type.is_binary() {
        current.is_binary()
    } else if new_type == FieldType::String {
        current == FieldType::String
    } else {
        current.fixed_payload_width().is_some()
    };
    if !compatible {
        return Err(CarbonError::TypeMismatch {
            expected: new_type.name(),
            actual: current.name(),
        });
    }
    replace_field(file, offset, value)
}
