use super::{
    ColumnInsert, Inserter, Nested, NestedArray, NestedColumn, NestedObject, ObjectInsert,
    encode_empty_array, encode_empty_column, encode_empty_object, place,
};
use crate::error::Result;
use crate::field::{ColumnType, ListDerivation, MapDerivation, MimeType, Scalar, write_field_into};
use crate::memfile::MemFile;

/// Writes elements into an array at a fixed write cursor.
#[derive(Debug)]
pub struct ArrayInsert<'a> {
    file: MemFile<'a>,
    position: usize,
    scratch: Vec<u8>,
}

impl<'a> ArrayInsert<'a> {
    pub(crate) fn new(file: MemFile<'a>, position: usize) -> Self {
        Self {
            file,
            position,
            scratch: Vec::with_capacity(32),
        }
    }

    fn flush_scratch(&mut self) -> Result<()> {
        self.position = place(&mut self.file, self.position, &self.scratch)?;
        Ok(())
    }

    /// Finish inserting. Returns the offset after the last inserted element.
    pub fn end(self) -> usize {
        self.position
    }

    // ════════════════════════════════════════════════════════════════════════
    // Scalars
    // ════════════════════════════════════════════════════════════════════════

    pub fn insert(&mut self, value: &Scalar<'_>) -> Result<()> {
        self.scratch.clear();
        write_field_into(&mut self.scratch, value);
        self.flush_scratch()
    }

    pub fn insert_null(&mut self) -> Result<()> {
        self.insert(&Scalar::Null)
    }

    pub fn insert_true(&mut self) -> Result<()> {
        self.insert(&Scalar::Bool(true))
    }

    pub fn insert_false(&mut self) -> Result<()> {
        self.insert(&Scalar::Bool(false))
    }

    pub fn insert_bool(&mut self, value: bool) -> Result<()> {
        self.insert(&Scalar::Bool(value))
    }

    pub fn insert_u8(&mut self, value: u8) -> Result<()> {
        self.insert(&Scalar::U8(value))
    }

    pub fn insert_u16(&mut self, value: u16) -> Result<()> {
        self.insert(&Scalar::U16(value))
    }

    pub fn insert_u32(&mut self, value: u32) -> Result<()> {
        self.insert(&Scalar::U32(value))
    }

    pub fn insert_u64(&mut self, value: u64) -> Result<()> {
        self.insert(&Scalar::U64(value))
    }

    pub fn insert_i8(&mut self, value: i8) -> Result<()> {
        self.insert(&Scalar::I8(value))
    }

    pub fn insert_i16(&mut self, value: i16) -> Result<()> {
        self.insert(&Scalar::I16(value))
    }

    pub fn insert_i32(&mut self, value: i32) -> Result<()> {
        self.insert(&Scalar::I32(value))
    }

    pub fn insert_i64(&mut self, value: i64) -> Result<()> {
        self.insert(&Scalar::I64(value))
    }

    /// Narrowest unsigned field holding `value`.
    pub fn insert_unsigned(&mut self, value: u64) -> Result<()> {
        self.insert(&Scalar::unsigned(value))
    }

    /// Narrowest signed field holding `value`.
    pub fn insert_signed(&mut self, value: i64) -> Result<()> {
        self.insert(&Scalar::signed(value))
    }

    pub fn insert_float(&mut self, value: f32) -> Result<()> {
        self.insert(&Scalar::Float(value))
    }

    pub fn insert_string(&mut self, value: &str) -> Result<()> {
        self.insert(&Scalar::String(value))
    }

    pub fn insert_binary(&mut self, data: &[u8], mime: MimeType) -> Result<()> {
        self.insert(&Scalar::Binary { data, mime })
    }

    pub fn insert_custom_binary(&mut self, data: &[u8], type_name: &str) -> Result<()> {
        self.insert(&Scalar::CustomBinary { data, type_name })
    }

    // ════════════════════════════════════════════════════════════════════════
    // Nested containers
    // ════════════════════════════════════════════════════════════════════════

    /// Insert an empty array with `capacity` bytes of slack and return a
    /// builder for its elements.
    pub fn insert_array(
        &mut self,
        derivation: ListDerivation,
        capacity: usize,
    ) -> Result<NestedArray<'_>> {
        let begin = self.position;
        self.scratch.clear();
        encode_empty_array(&mut self.scratch, derivation, capacity);
        self.flush_scratch()?;
        let inner = ArrayInsert::new(self.file.reborrow(), begin + 1);
        Ok(Nested::new(inner, &mut self.position, begin))
    }

    pub fn insert_object(
        &mut self,
        derivation: MapDerivation,
        capacity: usize,
    ) -> Result<NestedObject<'_>> {
        let begin = self.position;
        self.scratch.clear();
        encode_empty_object(&mut self.scratch, derivation, capacity);
        self.flush_scratch()?;
        let inner = ObjectInsert::new(self.file.reborrow(), begin + 1);
        Ok(Nested::new(inner, &mut self.position, begin))
    }

    pub fn insert_column(
        &mut self,
        column_type: ColumnType,
        derivation: ListDerivation,
        capacity: usize,
    ) -> Result<NestedColumn<'_>> {
        let begin = self.position;
        self.scratch.clear();
        encode_empty_column(&mut self.scratch, column_type, derivation, capacity);
        self.flush_scratch()?;
        let inner = ColumnInsert::new(self.file.reborrow(), begin)?;
        Ok(Nested::new(inner, &mut self.position, begin))
    }
}

impl Inserter for ArrayInsert<'_> {
    fn position(&self) -> usize {
        self.position
    }

    fn document(&self) -> &[u8] {
        self.file.data()
    }
}
