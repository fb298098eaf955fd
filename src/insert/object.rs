use super::{
    ArrayInsert, ColumnInsert, Inserter, Nested, NestedArray, NestedColumn, NestedObject,
    encode_empty_array, encode_empty_column, encode_empty_object, place,
};
use crate::error::Result;
use crate::field::{
    ColumnType, ListDerivation, MapDerivation, MimeType, Scalar, write_field_into, write_key_into,
};
use crate::memfile::MemFile;

/// Writes `key: value` properties into an object at a fixed write cursor.
#[derive(Debug)]
pub struct ObjectInsert<'a> {
    file: MemFile<'a>,
    position: usize,
    scratch: Vec<u8>,
}

impl<'a> ObjectInsert<'a> {
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

    pub fn end(self) -> usize {
        self.position
    }

    pub fn insert(&mut self, key: &str, value: &Scalar<'_>) -> Result<()> {
        self.scratch.clear();
        write_key_into(&mut self.scratch, key);
        write_field_into(&mut self.scratch, value);
        self.flush_scratch()
    }

    pub fn insert_null(&mut self, key: &str) -> Result<()> {
        self.insert(key, &Scalar::Null)
    }

    pub fn insert_true(&mut self, key: &str) -> Result<()> {
        self.insert(key, &Scalar::Bool(true))
    }

    pub fn insert_false(&mut self, key: &str) -> Result<()> {
        self.insert(key, &Scalar::Bool(false))
    }

    pub fn insert_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.insert(key, &Scalar::Bool(value))
    }

    pub fn insert_u8(&mut self, key: &str, value: u8) -> Result<()> {
        self.insert(key, &Scalar::U8(value))
    }

    pub fn insert_u16(&mut self, key: &str, value: u16) -> Result<()> {
        self.insert(key, &Scalar::U16(value))
    }

    pub fn insert_u32(&mut self, key: &str, value: u32) -> Result<()> {
        self.insert(key, &Scalar::U32(value))
    }

    pub fn insert_u64(&mut self, key: &str, value: u64) -> Result<()> {
        self.insert(key, &Scalar::U64(value))
    }

    pub fn insert_i8(&mut self, key: &str, value: i8) -> Result<()> {
        self.insert(key, &Scalar::I8(value))
    }

    pub fn insert_i16(&mut self, key: &str, value: i16) -> Result<()> {
        self.insert(key, &Scalar::I16(value))
    }

    pub fn insert_i32(&mut self, key: &str, value: i32) -> Result<()> {
        self.insert(key, &Scalar::I32(value))
    }

    pub fn insert_i64(&mut self, key: &str, value: i64) -> Result<()> {
        self.insert(key, &Scalar::I64(value))
    }

    pub fn insert_unsigned(&mut self, key: &str, value: u64) -> Result<()> {
        self.insert(key, &Scalar::unsigned(value))
    }

    pub fn insert_signed(&mut self, key: &str, value: i64) -> Result<()> {
        self.insert(key, &Scalar::signed(value))
    }

    pub fn insert_float(&mut self, key: &str, value: f32) -> Result<()> {
        self.insert(key, &Scalar::Float(value))
    }

    pub fn insert_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.insert(key, &Scalar::String(value))
    }

    pub fn insert_binary(&mut self, key: &str, data: &[u8], mime: MimeType) -> Result<()> {
        self.insert(key, &Scalar::Binary { data, mime })
    }

    pub fn insert_custom_binary(&mut self, key: &str, data: &[u8], type_name: &str) -> Result<()> {
        self.insert(key, &Scalar::CustomBinary { data, type_name })
    }

    // ════════════════════════════════════════════════════════════════════════
    // Nested containers
    // ════════════════════════════════════════════════════════════════════════

    /// Write the key, then the empty container produced by `encode`.
    /// Returns the offset of the container's begin marker.
    fn write_keyed(&mut self, key: &str, encode: impl FnOnce(&mut Vec<u8>)) -> Result<usize> {
        self.scratch.clear();
        write_key_into(&mut self.scratch, key);
        let begin = self.position + self.scratch.len();
        encode(&mut self.scratch);
        self.flush_scratch()?;
        Ok(begin)
    }

    pub fn insert_array(
        &mut self,
        key: &str,
        derivation: ListDerivation,
        capacity: usize,
    ) -> Result<NestedArray<'_>> {
        let begin = self.write_keyed(key, |buf| encode_empty_array(buf, derivation, capacity))?;
        let inner = ArrayInsert::new(self.file.reborrow(), begin + 1);
        Ok(Nested::new(inner, &mut self.position, begin))
    }

    pub fn insert_object(
        &mut self,
        key: &str,
        derivation: MapDerivation,
        capacity: usize,
    ) -> Result<NestedObject<'_>> {
        let begin = self.write_keyed(key, |buf| encode_empty_object(buf, derivation, capacity))?;
        let inner = ObjectInsert::new(self.file.reborrow(), begin + 1);
        Ok(Nested::new(inner, &mut self.position, begin))
    }

    pub fn insert_column(
        &mut self,
        key: &str,
        column_type: ColumnType,
        derivation: ListDerivation,
        capacity: usize,
    ) -> Result<NestedColumn<'_>> {
        let begin = self.write_keyed(key, |buf| {
            encode_empty_column(buf, column_type, derivation, capacity)
        })?;
        let inner = ColumnInsert::new(self.file.reborrow(), begin)?;
        Ok(Nested::new(inner, &mut self.position, begin))
    }
}

impl Inserter for ObjectInsert<'_> {
    fn position(&self) -> usize {
        self.position
    }

    fn document(&self) -> &[u8] {
        self.file.data()
    }
}
