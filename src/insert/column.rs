use super::Inserter;
use crate::error::{CarbonError, Result};
use crate::field::{ColumnHeader, ColumnType, Scalar, column_slot};
use crate::memfile::MemFile;
use tracing::trace;

/// Appends values to a column, doubling its capacity when it is full.
#[derive(Debug)]
pub struct ColumnInsert<'a> {
    file: MemFile<'a>,
    begin: usize,
    column_type: ColumnType,
}

impl<'a> ColumnInsert<'a> {
    pub(crate) fn new(file: MemFile<'a>, begin: usize) -> Result<Self> {
        let header = ColumnHeader::parse(file.data(), begin)?;
        Ok(Self {
            file,
            begin,
            column_type: header.column_type,
        })
    }

    #[inline]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    fn header(&self) -> Result<ColumnHeader> {
        ColumnHeader::parse(self.file.data(), self.begin)
    }

    /// Number of elements in the column so far.
    pub fn length(&self) -> Result<usize> {
        Ok(self.header()?.count)
    }

    fn grow(&mut self, header: &ColumnHeader) -> Result<()> {
        let new_capacity = (header.capacity * 2).max(1);
        let extra = new_capacity - header.capacity;
        let (null, width) = self.column_type.null_slot();

        self.file.seek(header.end())?;
        self.file.inplace_insert(extra * width)?;
        for _ in 0..extra {
            self.file.write(&null[..width])?;
        }
        self.file.seek(header.capacity_offset)?;
        self.file.update_uintvar_stream(new_capacity as u64)?;
        trace!(
            column = self.begin,
            from = header.capacity,
            to = new_capacity,
            "column capacity grown"
        );
        Ok(())
    }

    /// Append `value`. `Scalar::Null` appends the type's sentinel; values of
    /// another kind, out of range, or equal to the sentinel are rejected.
    pub fn insert(&mut self, value: &Scalar<'_>) -> Result<()> {
        let (slot, width) = column_slot(self.column_type, value).ok_or_else(|| {
            CarbonError::TypeMismatch {
                expected: self.column_type.name(),
                actual: value.field_type().name(),
            }
        })?;
        let mut header = self.header()?;
        if header.count == header.capacity {
            self.grow(&header)?;
            header = self.header()?;
        }
        self.file.seek(header.slot_offset(header.count))?;
        self.file.write(&slot[..width])?;
        self.file.seek(header.count_offset)?;
        self.file.update_uintvar_stream(header.count as u64 + 1)?;
        Ok(())
    }

    pub fn insert_null(&mut self) -> Result<()> {
        self.insert(&Scalar::Null)
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

    pub fn insert_float(&mut self, value: f32) -> Result<()> {
        self.insert(&Scalar::Float(value))
    }

    pub fn end(self) {}
}

impl Inserter for ColumnInsert<'_> {
    fn position(&self) -> usize {
        self.begin
    }

    fn document(&self) -> &[u8] {
        self.file.data()
    }
}
