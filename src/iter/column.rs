use crate::error::{CarbonError, Result};
use crate::field::{ColumnHeader, ColumnType, ListDerivation, Scalar, column_slot};
use crate::insert::ColumnInsert;
use crate::memfile::MemFile;
use crate::types::{BOOLEAN_COLUMN_FALSE, BOOLEAN_COLUMN_TRUE};

#[inline]
fn le_bytes<const N: usize>(slot: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&slot[..N]);
    out
}

/// Decode one column slot. Sentinel slots decode to [`Scalar::Null`].
pub(crate) fn decode_slot(column_type: ColumnType, slot: &[u8]) -> Scalar<'static> {
    if column_type.is_null_slot(slot) {
        return Scalar::Null;
    }
    match column_type {
        ColumnType::U8 => Scalar::U8(slot[0]),
        ColumnType::U16 => Scalar::U16(u16::from_le_bytes(le_bytes(slot))),
        ColumnType::U32 => Scalar::U32(u32::from_le_bytes(le_bytes(slot))),
        ColumnType::U64 => Scalar::U64(u64::from_le_bytes(le_bytes(slot))),
        ColumnType::I8 => Scalar::I8(slot[0] as i8),
        ColumnType::I16 => Scalar::I16(i16::from_le_bytes(le_bytes(slot))),
        ColumnType::I32 => Scalar::I32(i32::from_le_bytes(le_bytes(slot))),
        ColumnType::I64 => Scalar::I64(i64::from_le_bytes(le_bytes(slot))),
        ColumnType::Float => Scalar::Float(f32::from_le_bytes(le_bytes(slot))),
        ColumnType::Boolean => match slot[0] {
            BOOLEAN_COLUMN_FALSE => Scalar::Bool(false),
            BOOLEAN_COLUMN_TRUE => Scalar::Bool(true),
            _ => Scalar::Null,
        },
    }
}

// ─── ColumnSlots ────────────────────────────────────────────────────────────

/// Zero-copy view over the used slots of a column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSlots<'a> {
    column_type: ColumnType,
    bytes: &'a [u8],
}

impl<'a> ColumnSlots<'a> {
    pub(crate) fn new(data: &'a [u8], header: &ColumnHeader) -> Self {
        Self {
            column_type: header.column_type,
            bytes: &data[header.slots_offset..header.slot_offset(header.count)],
        }
    }

    #[inline]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.column_type.width()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Little-endian slot bytes, `len() * width` of them.
    #[inline]
    pub fn raw(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn get(&self, index: usize) -> Option<Scalar<'static>> {
        let width = self.column_type.width();
        let slot = self.bytes.get(index * width..(index + 1) * width)?;
        Some(decode_slot(self.column_type, slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = Scalar<'static>> + 'a {
        let column_type = self.column_type;
        self.bytes
            .chunks_exact(column_type.width())
            .map(move |slot| decode_slot(column_type, slot))
    }
}

// ─── ColumnIter ─────────────────────────────────────────────────────────────

/// Positional access to a column. Unlike arrays, the element count is stored
/// in the header, so `length` and indexed access are O(1).
#[derive(Debug)]
pub struct ColumnIter<'a> {
    file: MemFile<'a>,
    begin: usize,
}

impl<'a> ColumnIter<'a> {
    pub fn open(file: MemFile<'a>, begin: usize) -> Result<Self> {
        ColumnHeader::parse(file.data(), begin)?;
        Ok(Self { file, begin })
    }

    #[inline]
    pub fn begin_offset(&self) -> usize {
        self.begin
    }

    /// Header is re-read on every call; inserts may have moved the slots.
    pub fn header(&self) -> Result<ColumnHeader> {
        ColumnHeader::parse(self.file.data(), self.begin)
    }

    pub fn column_type(&self) -> Result<ColumnType> {
        Ok(self.header()?.column_type)
    }

    pub fn length(&self) -> Result<usize> {
        Ok(self.header()?.count)
    }

    pub fn capacity(&self) -> Result<usize> {
        Ok(self.header()?.capacity)
    }

    pub fn values(&self) -> Result<ColumnSlots<'_>> {
        let header = self.header()?;
        Ok(ColumnSlots::new(self.file.data(), &header))
    }

    fn check_index(header: &ColumnHeader, index: usize) -> Result<()> {
        if index >= header.count {
            return Err(CarbonError::OutOfBounds(format!(
                "column index {index} out of {} elements",
                header.count
            )));
        }
        Ok(())
    }

    pub fn value(&self, index: usize) -> Result<Scalar<'static>> {
        let header = self.header()?;
        Self::check_index(&header, index)?;
        let at = header.slot_offset(index);
        Ok(decode_slot(
            header.column_type,
            &self.file.data()[at..at + header.column_type.width()],
        ))
    }

    pub fn is_null(&self, index: usize) -> Result<bool> {
        Ok(matches!(self.value(index)?, Scalar::Null))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Abstract type
    // ════════════════════════════════════════════════════════════════════════

    pub fn derivation(&self) -> Result<ListDerivation> {
        Ok(self.header()?.derivation)
    }

    pub fn is_multiset(&self) -> Result<bool> {
        Ok(self.derivation()?.is_multiset())
    }

    pub fn is_sorted(&self) -> Result<bool> {
        Ok(self.derivation()?.is_sorted())
    }

    pub fn update_type(&mut self, derivation: ListDerivation) -> Result<()> {
        let column_type = self.column_type()?;
        self.file
            .patch_byte(self.begin, column_type.marker(derivation))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Slot updates
    // ════════════════════════════════════════════════════════════════════════

    /// Overwrite slot `index` in place. `Scalar::Null` writes the sentinel.
    pub fn update_set(&mut self, index: usize, value: &Scalar<'_>) -> Result<()> {
        let header = self.header()?;
        Self::check_index(&header, index)?;
        let (slot, width) = column_slot(header.column_type, value).ok_or_else(|| {
            CarbonError::TypeMismatch {
                expected: header.column_type.name(),
                actual: value.field_type().name(),
            }
        })?;
        self.file.seek(header.slot_offset(index))?;
        self.file.write(&slot[..width])
    }

    pub fn update_set_null(&mut self, index: usize) -> Result<()> {
        self.update_set(index, &Scalar::Null)
    }

    pub fn update_set_true(&mut self, index: usize) -> Result<()> {
        self.update_set(index, &Scalar::Bool(true))
    }

    pub fn update_set_false(&mut self, index: usize) -> Result<()> {
        self.update_set(index, &Scalar::Bool(false))
    }

    pub fn update_set_u8(&mut self, index: usize, value: u8) -> Result<()> {
        self.update_set(index, &Scalar::U8(value))
    }

    pub fn update_set_u16(&mut self, index: usize, value: u16) -> Result<()> {
        self.update_set(index, &Scalar::U16(value))
    }

    pub fn update_set_u32(&mut self, index: usize, value: u32) -> Result<()> {
        self.update_set(index, &Scalar::U32(value))
    }

    pub fn update_set_u64(&mut self, index: usize, value: u64) -> Result<()> {
        self.update_set(index, &Scalar::U64(value))
    }

    pub fn update_set_i8(&mut self, index: usize, value: i8) -> Result<()> {
        self.update_set(index, &Scalar::I8(value))
    }

    pub fn update_set_i16(&mut self, index: usize, value: i16) -> Result<()> {
        self.update_set(index, &Scalar::I16(value))
    }

    pub fn update_set_i32(&mut self, index: usize, value: i32) -> Result<()> {
        self.update_set(index, &Scalar::I32(value))
    }

    pub fn update_set_i64(&mut self, index: usize, value: i64) -> Result<()> {
        self.update_set(index, &Scalar::I64(value))
    }

    pub fn update_set_float(&mut self, index: usize, value: f32) -> Result<()> {
        self.update_set(index, &Scalar::Float(value))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Structural changes
    // ════════════════════════════════════════════════════════════════════════

    /// Remove element `index`, shifting later slots down. Capacity is kept;
    /// the freed slot becomes a sentinel.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        let header = self.header()?;
        Self::check_index(&header, index)?;
        let width = header.column_type.width();
        let start = header.slot_offset(index);
        let used_end = header.slot_offset(header.count);
        let tail = self.file.data()[start + width..used_end].to_vec();
        let (null, _) = header.column_type.null_slot();

        self.file.seek(start)?;
        self.file.write(&tail)?;
        self.file.write(&null[..width])?;
        self.file.seek(header.count_offset)?;
        self.file.update_uintvar_stream(header.count as u64 - 1)?;
        Ok(())
    }

    /// Open an appending insert builder.
    pub fn insert_begin(&mut self) -> Result<ColumnInsert<'_>> {
        if !self.file.is_writable() {
            return Err(CarbonError::WriteProtect);
        }
        ColumnInsert::new(self.file.reborrow(), self.begin)
    }
}
