//! Exact encoded sizes of fields.
//!
//! Removing or replacing a field shifts the buffer by exactly the number of
//! bytes computed here, so every field kind is handled explicitly and an
//! unrecognised marker is an internal error rather than a guess.

use super::kind::{ColumnType, FieldType, ListDerivation, column_of_marker};
use crate::error::{CarbonError, Result};
use crate::types::{MARKER_ARRAY_END, MARKER_OBJECT_END, MARKER_STRING};
use crate::varuint::decode_varuint;

#[inline]
fn byte_at(data: &[u8], at: usize, what: &str) -> Result<u8> {
    data.get(at).copied().ok_or_else(|| {
        CarbonError::Corrupted(format!("{what} truncated at offset {at}"))
    })
}

#[inline]
fn varuint_at(data: &[u8], at: usize, what: &str) -> Result<(u64, usize)> {
    let tail = data.get(at..).unwrap_or(&[]);
    decode_varuint(tail).map_err(|_| {
        CarbonError::Corrupted(format!("{what}: bad varuint at offset {at}"))
    })
}

#[inline]
fn check_end(data: &[u8], end: usize, what: &str) -> Result<()> {
    if end > data.len() {
        return Err(CarbonError::Corrupted(format!(
            "{what} ends at {end}, past document end {}",
            data.len()
        )));
    }
    Ok(())
}

/// Size of a `[varuint len][len bytes]` run starting at `at`.
pub fn length_prefixed_size(data: &[u8], at: usize, what: &str) -> Result<usize> {
    let (len, width) = varuint_at(data, at, what)?;
    let size = usize::try_from(len)
        .ok()
        .and_then(|len| len.checked_add(width))
        .filter(|&size| at.checked_add(size).is_some_and(|end| end <= data.len()))
        .ok_or_else(|| {
            CarbonError::Corrupted(format!("{what}: length {len} at offset {at} past document end"))
        })?;
    Ok(size)
}

/// Size of an object property key (`['s'][varuint len][bytes]`) at `at`.
pub fn key_size(data: &[u8], at: usize) -> Result<usize> {
    let marker = byte_at(data, at, "object key")?;
    if marker != MARKER_STRING {
        return Err(CarbonError::Corrupted(format!(
            "expected key marker at offset {at}, found {marker:#04x}"
        )));
    }
    Ok(1 + length_prefixed_size(data, at + 1, "object key")?)
}

/// Skip zero slack starting at `at` and require `end_marker` afterwards.
/// Returns the offset of the end marker.
pub fn skip_slack(data: &[u8], mut at: usize, end_marker: u8, what: &str) -> Result<usize> {
    loop {
        match byte_at(data, at, what)? {
            0 => at += 1,
            b if b == end_marker => return Ok(at),
            other => {
                return Err(CarbonError::Corrupted(format!(
                    "{what}: marker {other:#04x} after slack at offset {at}"
                )));
            }
        }
    }
}

/// Parsed column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnHeader {
    pub column_type: ColumnType,
    pub derivation: ListDerivation,
    pub count: usize,
    pub capacity: usize,
    /// Offset of the `count` varuint.
    pub count_offset: usize,
    /// Offset of the `capacity` varuint.
    pub capacity_offset: usize,
    /// Offset of the first slot.
    pub slots_offset: usize,
}

impl ColumnHeader {
    pub fn parse(data: &[u8], begin: usize) -> Result<Self> {
        let (column_type, derivation) = column_of_marker(byte_at(data, begin, "column")?)?;
        let count_offset = begin + 1;
        let (count, count_width) = varuint_at(data, count_offset, "column count")?;
        let capacity_offset = count_offset + count_width;
        let (capacity, cap_width) = varuint_at(data, capacity_offset, "column capacity")?;
        if count > capacity {
            return Err(CarbonError::Corrupted(format!(
                "column at {begin} holds {count} elements but capacity {capacity}"
            )));
        }
        let slots_offset = capacity_offset + cap_width;
        // slot_offset is unchecked, so the whole slot run must fit first
        usize::try_from(capacity)
            .ok()
            .and_then(|cap| cap.checked_mul(column_type.width()))
            .and_then(|len| len.checked_add(slots_offset))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                CarbonError::Corrupted(format!(
                    "column at {begin} declares capacity {capacity} past document end {}",
                    data.len()
                ))
            })?;
        let header = Self {
            column_type,
            derivation,
            count: count as usize,
            capacity: capacity as usize,
            count_offset,
            capacity_offset,
            slots_offset,
        };
        Ok(header)
    }

    #[inline]
    pub fn slot_offset(&self, index: usize) -> usize {
        self.slots_offset + index * self.column_type.width()
    }

    /// One past the last slot.
    #[inline]
    pub fn end(&self) -> usize {
        self.slot_offset(self.capacity)
    }
}

fn array_size(data: &[u8], begin: usize) -> Result<usize> {
    let mut at = begin + 1;
    loop {
        match byte_at(data, at, "array")? {
            MARKER_ARRAY_END => return Ok(at + 1 - begin),
            0 => {
                let end = skip_slack(data, at, MARKER_ARRAY_END, "array")?;
                return Ok(end + 1 - begin);
            }
            _ => at += field_size(data, at)?,
        }
    }
}

fn object_size(data: &[u8], begin: usize) -> Result<usize> {
    let mut at = begin + 1;
    loop {
        match byte_at(data, at, "object")? {
            MARKER_OBJECT_END => return Ok(at + 1 - begin),
            0 => {
                let end = skip_slack(data, at, MARKER_OBJECT_END, "object")?;
                return Ok(end + 1 - begin);
            }
            _ => {
                at += key_size(data, at)?;
                at += field_size(data, at)?;
            }
        }
    }
}

/// Exact size in bytes, marker included, of the field starting at `offset`.
pub fn field_size(data: &[u8], offset: usize) -> Result<usize> {
    let marker = byte_at(data, offset, "field")?;
    let field_type = FieldType::from_marker(marker).map_err(|_| {
        CarbonError::Internal(format!(
            "cannot size field with unknown marker {marker:#04x} at offset {offset}"
        ))
    })?;
    let size = match field_type {
        FieldType::Null
        | FieldType::True
        | FieldType::False
        | FieldType::U8
        | FieldType::U16
        | FieldType::U32
        | FieldType::U64
        | FieldType::I8
        | FieldType::I16
        | FieldType::I32
        | FieldType::I64
        | FieldType::Float => {
            let width = field_type.fixed_payload_width().ok_or_else(|| {
                CarbonError::Internal(format!("{} has no fixed width", field_type.name()))
            })?;
            1 + width
        }
        FieldType::String => 1 + length_prefixed_size(data, offset + 1, "string")?,
        FieldType::Binary => {
            let (_, mime_width) = varuint_at(data, offset + 1, "binary mime type")?;
            1 + mime_width + length_prefixed_size(data, offset + 1 + mime_width, "binary")?
        }
        FieldType::CustomBinary => {
            let type_size = length_prefixed_size(data, offset + 1, "custom binary type")?;
            1 + type_size + length_prefixed_size(data, offset + 1 + type_size, "custom binary")?
        }
        FieldType::Array(_) => array_size(data, offset)?,
        FieldType::Object(_) => object_size(data, offset)?,
        FieldType::Column(..) => ColumnHeader::parse(data, offset)?.end() - offset,
    };
    check_end(data, offset + size, field_type.name())?;
    Ok(size)
}
