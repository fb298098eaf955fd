use super::kind::FieldType;
use super::mime::MimeType;
use super::size::field_size;
use crate::error::{CarbonError, Result};
use crate::varuint::decode_varuint;

/// Type of a binary payload: a registered mime type or a custom type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryType<'a> {
    Mime(MimeType),
    Custom(&'a str),
}

impl BinaryType<'_> {
    pub fn name(&self) -> &str {
        match self {
            BinaryType::Mime(m) => m.name(),
            BinaryType::Custom(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binary<'a> {
    pub binary_type: BinaryType<'a>,
    pub data: &'a [u8],
}

/// A raw, zero-copy reference to one encoded field. No decoding happens until
/// a typed accessor is called.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    data: &'a [u8],
    offset: usize,
    field_type: FieldType,
}

impl<'a> FieldRef<'a> {
    /// Decode the marker at `offset` in `data`.
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        let marker = *data.get(offset).ok_or_else(|| {
            CarbonError::ReadOutOfBounds(format!("no field at offset {offset}"))
        })?;
        Ok(Self {
            data,
            offset,
            field_type: FieldType::from_marker(marker)?,
        })
    }

    #[inline]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Offset of the field's marker byte in the document.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Exact encoded size, marker included.
    pub fn size(&self) -> Result<usize> {
        field_size(self.data, self.offset)
    }

    fn mismatch(&self, expected: &'static str) -> CarbonError {
        CarbonError::TypeMismatch {
            expected,
            actual: self.field_type.name(),
        }
    }

    fn payload<const N: usize>(&self) -> Result<[u8; N]> {
        let start = self.offset + 1;
        self.data
            .get(start..start + N)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                CarbonError::ReadOutOfBounds(format!("{} payload at {start}", self.field_type.name()))
            })
    }

    fn varuint(&self, at: usize) -> Result<(u64, usize)> {
        decode_varuint(self.data.get(at..).unwrap_or(&[]))
    }

    fn slice(&self, at: usize, len: usize) -> Result<&'a [u8]> {
        let end = at.checked_add(len);
        end.and_then(|end| self.data.get(at..end)).ok_or_else(|| {
            CarbonError::ReadOutOfBounds(format!("{len} bytes at {at}"))
        })
    }

    // ════════════════════════════════════════════════════════════════════════
    // Typed access
    // ════════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn is_null(&self) -> bool {
        self.field_type == FieldType::Null
    }

    pub fn bool_value(&self) -> Result<bool> {
        match self.field_type {
            FieldType::True => Ok(true),
            FieldType::False => Ok(false),
            _ => Err(self.mismatch("boolean")),
        }
    }

    pub fn u8_value(&self) -> Result<u8> {
        match self.field_type {
            FieldType::U8 => Ok(u8::from_le_bytes(self.payload()?)),
            _ => Err(self.mismatch("u8")),
        }
    }

    pub fn u16_value(&self) -> Result<u16> {
        match self.field_type {
            FieldType::U16 => Ok(u16::from_le_bytes(self.payload()?)),
            _ => Err(self.mismatch("u16")),
        }
    }

    pub fn u32_value(&self) -> Result<u32> {
        match self.field_type {
            FieldType::U32 => Ok(u32::from_le_bytes(self.payload()?)),
            _ => Err(self.mismatch("u32")),
        }
    }

    pub fn u64_value(&self) -> Result<u64> {
        match self.field_type {
            FieldType::U64 => Ok(u64::from_le_bytes(self.payload()?)),
            _ => Err(self.mismatch("u64")),
        }
    }

    pub fn i8_value(&self) -> Result<i8> {
        match self.field_type {
            FieldType::I8 => Ok(i8::from_le_bytes(self.payload()?)),
            _ => Err(self.mismatch("i8")),
        }
    }

    pub fn i16_value(&self) -> Result<i16> {
        match self.field_type {
            FieldType::I16 => Ok(i16::from_le_bytes(self.payload()?)),
            _ => Err(self.mismatch("i16")),
        }
    }

    pub fn i32_value(&self) -> Result<i32> {
        match self.field_type {
            FieldType::I32 => Ok(i32::from_le_bytes(self.payload()?)),
            _ => Err(self.mismatch("i32")),
        }
    }

    pub fn i64_value(&self) -> Result<i64> {
        match self.field_type {
            FieldType::I64 => Ok(i64::from_le_bytes(self.payload()?)),
            _ => Err(self.mismatch("i64")),
        }
    }

    pub fn float_value(&self) -> Result<f32> {
        match self.field_type {
            FieldType::Float => Ok(f32::from_le_bytes(self.payload()?)),
            _ => Err(self.mismatch("float")),
        }
    }

    /// Any unsigned field widened to `u64`.
    pub fn unsigned_value(&self) -> Result<u64> {
        Ok(match self.field_type {
            FieldType::U8 => self.u8_value()? as u64,
            FieldType::U16 => self.u16_value()? as u64,
            FieldType::U32 => self.u32_value()? as u64,
            FieldType::U64 => self.u64_value()?,
            _ => return Err(self.mismatch("unsigned integer")),
        })
    }

    /// Any signed field widened to `i64`.
    pub fn signed_value(&self) -> Result<i64> {
        Ok(match self.field_type {
            FieldType::I8 => self.i8_value()? as i64,
            FieldType::I16 => self.i16_value()? as i64,
            FieldType::I32 => self.i32_value()? as i64,
            FieldType::I64 => self.i64_value()?,
            _ => return Err(self.mismatch("signed integer")),
        })
    }

    /// Any numeric field as `f64`.
    pub fn number_as_f64(&self) -> Result<f64> {
        if self.field_type.is_unsigned() {
            Ok(self.unsigned_value()? as f64)
        } else if self.field_type.is_signed() {
            Ok(self.signed_value()? as f64)
        } else if self.field_type == FieldType::Float {
            Ok(self.float_value()? as f64)
        } else {
            Err(self.mismatch("number"))
        }
    }

    /// String payload (zero-copy).
    pub fn string_value(&self) -> Result<&'a str> {
        if self.field_type != FieldType::String {
            return Err(self.mismatch("string"));
        }
        let (len, width) = self.varuint(self.offset + 1)?;
        let bytes = self.slice(self.offset + 1 + width, len as usize)?;
        std::str::from_utf8(bytes)
            .map_err(|e| CarbonError::Corrupted(format!("string at {}: {e}", self.offset)))
    }

    /// Binary payload and its type (zero-copy).
    pub fn binary_value(&self) -> Result<Binary<'a>> {
        let mut at = self.offset + 1;
        let binary_type = match self.field_type {
            FieldType::Binary => {
                let (id, width) = self.varuint(at)?;
                at += width;
                BinaryType::Mime(MimeType::from_id(id).ok_or_else(|| {
                    CarbonError::Corrupted(format!("unknown mime type id {id}"))
                })?)
            }
            FieldType::CustomBinary => {
                let (len, width) = self.varuint(at)?;
                let name = self.slice(at + width, len as usize)?;
                at += width + len as usize;
                BinaryType::Custom(std::str::from_utf8(name).map_err(|e| {
                    CarbonError::Corrupted(format!("custom binary type name: {e}"))
                })?)
            }
            _ => return Err(self.mismatch("binary")),
        };
        let (len, width) = self.varuint(at)?;
        let data = self.slice(at + width, len as usize)?;
        Ok(Binary { binary_type, data })
    }
}
