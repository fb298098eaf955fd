use super::kind::{ColumnType, FieldType};
use super::mime::MimeType;
use crate::types::{
    BOOLEAN_COLUMN_FALSE, BOOLEAN_COLUMN_TRUE, MARKER_STRING, NULL_I8, NULL_I16, NULL_I32, NULL_I64,
};
use crate::varuint::{MAX_VARUINT_LEN, encode_varuint};

/// A scalar value ready to be encoded as a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'v> {
    Null,
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Float(f32),
    String(&'v str),
    Binary { data: &'v [u8], mime: MimeType },
    CustomBinary { data: &'v [u8], type_name: &'v str },
}

impl<'v> Scalar<'v> {
    /// Narrowest unsigned field that holds `value`.
    pub fn unsigned(value: u64) -> Self {
        if let Ok(v) = u8::try_from(value) {
            Scalar::U8(v)
        } else if let Ok(v) = u16::try_from(value) {
            Scalar::U16(v)
        } else if let Ok(v) = u32::try_from(value) {
            Scalar::U32(v)
        } else {
            Scalar::U64(value)
        }
    }

    /// Narrowest signed field that holds `value`.
    pub fn signed(value: i64) -> Self {
        if let Ok(v) = i8::try_from(value) {
            Scalar::I8(v)
        } else if let Ok(v) = i16::try_from(value) {
            Scalar::I16(v)
        } else if let Ok(v) = i32::try_from(value) {
            Scalar::I32(v)
        } else {
            Scalar::I64(value)
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Scalar::Null => FieldType::Null,
            Scalar::Bool(true) => FieldType::True,
            Scalar::Bool(false) => FieldType::False,
            Scalar::U8(_) => FieldType::U8,
            Scalar::U16(_) => FieldType::U16,
            Scalar::U32(_) => FieldType::U32,
            Scalar::U64(_) => FieldType::U64,
            Scalar::I8(_) => FieldType::I8,
            Scalar::I16(_) => FieldType::I16,
            Scalar::I32(_) => FieldType::I32,
            Scalar::I64(_) => FieldType::I64,
            Scalar::Float(_) => FieldType::Float,
            Scalar::String(_) => FieldType::String,
            Scalar::Binary { .. } => FieldType::Binary,
            Scalar::CustomBinary { .. } => FieldType::CustomBinary,
        }
    }
}

#[inline]
fn push_varuint(buf: &mut Vec<u8>, value: u64) {
    let mut tmp = [0u8; MAX_VARUINT_LEN];
    let n = encode_varuint(value, &mut tmp);
    buf.extend_from_slice(&tmp[..n]);
}

/// Append the payload of `value` (everything after the marker) to `buf`.
pub fn write_payload_into(buf: &mut Vec<u8>, value: &Scalar<'_>) {
    match *value {
        Scalar::Null | Scalar::Bool(_) => {}
        Scalar::U8(v) => buf.push(v),
        Scalar::U16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::U32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::U64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::I8(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::I16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::I32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::I64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::Float(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Scalar::String(s) => {
            push_varuint(buf, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Scalar::Binary { data, mime } => {
            push_varuint(buf, mime.id());
            push_varuint(buf, data.len() as u64);
            buf.extend_from_slice(data);
        }
        Scalar::CustomBinary { data, type_name } => {
            push_varuint(buf, type_name.len() as u64);
            buf.extend_from_slice(type_name.as_bytes());
            push_varuint(buf, data.len() as u64);
            buf.extend_from_slice(data);
        }
    }
}

/// Append marker and payload of `value` to `buf`. Returns the field type written.
#[inline]
pub fn write_field_into(buf: &mut Vec<u8>, value: &Scalar<'_>) -> FieldType {
    let field_type = value.field_type();
    buf.push(field_type.marker());
    write_payload_into(buf, value);
    field_type
}

/// Append an object property key: string marker, varuint length, bytes.
///
/// The leading marker keeps a key of length 0 from reading as slack and a
/// key of length 125 from reading as the object terminator.
#[inline]
pub fn write_key_into(buf: &mut Vec<u8>, key: &str) {
    buf.push(MARKER_STRING);
    push_varuint(buf, key.len() as u64);
    buf.extend_from_slice(key.as_bytes());
}

/// Encode `value` as a column slot of type `ty`. `None` when the value does
/// not fit the column (wrong kind, out of range, or equal to the sentinel).
pub fn column_slot(ty: ColumnType, value: &Scalar<'_>) -> Option<([u8; 8], usize)> {
    if matches!(value, Scalar::Null) {
        return Some(ty.null_slot());
    }
    let mut slot = [0u8; 8];
    let width = ty.width();
    match (ty, *value) {
        (ColumnType::Boolean, Scalar::Bool(b)) => {
            slot[0] = if b { BOOLEAN_COLUMN_TRUE } else { BOOLEAN_COLUMN_FALSE }
        }
        (ColumnType::Float, Scalar::Float(f)) if !f.is_nan() => {
            slot[..4].copy_from_slice(&f.to_le_bytes())
        }
        (ColumnType::Boolean | ColumnType::Float, _) => return None,
        (_, v) => {
            let (unsigned, signed) = match v {
                Scalar::U8(x) => (Some(x as u64), i64::try_from(x).ok()),
                Scalar::U16(x) => (Some(x as u64), i64::try_from(x).ok()),
                Scalar::U32(x) => (Some(x as u64), i64::try_from(x).ok()),
                Scalar::U64(x) => (Some(x), i64::try_from(x).ok()),
                Scalar::I8(x) => (u64::try_from(x).ok(), Some(x as i64)),
                Scalar::I16(x) => (u64::try_from(x).ok(), Some(x as i64)),
                Scalar::I32(x) => (u64::try_from(x).ok(), Some(x as i64)),
                Scalar::I64(x) => (u64::try_from(x).ok(), Some(x)),
                _ => return None,
            };
            match ty {
                ColumnType::U8 => {
                    let x = u8::try_from(unsigned?).ok().filter(|&x| x != u8::MAX)?;
                    slot[0] = x;
                }
                ColumnType::U16 => {
                    let x = u16::try_from(unsigned?).ok().filter(|&x| x != u16::MAX)?;
                    slot[..width].copy_from_slice(&x.to_le_bytes());
                }
                ColumnType::U32 => {
                    let x = u32::try_from(unsigned?).ok().filter(|&x| x != u32::MAX)?;
                    slot[..width].copy_from_slice(&x.to_le_bytes());
                }
                ColumnType::U64 => {
                    let x = unsigned.filter(|&x| x != u64::MAX)?;
                    slot[..width].copy_from_slice(&x.to_le_bytes());
                }
                ColumnType::I8 => {
                    let x = i8::try_from(signed?).ok().filter(|&x| x != NULL_I8)?;
                    slot[..width].copy_from_slice(&x.to_le_bytes());
                }
                ColumnType::I16 => {
                    let x = i16::try_from(signed?).ok().filter(|&x| x != NULL_I16)?;
                    slot[..width].copy_from_slice(&x.to_le_bytes());
                }
                ColumnType::I32 => {
                    let x = i32::try_from(signed?).ok().filter(|&x| x != NULL_I32)?;
                    slot[..width].copy_from_slice(&x.to_le_bytes());
                }
                ColumnType::I64 => {
                    let x = signed.filter(|&x| x != NULL_I64)?;
                    slot[..width].copy_from_slice(&x.to_le_bytes());
                }
                ColumnType::Float | ColumnType::Boolean => return None,
            }
        }
    }
    Some((slot, width))
}
