use crate::error::{CarbonError, Result};
use crate::field::{BinaryType, ColumnHeader, ColumnType, FieldRef, FieldType, Scalar, field_size, key_size};
use crate::iter::ColumnSlots;
use crate::types::{MARKER_ARRAY_END, MARKER_OBJECT_END};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use smol_str::SmolStr;
use std::convert::TryFrom;

// ─── CarbonNumber ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq)]
pub enum CarbonNumber {
    U64(u64),
    I64(i64),
    F64(f64),
}

impl std::fmt::Debug for CarbonNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CarbonNumber::U64(u) => write!(f, "U64({})", u),
            CarbonNumber::I64(i) => write!(f, "I64({})", i),
            CarbonNumber::F64(v) => write!(f, "F64({})", v),
        }
    }
}

impl CarbonNumber {
    pub fn as_f64(self) -> f64 {
        match self {
            CarbonNumber::U64(u) => u as f64,
            CarbonNumber::I64(i) => i as f64,
            CarbonNumber::F64(f) => f,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            CarbonNumber::I64(i) => Some(i),
            CarbonNumber::U64(u) => i64::try_from(u).ok(),
            CarbonNumber::F64(f) => {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
    }

    pub fn as_u64(self) -> Option<u64> {
        match self {
            CarbonNumber::U64(u) => Some(u),
            CarbonNumber::I64(i) => u64::try_from(i).ok(),
            CarbonNumber::F64(f) => {
                if f.fract() == 0.0 && f >= 0.0 && f <= u64::MAX as f64 {
                    Some(f as u64)
                } else {
                    None
                }
            }
        }
    }
}

/// Widen a stored `f32` to the `f64` with the same shortest decimal form, so
/// `1.1f32` prints as `1.1` instead of `1.100000023841858`.
fn widen_f32(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(value as f64)
}

// ─── CarbonValue ────────────────────────────────────────────────────────────

/// Owned, order-preserving value tree. Object properties keep document
/// order and may repeat keys (multimaps).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CarbonValue {
    #[default]
    Null,
    Bool(bool),
    Number(CarbonNumber),
    Str(SmolStr),
    Binary {
        type_name: SmolStr,
        data: Vec<u8>,
    },
    Array(Vec<CarbonValue>),
    /// Homogeneous column; members are `Null`, `Bool` or `Number`.
    Column {
        column_type: ColumnType,
        values: Vec<CarbonValue>,
    },
    Object(Vec<(SmolStr, CarbonValue)>),
}

impl CarbonValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CarbonValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CarbonValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CarbonValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            CarbonValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CarbonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Elements of an array or a column.
    pub fn as_array(&self) -> Option<&[CarbonValue]> {
        match self {
            CarbonValue::Array(arr) => Some(arr),
            CarbonValue::Column { values, .. } => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(SmolStr, CarbonValue)]> {
        match self {
            CarbonValue::Object(props) => Some(props),
            _ => None,
        }
    }

    /// First property named `key`.
    pub fn get(&self, key: &str) -> Option<&CarbonValue> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CarbonValue::Null)
    }

    /// JSON text of this value.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Decoding from the binary form
    // ════════════════════════════════════════════════════════════════════════

    /// Decode the field at `offset` of an encoded document.
    pub fn decode(data: &[u8], offset: usize) -> Result<Self> {
        let field = FieldRef::at(data, offset)?;
        Ok(match field.field_type() {
            FieldType::Null => CarbonValue::Null,
            FieldType::True => CarbonValue::Bool(true),
            FieldType::False => CarbonValue::Bool(false),
            FieldType::U8 | FieldType::U16 | FieldType::U32 | FieldType::U64 => {
                CarbonValue::Number(CarbonNumber::U64(field.unsigned_value()?))
            }
            FieldType::I8 | FieldType::I16 | FieldType::I32 | FieldType::I64 => {
                CarbonValue::Number(CarbonNumber::I64(field.signed_value()?))
            }
            FieldType::Float => CarbonValue::Number(CarbonNumber::F64(widen_f32(field.float_value()?))),
            FieldType::String => CarbonValue::Str(SmolStr::from(field.string_value()?)),
            FieldType::Binary | FieldType::CustomBinary => {
                let binary = field.binary_value()?;
                let type_name = match binary.binary_type {
                    BinaryType::Mime(mime) => SmolStr::from(mime.name()),
                    BinaryType::Custom(name) => SmolStr::from(name),
                };
                CarbonValue::Binary {
                    type_name,
                    data: binary.data.to_vec(),
                }
            }
            FieldType::Array(_) => {
                let mut items = Vec::new();
                let mut at = offset + 1;
                loop {
                    match data.get(at).copied() {
                        Some(0) | Some(MARKER_ARRAY_END) => break,
                        Some(_) => {
                            items.push(CarbonValue::decode(data, at)?);
                            at += field_size(data, at)?;
                        }
                        None => {
                            return Err(CarbonError::Corrupted(format!(
                                "array at {offset} has no terminator"
                            )));
                        }
                    }
                }
                CarbonValue::Array(items)
            }
            FieldType::Object(_) => {
                let mut props = Vec::new();
                let mut at = offset + 1;
                loop {
                    match data.get(at).copied() {
                        Some(0) | Some(MARKER_OBJECT_END) => break,
                        Some(_) => {
                            let key = FieldRef::at(data, at)?.string_value()?;
                            let value_at = at + key_size(data, at)?;
                            props.push((SmolStr::from(key), CarbonValue::decode(data, value_at)?));
                            at = value_at + field_size(data, value_at)?;
                        }
                        None => {
                            return Err(CarbonError::Corrupted(format!(
                                "object at {offset} has no terminator"
                            )));
                        }
                    }
                }
                CarbonValue::Object(props)
            }
            FieldType::Column(column_type, _) => {
                let header = ColumnHeader::parse(data, offset)?;
                CarbonValue::Column {
                    column_type,
                    values: ColumnSlots::new(data, &header)
                        .iter()
                        .map(CarbonValue::from)
                        .collect(),
                }
            }
        })
    }
}

// ─── Serialize ──────────────────────────────────────────────────────────────

struct BinaryView<'a> {
    type_name: &'a str,
    data: &'a [u8],
}

impl Serialize for BinaryView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(Some(2))?;
        m.serialize_entry("type", self.type_name)?;
        m.serialize_entry("bytes", self.data)?;
        m.end()
    }
}

impl Serialize for CarbonValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CarbonValue::Null => serializer.serialize_none(),
            CarbonValue::Bool(b) => serializer.serialize_bool(*b),
            CarbonValue::Number(n) => match n {
                CarbonNumber::U64(u) => serializer.serialize_u64(*u),
                CarbonNumber::I64(i) => serializer.serialize_i64(*i),
                CarbonNumber::F64(f) => serializer.serialize_f64(*f),
            },
            CarbonValue::Str(s) => serializer.serialize_str(s.as_str()),
            CarbonValue::Binary { type_name, data } => BinaryView {
                type_name: type_name.as_str(),
                data: data.as_slice(),
            }
            .serialize(serializer),
            CarbonValue::Array(arr) | CarbonValue::Column { values: arr, .. } => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for v in arr {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            CarbonValue::Object(props) => {
                let mut m = serializer.serialize_map(Some(props.len()))?;
                for (k, v) in props {
                    m.serialize_entry(k.as_str(), v)?;
                }
                m.end()
            }
        }
    }
}

// ─── From impls ─────────────────────────────────────────────────────────────

impl From<f64> for CarbonValue {
    fn from(n: f64) -> Self {
        CarbonValue::Number(CarbonNumber::F64(n))
    }
}

impl From<i64> for CarbonValue {
    fn from(n: i64) -> Self {
        CarbonValue::Number(CarbonNumber::I64(n))
    }
}

impl From<u64> for CarbonValue {
    fn from(n: u64) -> Self {
        CarbonValue::Number(CarbonNumber::U64(n))
    }
}

impl From<bool> for CarbonValue {
    fn from(b: bool) -> Self {
        CarbonValue::Bool(b)
    }
}

impl From<&str> for CarbonValue {
    fn from(s: &str) -> Self {
        CarbonValue::Str(SmolStr::from(s))
    }
}

impl From<String> for CarbonValue {
    fn from(s: String) -> Self {
        CarbonValue::Str(SmolStr::from(s))
    }
}

impl From<Scalar<'_>> for CarbonValue {
    fn from(s: Scalar<'_>) -> Self {
        match s {
            Scalar::Null => CarbonValue::Null,
            Scalar::Bool(b) => CarbonValue::Bool(b),
            Scalar::U8(v) => CarbonValue::from(v as u64),
            Scalar::U16(v) => CarbonValue::from(v as u64),
            Scalar::U32(v) => CarbonValue::from(v as u64),
            Scalar::U64(v) => CarbonValue::from(v),
            Scalar::I8(v) => CarbonValue::from(v as i64),
            Scalar::I16(v) => CarbonValue::from(v as i64),
            Scalar::I32(v) => CarbonValue::from(v as i64),
            Scalar::I64(v) => CarbonValue::from(v),
            Scalar::Float(v) => CarbonValue::from(widen_f32(v)),
            Scalar::String(v) => CarbonValue::from(v),
            Scalar::Binary { data, mime } => CarbonValue::Binary {
                type_name: SmolStr::from(mime.name()),
                data: data.to_vec(),
            },
            Scalar::CustomBinary { data, type_name } => CarbonValue::Binary {
                type_name: SmolStr::from(type_name),
                data: data.to_vec(),
            },
        }
    }
}

// ─── From cbor4ii::core::Value ──────────────────────────────────────────────

impl From<cbor4ii::core::Value> for CarbonValue {
    fn from(v: cbor4ii::core::Value) -> Self {
        use cbor4ii::core::Value;
        match v {
            Value::Null => CarbonValue::Null,
            Value::Bool(b) => CarbonValue::Bool(b),
            Value::Integer(i) => {
                if let Ok(val) = u64::try_from(i) {
                    CarbonValue::from(val)
                } else if let Ok(val) = i64::try_from(i) {
                    CarbonValue::from(val)
                } else {
                    CarbonValue::from(i as f64)
                }
            }
            Value::Float(f) => CarbonValue::from(f),
            Value::Text(s) => CarbonValue::from(s),
            Value::Bytes(data) => CarbonValue::Binary {
                type_name: SmolStr::from(crate::field::MimeType::OCTET_STREAM.name()),
                data,
            },
            Value::Array(arr) => CarbonValue::Array(arr.into_iter().map(CarbonValue::from).collect()),
            Value::Map(map) => CarbonValue::Object(
                map.into_iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Value::Text(s) => SmolStr::from(s),
                            Value::Integer(i) => SmolStr::from(i.to_string()),
                            other => SmolStr::from(format!("{:?}", other)),
                        };
                        (key, CarbonValue::from(v))
                    })
                    .collect(),
            ),
            Value::Tag(_, inner) => CarbonValue::from(*inner),
            _ => CarbonValue::Null,
        }
    }
}

// ─── From/Into serde_json::Value ────────────────────────────────────────────

impl From<serde_json::Value> for CarbonValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => CarbonValue::Null,
            serde_json::Value::Bool(b) => CarbonValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    CarbonValue::from(u)
                } else if let Some(i) = n.as_i64() {
                    CarbonValue::from(i)
                } else {
                    CarbonValue::from(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => CarbonValue::from(s),
            serde_json::Value::Array(arr) => {
                CarbonValue::Array(arr.into_iter().map(CarbonValue::from).collect())
            }
            serde_json::Value::Object(obj) => CarbonValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (SmolStr::from(k), CarbonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<CarbonValue> for serde_json::Value {
    fn from(val: CarbonValue) -> Self {
        match val {
            CarbonValue::Null => serde_json::Value::Null,
            CarbonValue::Bool(b) => serde_json::Value::Bool(b),
            CarbonValue::Number(n) => match n {
                CarbonNumber::U64(u) => serde_json::json!(u),
                CarbonNumber::I64(i) => serde_json::json!(i),
                CarbonNumber::F64(f) => serde_json::json!(f),
            },
            CarbonValue::Str(s) => serde_json::Value::String(s.to_string()),
            CarbonValue::Binary { type_name, data } => serde_json::json!({
                "type": type_name.as_str(),
                "bytes": data,
            }),
            CarbonValue::Array(arr) | CarbonValue::Column { values: arr, .. } => {
                serde_json::Value::Array(arr.into_iter().map(|v| v.into()).collect())
            }
            CarbonValue::Object(props) => serde_json::Value::Object(
                props
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.into()))
                    .collect(),
            ),
        }
    }
}
