use super::{CreateOptions, Record, RecordKey};
use crate::error::{CarbonError, Result};
use crate::field::{ColumnType, ListDerivation, MapDerivation, MimeType, Scalar};
use crate::insert::{ArrayInsert, ObjectInsert};
use crate::value::{CarbonNumber, CarbonValue};
use tracing::debug;

impl Record {
    /// Parse JSON text into a new record.
    ///
    /// A root array with other than one element supplies the outer array's
    /// elements; any other root becomes the single outer element.
    pub fn from_json(text: &str, key: RecordKey) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(&CarbonValue::from(json), key)
    }

    /// Parse a CBOR item into a new record, following the same rules as
    /// [`from_json`](Record::from_json).
    pub fn from_cbor(bytes: &[u8], key: RecordKey) -> Result<Self> {
        let value: cbor4ii::core::Value = cbor4ii::serde::from_slice(bytes)
            .map_err(|e| CarbonError::Cbor(format!("{e:?}")))?;
        Self::from_value(&CarbonValue::from(value), key)
    }

    pub fn from_value(value: &CarbonValue, key: RecordKey) -> Result<Self> {
        let options = CreateOptions {
            key_type: key.key_type(),
            ..CreateOptions::default()
        };
        let mut builder = Record::create_begin_with_key(&key, &options)?;
        {
            let mut ins = builder.inserter()?;
            match value {
                CarbonValue::Array(items) if items.len() != 1 => {
                    for item in items {
                        insert_value(&mut ins, item)?;
                    }
                }
                other => insert_value(&mut ins, other)?,
            }
        }
        let record = builder.create_end()?;
        debug!(len = record.raw_data().len(), "record imported from value");
        Ok(record)
    }

    /// Decode the whole record. An outer array holding exactly one element
    /// decodes to that element.
    pub fn to_value(&self) -> Result<CarbonValue> {
        Ok(match CarbonValue::decode(self.raw_data(), self.array_begin()?)? {
            CarbonValue::Array(mut items) if items.len() == 1 => items.pop().unwrap_or_default(),
            other => other,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_value()?.to_json()
    }
}

// ─── Value insertion ────────────────────────────────────────────────────────

/// Reals are stored as 32-bit floats; values that do not narrow to a
/// finite `f32` are rejected.
fn narrow_float(f: f64) -> Option<f32> {
    let narrowed = f as f32;
    narrowed.is_finite().then_some(narrowed)
}

fn number_scalar(n: CarbonNumber) -> Result<Scalar<'static>> {
    Ok(match n {
        CarbonNumber::U64(u) => Scalar::unsigned(u),
        CarbonNumber::I64(i) if i >= 0 => Scalar::unsigned(i as u64),
        CarbonNumber::I64(i) => Scalar::signed(i),
        CarbonNumber::F64(f) => Scalar::Float(narrow_float(f).ok_or_else(|| {
            CarbonError::IllegalArgument(format!("{f} does not fit a 32-bit float"))
        })?),
    })
}

fn column_scalar(value: &CarbonValue) -> Result<Scalar<'static>> {
    match value {
        CarbonValue::Bool(b) => Ok(Scalar::Bool(*b)),
        CarbonValue::Number(n) => number_scalar(*n),
        _ => Ok(Scalar::Null),
    }
}

/// Column type for a homogeneous list of numbers or booleans (nulls allowed):
/// the narrowest type whose null sentinel is not among the values.
pub(crate) fn column_type_for(items: &[CarbonValue]) -> Option<ColumnType> {
    let (mut bools, mut floats, mut ints) = (0usize, 0usize, 0usize);
    let (mut min, mut max) = (0i64, 0u64);
    for item in items {
        match item {
            CarbonValue::Null => {}
            CarbonValue::Bool(_) => bools += 1,
            CarbonValue::Number(CarbonNumber::F64(f)) => {
                narrow_float(*f)?;
                floats += 1;
            }
            CarbonValue::Number(CarbonNumber::U64(u)) => {
                ints += 1;
                max = max.max(*u);
            }
            CarbonValue::Number(CarbonNumber::I64(i)) => {
                ints += 1;
                if *i < 0 {
                    min = min.min(*i);
                } else {
                    max = max.max(*i as u64);
                }
            }
            _ => return None,
        }
    }
    let present = bools + floats + ints;
    if present == 0 {
        None
    } else if bools == present {
        Some(ColumnType::Boolean)
    } else if floats == present {
        Some(ColumnType::Float)
    } else if ints != present {
        None
    } else if min == 0 {
        [
            (ColumnType::U8, u8::MAX as u64),
            (ColumnType::U16, u16::MAX as u64),
            (ColumnType::U32, u32::MAX as u64),
            (ColumnType::U64, u64::MAX),
        ]
        .into_iter()
        .find(|&(_, sentinel)| max < sentinel)
        .map(|(ty, _)| ty)
    } else {
        [
            (ColumnType::I8, i8::MIN as i64, i8::MAX as u64),
            (ColumnType::I16, i16::MIN as i64, i16::MAX as u64),
            (ColumnType::I32, i32::MIN as i64, i32::MAX as u64),
            (ColumnType::I64, i64::MIN, i64::MAX as u64),
        ]
        .into_iter()
        .find(|&(_, sentinel, upper)| min > sentinel && max <= upper)
        .map(|(ty, _, _)| ty)
    }
}

fn binary_scalar<'v>(type_name: &'v str, data: &'v [u8]) -> Scalar<'v> {
    match MimeType::from_name(type_name) {
        Some(mime) => Scalar::Binary { data, mime },
        None => Scalar::CustomBinary { data, type_name },
    }
}

/// Append `value` to an array being built.
pub(crate) fn insert_value(ins: &mut ArrayInsert<'_>, value: &CarbonValue) -> Result<()> {
    match value {
        CarbonValue::Null => ins.insert_null(),
        CarbonValue::Bool(b) => ins.insert_bool(*b),
        CarbonValue::Number(n) => ins.insert(&number_scalar(*n)?),
        CarbonValue::Str(s) => ins.insert_string(s),
        CarbonValue::Binary { type_name, data } => ins.insert(&binary_scalar(type_name, data)),
        CarbonValue::Array(items) => match column_type_for(items) {
            Some(column_type) => {
                let mut column =
                    ins.insert_column(column_type, ListDerivation::UnsortedMultiset, items.len())?;
                items.iter().try_for_each(|item| column.insert(&column_scalar(item)?))
            }
            None => {
                let mut nested = ins.insert_array(ListDerivation::UnsortedMultiset, 0)?;
                items.iter().try_for_each(|item| insert_value(&mut nested, item))
            }
        },
        CarbonValue::Column {
            column_type,
            values,
        } => {
            let mut column =
                ins.insert_column(*column_type, ListDerivation::UnsortedMultiset, values.len())?;
            values.iter().try_for_each(|item| column.insert(&column_scalar(item)?))
        }
        CarbonValue::Object(props) => {
            let mut nested = ins.insert_object(MapDerivation::UnsortedMultimap, 0)?;
            props
                .iter()
                .try_for_each(|(key, item)| insert_property(&mut nested, key, item))
        }
    }
}

fn insert_property(ins: &mut ObjectInsert<'_>, key: &str, value: &CarbonValue) -> Result<()> {
    match value {
        CarbonValue::Null => ins.insert_null(key),
        CarbonValue::Bool(b) => ins.insert_bool(key, *b),
        CarbonValue::Number(n) => ins.insert(key, &number_scalar(*n)?),
        CarbonValue::Str(s) => ins.insert_string(key, s),
        CarbonValue::Binary { type_name, data } => ins.insert(key, &binary_scalar(type_name, data)),
        CarbonValue::Array(items) => match column_type_for(items) {
            Some(column_type) => {
                let mut column = ins.insert_column(
                    key,
                    column_type,
                    ListDerivation::UnsortedMultiset,
                    items.len(),
                )?;
                items.iter().try_for_each(|item| column.insert(&column_scalar(item)?))
            }
            None => {
                let mut nested = ins.insert_array(key, ListDerivation::UnsortedMultiset, 0)?;
                items.iter().try_for_each(|item| insert_value(&mut nested, item))
            }
        },
        CarbonValue::Column {
            column_type,
            values,
        } => {
            let mut column = ins.insert_column(
                key,
                *column_type,
                ListDerivation::UnsortedMultiset,
                values.len(),
            )?;
            values.iter().try_for_each(|item| column.insert(&column_scalar(item)?))
        }
        CarbonValue::Object(props) => {
            let mut nested = ins.insert_object(key, MapDerivation::UnsortedMultimap, 0)?;
            props
                .iter()
                .try_for_each(|(k, item)| insert_property(&mut nested, k, item))
        }
    }
}
