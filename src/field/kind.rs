use crate::error::{CarbonError, Result};
use crate::types::*;

// ─── Derivations ────────────────────────────────────────────────────────────

/// Abstract type of an array or column: `{unsorted, sorted} x {multiset, set}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ListDerivation {
    #[default]
    UnsortedMultiset,
    SortedMultiset,
    UnsortedSet,
    SortedSet,
}

impl ListDerivation {
    pub const ALL: [ListDerivation; 4] = [
        ListDerivation::UnsortedMultiset,
        ListDerivation::SortedMultiset,
        ListDerivation::UnsortedSet,
        ListDerivation::SortedSet,
    ];

    pub fn new(sorted: bool, multiset: bool) -> Self {
        match (sorted, multiset) {
            (false, true) => ListDerivation::UnsortedMultiset,
            (true, true) => ListDerivation::SortedMultiset,
            (false, false) => ListDerivation::UnsortedSet,
            (true, false) => ListDerivation::SortedSet,
        }
    }

    #[inline]
    pub fn is_sorted(self) -> bool {
        matches!(
            self,
            ListDerivation::SortedMultiset | ListDerivation::SortedSet
        )
    }

    #[inline]
    pub fn is_multiset(self) -> bool {
        matches!(
            self,
            ListDerivation::UnsortedMultiset | ListDerivation::SortedMultiset
        )
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn array_marker(self) -> u8 {
        match self {
            ListDerivation::UnsortedMultiset => MARKER_ARRAY_UNSORTED_MULTISET,
            ListDerivation::SortedMultiset => MARKER_ARRAY_SORTED_MULTISET,
            ListDerivation::UnsortedSet => MARKER_ARRAY_UNSORTED_SET,
            ListDerivation::SortedSet => MARKER_ARRAY_SORTED_SET,
        }
    }
}

/// Abstract type of an object: `{unsorted, sorted} x {multimap, map}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MapDerivation {
    #[default]
    UnsortedMultimap,
    SortedMultimap,
    UnsortedMap,
    SortedMap,
}

impl MapDerivation {
    pub const ALL: [MapDerivation; 4] = [
        MapDerivation::UnsortedMultimap,
        MapDerivation::SortedMultimap,
        MapDerivation::UnsortedMap,
        MapDerivation::SortedMap,
    ];

    pub fn new(sorted: bool, multimap: bool) -> Self {
        match (sorted, multimap) {
            (false, true) => MapDerivation::UnsortedMultimap,
            (true, true) => MapDerivation::SortedMultimap,
            (false, false) => MapDerivation::UnsortedMap,
            (true, false) => MapDerivation::SortedMap,
        }
    }

    #[inline]
    pub fn is_sorted(self) -> bool {
        matches!(self, MapDerivation::SortedMultimap | MapDerivation::SortedMap)
    }

    #[inline]
    pub fn is_multimap(self) -> bool {
        matches!(
            self,
            MapDerivation::UnsortedMultimap | MapDerivation::SortedMultimap
        )
    }

    pub fn object_marker(self) -> u8 {
        match self {
            MapDerivation::UnsortedMultimap => MARKER_OBJECT_UNSORTED_MULTIMAP,
            MapDerivation::SortedMultimap => MARKER_OBJECT_SORTED_MULTIMAP,
            MapDerivation::UnsortedMap => MARKER_OBJECT_UNSORTED_MAP,
            MapDerivation::SortedMap => MARKER_OBJECT_SORTED_MAP,
        }
    }
}

// ─── Column Element Types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Float,
    Boolean,
}

impl ColumnType {
    pub const ALL: [ColumnType; 10] = [
        ColumnType::U8,
        ColumnType::U16,
        ColumnType::U32,
        ColumnType::U64,
        ColumnType::I8,
        ColumnType::I16,
        ColumnType::I32,
        ColumnType::I64,
        ColumnType::Float,
        ColumnType::Boolean,
    ];

    /// Slot width in bytes.
    #[inline]
    pub fn width(self) -> usize {
        match self {
            ColumnType::U8 | ColumnType::I8 | ColumnType::Boolean => 1,
            ColumnType::U16 | ColumnType::I16 => 2,
            ColumnType::U32 | ColumnType::I32 | ColumnType::Float => 4,
            ColumnType::U64 | ColumnType::I64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::U8 => "u8",
            ColumnType::U16 => "u16",
            ColumnType::U32 => "u32",
            ColumnType::U64 => "u64",
            ColumnType::I8 => "i8",
            ColumnType::I16 => "i16",
            ColumnType::I32 => "i32",
            ColumnType::I64 => "i64",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
        }
    }

    /// Little-endian bytes of this type's null sentinel.
    pub fn null_slot(self) -> ([u8; 8], usize) {
        let mut slot = [0u8; 8];
        let w = self.width();
        match self {
            ColumnType::U8 => slot[..w].copy_from_slice(&NULL_U8.to_le_bytes()),
            ColumnType::U16 => slot[..w].copy_from_slice(&NULL_U16.to_le_bytes()),
            ColumnType::U32 => slot[..w].copy_from_slice(&NULL_U32.to_le_bytes()),
            ColumnType::U64 => slot[..w].copy_from_slice(&NULL_U64.to_le_bytes()),
            ColumnType::I8 => slot[..w].copy_from_slice(&NULL_I8.to_le_bytes()),
            ColumnType::I16 => slot[..w].copy_from_slice(&NULL_I16.to_le_bytes()),
            ColumnType::I32 => slot[..w].copy_from_slice(&NULL_I32.to_le_bytes()),
            ColumnType::I64 => slot[..w].copy_from_slice(&NULL_I64.to_le_bytes()),
            ColumnType::Float => slot[..w].copy_from_slice(&f32::NAN.to_le_bytes()),
            ColumnType::Boolean => slot[0] = BOOLEAN_COLUMN_NULL,
        }
        (slot, w)
    }

    /// Whether the slot bytes hold this type's null sentinel.
    pub fn is_null_slot(self, slot: &[u8]) -> bool {
        match self {
            ColumnType::Float => slot
                .try_into()
                .map(|b: [u8; 4]| f32::from_le_bytes(b).is_nan())
                .unwrap_or(false),
            _ => {
                let (null, w) = self.null_slot();
                slot == &null[..w]
            }
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn marker(self, derivation: ListDerivation) -> u8 {
        COLUMN_MARKERS[self.index()][derivation.index()]
    }
}

// ─── FieldType ──────────────────────────────────────────────────────────────

/// Decoded kind of a field. The marker byte never travels beyond the codec;
/// everything else matches on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Null,
    True,
    False,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Float,
    String,
    Binary,
    CustomBinary,
    Array(ListDerivation),
    Object(MapDerivation),
    Column(ColumnType, ListDerivation),
}

impl FieldType {
    /// Map a marker byte to its field type. Container terminators and slack
    /// are not fields and fail here.
    pub fn from_marker(marker: u8) -> Result<Self> {
        Ok(match marker {
            MARKER_NULL => FieldType::Null,
            MARKER_TRUE => FieldType::True,
            MARKER_FALSE => FieldType::False,
            MARKER_U8 => FieldType::U8,
            MARKER_U16 => FieldType::U16,
            MARKER_U32 => FieldType::U32,
            MARKER_U64 => FieldType::U64,
            MARKER_I8 => FieldType::I8,
            MARKER_I16 => FieldType::I16,
            MARKER_I32 => FieldType::I32,
            MARKER_I64 => FieldType::I64,
            MARKER_FLOAT => FieldType::Float,
            MARKER_STRING => FieldType::String,
            MARKER_BINARY => FieldType::Binary,
            MARKER_CUSTOM_BINARY => FieldType::CustomBinary,
            MARKER_ARRAY_UNSORTED_MULTISET => FieldType::Array(ListDerivation::UnsortedMultiset),
            MARKER_ARRAY_SORTED_MULTISET => FieldType::Array(ListDerivation::SortedMultiset),
            MARKER_ARRAY_UNSORTED_SET => FieldType::Array(ListDerivation::UnsortedSet),
            MARKER_ARRAY_SORTED_SET => FieldType::Array(ListDerivation::SortedSet),
            MARKER_OBJECT_UNSORTED_MULTIMAP => FieldType::Object(MapDerivation::UnsortedMultimap),
            MARKER_OBJECT_SORTED_MULTIMAP => FieldType::Object(MapDerivation::SortedMultimap),
            MARKER_OBJECT_UNSORTED_MAP => FieldType::Object(MapDerivation::UnsortedMap),
            MARKER_OBJECT_SORTED_MAP => FieldType::Object(MapDerivation::SortedMap),
            other => {
                for ty in ColumnType::ALL {
                    for derivation in ListDerivation::ALL {
                        if ty.marker(derivation) == other {
                            return Ok(FieldType::Column(ty, derivation));
                        }
                    }
                }
                return Err(CarbonError::MarkerMapping {
                    marker: other,
                    context: "field",
                });
            }
        })
    }

    pub fn marker(self) -> u8 {
        match self {
            FieldType::Null => MARKER_NULL,
            FieldType::True => MARKER_TRUE,
            FieldType::False => MARKER_FALSE,
            FieldType::U8 => MARKER_U8,
            FieldType::U16 => MARKER_U16,
            FieldType::U32 => MARKER_U32,
            FieldType::U64 => MARKER_U64,
            FieldType::I8 => MARKER_I8,
            FieldType::I16 => MARKER_I16,
            FieldType::I32 => MARKER_I32,
            FieldType::I64 => MARKER_I64,
            FieldType::Float => MARKER_FLOAT,
            FieldType::String => MARKER_STRING,
            FieldType::Binary => MARKER_BINARY,
            FieldType::CustomBinary => MARKER_CUSTOM_BINARY,
            FieldType::Array(d) => d.array_marker(),
            FieldType::Object(d) => d.object_marker(),
            FieldType::Column(ty, d) => ty.marker(d),
        }
    }

    /// Null, true and false: the marker is the whole field.
    #[inline]
    pub fn is_constant(self) -> bool {
        matches!(self, FieldType::Null | FieldType::True | FieldType::False)
    }

    /// Payload width for fields whose size does not depend on their content.
    pub fn fixed_payload_width(self) -> Option<usize> {
        match self {
            FieldType::Null | FieldType::True | FieldType::False => Some(0),
            FieldType::U8 | FieldType::I8 => Some(1),
            FieldType::U16 | FieldType::I16 => Some(2),
            FieldType::U32 | FieldType::I32 | FieldType::Float => Some(4),
            FieldType::U64 | FieldType::I64 => Some(8),
            FieldType::String
            | FieldType::Binary
            | FieldType::CustomBinary
            | FieldType::Array(_)
            | FieldType::Object(_)
            | FieldType::Column(..) => None,
        }
    }

    #[inline]
    pub fn is_boolean(self) -> bool {
        matches!(self, FieldType::True | FieldType::False)
    }

    #[inline]
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            FieldType::U8 | FieldType::U16 | FieldType::U32 | FieldType::U64
        )
    }

    #[inline]
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            FieldType::I8 | FieldType::I16 | FieldType::I32 | FieldType::I64
        )
    }

    #[inline]
    pub fn is_number(self) -> bool {
        self.is_unsigned() || self.is_signed() || self == FieldType::Float
    }

    #[inline]
    pub fn is_binary(self) -> bool {
        matches!(self, FieldType::Binary | FieldType::CustomBinary)
    }

    #[inline]
    pub fn is_container(self) -> bool {
        matches!(
            self,
            FieldType::Array(_) | FieldType::Object(_) | FieldType::Column(..)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Null => "null",
            FieldType::True => "true",
            FieldType::False => "false",
            FieldType::U8 => "u8",
            FieldType::U16 => "u16",
            FieldType::U32 => "u32",
            FieldType::U64 => "u64",
            FieldType::I8 => "i8",
            FieldType::I16 => "i16",
            FieldType::I32 => "i32",
            FieldType::I64 => "i64",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::Binary => "binary",
            FieldType::CustomBinary => "custom binary",
            FieldType::Array(_) => "array",
            FieldType::Object(_) => "object",
            FieldType::Column(..) => "column",
        }
    }
}

/// Derivation of the array whose begin marker is `marker`.
pub fn list_derivation_of_array(marker: u8) -> Result<ListDerivation> {
    match FieldType::from_marker(marker) {
        Ok(FieldType::Array(d)) => Ok(d),
        _ => Err(CarbonError::MarkerMapping {
            marker,
            context: "array begin",
        }),
    }
}

/// Derivation of the object whose begin marker is `marker`.
pub fn map_derivation_of_object(marker: u8) -> Result<MapDerivation> {
    match FieldType::from_marker(marker) {
        Ok(FieldType::Object(d)) => Ok(d),
        _ => Err(CarbonError::MarkerMapping {
            marker,
            context: "object begin",
        }),
    }
}

/// Element type and derivation of the column whose begin marker is `marker`.
pub fn column_of_marker(marker: u8) -> Result<(ColumnType, ListDerivation)> {
    match FieldType::from_marker(marker) {
        Ok(FieldType::Column(ty, d)) => Ok((ty, d)),
        _ => Err(CarbonError::MarkerMapping {
            marker,
            context: "column begin",
        }),
    }
}
