// ─── Marker Bytes ───────────────────────────────────────────────────────────
//
// Wire vocabulary only. In-memory code works on `FieldType` and friends
// (see `field::kind`); these bytes are produced and consumed at the codec
// boundary.

// Constant fields (no payload)
pub const MARKER_NULL: u8 = b'n';
pub const MARKER_TRUE: u8 = b't';
pub const MARKER_FALSE: u8 = b'f';

// Fixed-width numbers
pub const MARKER_U8: u8 = b'c';
pub const MARKER_U16: u8 = b'd';
pub const MARKER_U32: u8 = b'i';
pub const MARKER_U64: u8 = b'l';
pub const MARKER_I8: u8 = b'C';
pub const MARKER_I16: u8 = b'D';
pub const MARKER_I32: u8 = b'I';
pub const MARKER_I64: u8 = b'L';
pub const MARKER_FLOAT: u8 = b'r';

// Length-prefixed
pub const MARKER_STRING: u8 = b's';
pub const MARKER_BINARY: u8 = b'b';
pub const MARKER_CUSTOM_BINARY: u8 = b'x';

// Arrays: {unsorted, sorted} x {multiset, set}
pub const MARKER_ARRAY_UNSORTED_MULTISET: u8 = b'[';
pub const MARKER_ARRAY_SORTED_MULTISET: u8 = b'<';
pub const MARKER_ARRAY_UNSORTED_SET: u8 = b'/';
pub const MARKER_ARRAY_SORTED_SET: u8 = b'#';
pub const MARKER_ARRAY_END: u8 = b']';

// Objects: {unsorted, sorted} x {multimap, map}
pub const MARKER_OBJECT_UNSORTED_MULTIMAP: u8 = b'{';
pub const MARKER_OBJECT_SORTED_MULTIMAP: u8 = b'~';
pub const MARKER_OBJECT_UNSORTED_MAP: u8 = b':';
pub const MARKER_OBJECT_SORTED_MAP: u8 = b'=';
pub const MARKER_OBJECT_END: u8 = b'}';

// Columns. One row per element type, one entry per derivation in the order
// unsorted multiset, sorted multiset, unsorted set, sorted set. The first
// entry of each row is the base column marker.
pub const COLUMN_MARKERS: [[u8; 4]; 10] = [
    [b'1', 0x80, 0x81, 0x82], // u8
    [b'2', 0x83, 0x84, 0x85], // u16
    [b'3', 0x86, 0x87, 0x88], // u32
    [b'4', 0x89, 0x8A, 0x8B], // u64
    [b'5', 0x8C, 0x8D, 0x8E], // i8
    [b'6', 0x8F, 0x90, 0x91], // i16
    [b'7', 0x92, 0x93, 0x94], // i32
    [b'8', 0x95, 0x96, 0x97], // i64
    [b'R', 0x98, 0x99, 0x9A], // float
    [b'B', 0x9B, 0x9C, 0x9D], // boolean
];

// Record key header
pub const MARKER_KEY_NOKEY: u8 = b'?';
pub const MARKER_KEY_AUTOKEY: u8 = b'*';
pub const MARKER_KEY_UKEY: u8 = b'+';
pub const MARKER_KEY_IKEY: u8 = b'-';
pub const MARKER_KEY_SKEY: u8 = b'!';

// ─── Column Null Sentinels ──────────────────────────────────────────────────
pub const NULL_U8: u8 = u8::MAX;
pub const NULL_U16: u16 = u16::MAX;
pub const NULL_U32: u32 = u32::MAX;
pub const NULL_U64: u64 = u64::MAX;
pub const NULL_I8: i8 = i8::MIN;
pub const NULL_I16: i16 = i16::MIN;
pub const NULL_I32: i32 = i32::MIN;
pub const NULL_I64: i64 = i64::MIN;
pub const BOOLEAN_COLUMN_FALSE: u8 = 0;
pub const BOOLEAN_COLUMN_TRUE: u8 = 1;
pub const BOOLEAN_COLUMN_NULL: u8 = 2;

// ─── Binary Layout ──────────────────────────────────────────────────────────
//
//  ┌──────────────────────────────────────────────┐
//  │ Key header                                   │
//  │   key marker: u8                             │
//  │   key:  u64 | i64 | varuint len + bytes      │  (absent for NOKEY)
//  │   commit hash: u64 (LE)                      │  (absent for NOKEY)
//  ├──────────────────────────────────────────────┤
//  │ Outer array                                  │
//  │   derivation marker: u8                      │
//  │   fields: [marker][payload] ...              │
//  │   slack: 0x00 ...                            │
//  │   end marker ']'                             │
//  └──────────────────────────────────────────────┘
//
//  Object property: ['s'][varuint key len][key bytes][marker][payload]
//  Column:          [marker][varuint count][varuint capacity][slots]

pub const COMMIT_HASH_SIZE: usize = 8;

/// Depth of the memfile save/restore position stack.
pub const MEMFILE_SAVED_POSITION_STACK_SIZE: usize = 10;

/// Geometric growth factor applied when a memory block must grow.
pub const MEMBLOCK_GROWTH_FACTOR: f64 = 1.7;

/// Smallest document a record allocates: widest header plus an empty array.
pub const MIN_DOC_CAPACITY: usize = 1 + 8 + COMMIT_HASH_SIZE + 2;

pub const DEFAULT_DOC_CAPACITY: usize = 1024;
pub const DEFAULT_ARRAY_CAPACITY: usize = 16;
