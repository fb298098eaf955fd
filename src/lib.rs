//! Carbon: a self-describing binary document format with in-place editing.
//!
//! A [`Record`] is a key header followed by one outer array. Read it with
//! [`Record::read`], edit it in place with [`Record::patch`], or derive a
//! new revision with [`Record::revise`]. [`Record::from_json`] and
//! [`Record::to_json`] convert from and to JSON text.

pub mod error;
pub mod field;
pub mod insert;
pub mod iter;
pub mod memblock;
pub mod memfile;
pub mod path;
pub mod record;
pub mod types;
pub mod value;
pub mod varuint;

pub use error::{CarbonError, ErrorKind, Result};
pub use field::{ColumnType, FieldType, ListDerivation, MapDerivation, MimeType, Scalar};
pub use insert::{ArrayInsert, ColumnInsert, Inserter, ObjectInsert};
pub use iter::{ArrayIter, ColumnIter, ObjectIter};
pub use memblock::MemBlock;
pub use memfile::{AccessMode, MemFile};
pub use path::{DotPath, PathNode};
pub use record::{
    CreateOptions, FindResult, KeyType, Optimize, Record, RecordBuilder, RecordKey, Revision,
};
pub use value::{CarbonNumber, CarbonValue};
