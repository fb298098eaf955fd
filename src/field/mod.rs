//! Field codec: marker vocabulary, encoders, exact size computation and
//! zero-copy typed access.

mod encode;
mod kind;
mod mime;
mod reader;
mod size;

pub use encode::{Scalar, column_slot, write_field_into, write_key_into, write_payload_into};
pub use kind::{
    ColumnType, FieldType, ListDerivation, MapDerivation, column_of_marker,
    list_derivation_of_array, map_derivation_of_object,
};
pub use mime::MimeType;
pub use reader::{Binary, BinaryType, FieldRef};
pub use size::{ColumnHeader, field_size, key_size, length_prefixed_size, skip_slack};

#[cfg(test)]
mod tests;
