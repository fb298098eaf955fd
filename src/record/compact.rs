use super::Record;
use crate::error::Result;
use crate::field::{ColumnHeader, FieldType, field_size, key_size, skip_slack};
use crate::types::{MARKER_ARRAY_END, MARKER_OBJECT_END};
use crate::varuint::encode_varuint_array;
use tracing::debug;

/// Re-encode the field at `at` into `out` without slack. Returns the number
/// of source bytes consumed.
fn compact_field(data: &[u8], at: usize, out: &mut Vec<u8>) -> Result<usize> {
    let marker = data.get(at).copied().unwrap_or(0);
    match FieldType::from_marker(marker)? {
        FieldType::Array(_) => {
            out.push(marker);
            let mut pos = at + 1;
            while !matches!(data.get(pos).copied(), None | Some(0) | Some(MARKER_ARRAY_END)) {
                pos += compact_field(data, pos, out)?;
            }
            let end = skip_slack(data, pos, MARKER_ARRAY_END, "array")?;
            out.push(MARKER_ARRAY_END);
            Ok(end + 1 - at)
        }
        FieldType::Object(_) => {
            out.push(marker);
            let mut pos = at + 1;
            while !matches!(data.get(pos).copied(), None | Some(0) | Some(MARKER_OBJECT_END)) {
                let key = key_size(data, pos)?;
                out.extend_from_slice(&data[pos..pos + key]);
                pos += key;
                pos += compact_field(data, pos, out)?;
            }
            let end = skip_slack(data, pos, MARKER_OBJECT_END, "object")?;
            out.push(MARKER_OBJECT_END);
            Ok(end + 1 - at)
        }
        FieldType::Column(..) => {
            let header = ColumnHeader::parse(data, at)?;
            out.push(marker);
            let (count, width) = encode_varuint_array(header.count as u64);
            out.extend_from_slice(&count[..width]);
            out.extend_from_slice(&count[..width]);
            out.extend_from_slice(&data[header.slots_offset..header.slot_offset(header.count)]);
            Ok(header.end() - at)
        }
        _ => {
            let size = field_size(data, at)?;
            out.extend_from_slice(&data[at..at + size]);
            Ok(size)
        }
    }
}

impl Record {
    /// Remove all reserved space: container slack and unused column slots.
    /// Contents and iteration order are unchanged; the commit hash is not
    /// recomputed.
    pub fn compact(&mut self) -> Result<()> {
        let begin = self.array_begin()?;
        let data = self.block.raw_data();
        let mut out = Vec::with_capacity(data.len() - begin);
        let consumed = compact_field(data, begin, &mut out)?;
        let freed = consumed - out.len();
        if freed > 0 {
            self.block.move_left(begin + out.len(), freed)?;
            self.block.write(begin, &out)?;
        }
        debug!(freed, "record compacted");
        Ok(())
    }
}
