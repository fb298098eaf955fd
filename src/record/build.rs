use super::{KeyType, Record, RecordKey};
use crate::error::Result;
use crate::field::{ListDerivation, field_size};
use crate::insert::ArrayInsert;
use crate::memfile::{AccessMode, MemFile};
use crate::types::{DEFAULT_ARRAY_CAPACITY, DEFAULT_DOC_CAPACITY, MARKER_ARRAY_END};
use tracing::debug;

/// Post-processing applied when a builder finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Optimize {
    /// Drop container slack and trim column capacities to their counts.
    pub compact: bool,
    /// Trim the block's capacity to the used bytes.
    pub shrink: bool,
}

impl Optimize {
    pub const OPTIMIZE: Self = Self {
        compact: true,
        shrink: true,
    };
    pub const KEEP: Self = Self {
        compact: false,
        shrink: false,
    };
}

impl Default for Optimize {
    fn default() -> Self {
        Self::OPTIMIZE
    }
}

/// Parameters for [`Record::create_begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    pub key_type: KeyType,
    pub derivation: ListDerivation,
    /// Initial block capacity in bytes.
    pub doc_capacity: usize,
    /// Zero slack reserved inside the outer array.
    pub array_capacity: usize,
    pub optimize: Optimize,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            key_type: KeyType::NoKey,
            derivation: ListDerivation::UnsortedMultiset,
            doc_capacity: DEFAULT_DOC_CAPACITY,
            array_capacity: DEFAULT_ARRAY_CAPACITY,
            optimize: Optimize::OPTIMIZE,
        }
    }
}

/// A record under construction.
///
/// Obtain inserters with [`inserter`](RecordBuilder::inserter); each one
/// appends after whatever the outer array already holds.
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
    optimize: Optimize,
}

impl Record {
    pub fn create_begin(options: &CreateOptions) -> Result<RecordBuilder> {
        let record = Record::create_empty(
            options.derivation,
            options.key_type,
            options.doc_capacity,
            options.array_capacity,
        )?;
        Ok(RecordBuilder {
            record,
            optimize: options.optimize,
        })
    }

    pub(crate) fn create_begin_with_key(
        key: &RecordKey,
        options: &CreateOptions,
    ) -> Result<RecordBuilder> {
        let record = Record::create_with_key(
            key,
            options.derivation,
            options.doc_capacity,
            options.array_capacity,
        )?;
        Ok(RecordBuilder {
            record,
            optimize: options.optimize,
        })
    }
}

impl RecordBuilder {
    /// Offset right after the last element of the outer array.
    fn append_position(&self) -> Result<usize> {
        let data = self.record.raw_data();
        let mut at = self.record.array_begin()? + 1;
        while !matches!(data.get(at).copied(), None | Some(0) | Some(MARKER_ARRAY_END)) {
            at += field_size(data, at)?;
        }
        Ok(at)
    }

    /// Inserter appending to the outer array.
    pub fn inserter(&mut self) -> Result<ArrayInsert<'_>> {
        let position = self.append_position()?;
        let file = MemFile::open_mut(&mut self.record.block, AccessMode::ReadWrite);
        Ok(ArrayInsert::new(file, position))
    }

    pub fn key(&self) -> Result<RecordKey> {
        self.record.key()
    }

    /// Set a user key. The key type must match the one the builder was
    /// created with.
    pub fn set_key(&mut self, key: &RecordKey) -> Result<()> {
        self.record.write_key(key)
    }

    /// The record as built so far.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Finish: apply the optimize settings and stamp the commit hash.
    pub fn create_end(self) -> Result<Record> {
        let mut record = self.record;
        if self.optimize.compact {
            record.compact()?;
        }
        if self.optimize.shrink {
            record.shrink()?;
        }
        let commit = record.refresh_commit_hash()?;
        debug!(
            len = record.raw_data().len(),
            capacity = record.block.capacity(),
            commit = ?commit,
            "record created"
        );
        Ok(record)
    }
}
