use super::find::{Target, resolve};
use super::{FindResult, KeyType, Record, RecordKey, generate_auto_key};
use crate::error::{CarbonError, Result};
use crate::field::Scalar;
use crate::iter::ArrayIter;
use crate::path::DotPath;
use tracing::debug;

/// A copy-on-write revision of a record.
///
/// Edits apply to a private copy; [`end`](Revision::end) stamps a fresh
/// commit hash and returns the new record. The original is never touched.
#[derive(Debug)]
pub struct Revision {
    record: Record,
    previous_commit: Option<u64>,
}

impl Record {
    pub fn revise(&self) -> Result<Revision> {
        Ok(Revision {
            record: self.clone(),
            previous_commit: self.commit_hash()?,
        })
    }
}

impl Revision {
    /// Read-write iterator over the revision's outer array.
    pub fn iterator(&mut self) -> Result<ArrayIter<'_>> {
        self.record.patch()
    }

    pub fn key(&self) -> Result<RecordKey> {
        self.record.key()
    }

    /// Replace the key. Its type must match the record's key type.
    pub fn set_key(&mut self, key: &RecordKey) -> Result<()> {
        self.record.write_key(key)
    }

    /// Assign a freshly generated auto key.
    pub fn generate_key(&mut self) -> Result<u64> {
        if self.record.key_type()? != KeyType::AutoKey {
            return Err(CarbonError::IllegalState("record does not use auto keys"));
        }
        let key = generate_auto_key();
        self.record.write_key(&RecordKey::Auto(key))?;
        Ok(key)
    }

    pub fn find(&self, path: &str) -> Result<FindResult> {
        self.record.find(path)
    }

    /// Remove the element, property or column slot at `path`. Returns
    /// `false` if the path does not exist.
    pub fn remove(&mut self, path: &str) -> Result<bool> {
        let path = DotPath::parse(path)?;
        if path.is_empty() {
            return Err(CarbonError::IllegalArgument("cannot remove the whole record".into()));
        }
        let mut outer = self.record.patch()?;
        let removed = resolve(&mut outer, &path, &mut |target| match target {
            Target::Element(it) => it.remove(),
            Target::Property(it) => it.remove(),
            Target::Slot(col, index) => col.remove(index),
        })?;
        Ok(removed.is_some())
    }

    /// Overwrite the scalar at `path` with `value`, whatever its current
    /// type. Column slots take values that fit the column type. Returns
    /// `false` if the path does not exist.
    pub fn update(&mut self, path: &str, value: &Scalar<'_>) -> Result<bool> {
        let path = DotPath::parse(path)?;
        if path.is_empty() {
            return Err(CarbonError::IllegalArgument("cannot update the whole record".into()));
        }
        let mut outer = self.record.patch()?;
        let updated = resolve(&mut outer, &path, &mut |target| match target {
            Target::Element(it) => it.replace(value),
            Target::Property(it) => it.replace(value),
            Target::Slot(col, index) => col.update_set(index, value),
        })?;
        Ok(updated.is_some())
    }

    pub fn compact(&mut self) -> Result<()> {
        self.record.compact()
    }

    pub fn shrink(&mut self) -> Result<()> {
        self.record.shrink()
    }

    /// The revision as edited so far.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Finish the revision with a recomputed commit hash.
    pub fn end(self) -> Result<Record> {
        let mut record = self.record;
        let commit = record.refresh_commit_hash()?;
        debug!(previous = ?self.previous_commit, commit = ?commit, "revision committed");
        Ok(record)
    }
}
