//! Records: a key header followed by one outer array, stored in a single
//! [`MemBlock`].

mod build;
mod commit;
mod compact;
mod find;
mod json;
mod key;
mod revise;

pub use build::{CreateOptions, Optimize, RecordBuilder};
pub use commit::{commit_from_str, commit_to_str, compute_commit_hash};
pub use find::FindResult;
pub use key::{KeyType, RecordKey, generate_auto_key};
pub use revise::Revision;

use crate::error::{CarbonError, Result};
use crate::field::{ListDerivation, field_size, list_derivation_of_array};
use crate::insert::encode_empty_array;
use crate::iter::ArrayIter;
use crate::memblock::MemBlock;
use crate::memfile::{AccessMode, MemFile};
use crate::types::{COMMIT_HASH_SIZE, MIN_DOC_CAPACITY};
use key::{Header, decode_header, encode_header};
use tracing::debug;

/// A Carbon document.
///
/// Readers go through [`read`](Record::read); in-place edits that keep the
/// commit hash go through [`patch`](Record::patch); copy-on-write edits that
/// produce a new revision go through [`revise`](Record::revise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    block: MemBlock,
}

impl Record {
    /// Allocate a record holding an empty outer array.
    pub fn create_empty(
        derivation: ListDerivation,
        key_type: KeyType,
        doc_capacity: usize,
        array_capacity: usize,
    ) -> Result<Self> {
        Self::create_with_key(
            &RecordKey::initial(key_type),
            derivation,
            doc_capacity,
            array_capacity,
        )
    }

    pub(crate) fn create_with_key(
        key: &RecordKey,
        derivation: ListDerivation,
        doc_capacity: usize,
        array_capacity: usize,
    ) -> Result<Self> {
        let mut buf = Vec::with_capacity(MIN_DOC_CAPACITY + array_capacity);
        encode_header(&mut buf, key, 0);
        encode_empty_array(&mut buf, derivation, array_capacity);
        let capacity = doc_capacity.max(MIN_DOC_CAPACITY).max(buf.len());
        let mut block = MemBlock::create(capacity)?;
        block.write(0, &buf)?;
        let mut record = Self { block };
        record.refresh_commit_hash()?;
        Ok(record)
    }

    /// Import externally stored bytes, validating the whole structure.
    pub fn from_raw_data(data: &[u8]) -> Result<Self> {
        let header = decode_header(data)?;
        let marker = *data.get(header.len).ok_or_else(|| {
            CarbonError::Corrupted("record has no outer array".into())
        })?;
        list_derivation_of_array(marker)?;
        let size = field_size(data, header.len).map_err(|e| match e {
            CarbonError::Internal(msg) => CarbonError::Corrupted(msg),
            other => other,
        })?;
        let end = header.len + size;
        if end != data.len() {
            return Err(CarbonError::Corrupted(format!(
                "{} trailing bytes after outer array",
                data.len() - end
            )));
        }
        debug!(len = data.len(), key = %header.key, "record imported from raw data");
        Ok(Self {
            block: MemBlock::from_raw_data(data)?,
        })
    }

    /// The encoded record.
    #[inline]
    pub fn raw_data(&self) -> &[u8] {
        self.block.raw_data()
    }

    pub fn into_raw_data(self) -> Vec<u8> {
        self.block.into_raw_data()
    }

    #[inline]
    pub fn block(&self) -> &MemBlock {
        &self.block
    }

    // ════════════════════════════════════════════════════════════════════════
    // Header
    // ════════════════════════════════════════════════════════════════════════

    fn header(&self) -> Result<Header> {
        decode_header(self.block.raw_data())
    }

    pub fn key(&self) -> Result<RecordKey> {
        Ok(self.header()?.key)
    }

    pub fn key_type(&self) -> Result<KeyType> {
        Ok(self.header()?.key.key_type())
    }

    /// Commit hash of this revision; `None` for unkeyed records.
    pub fn commit_hash(&self) -> Result<Option<u64>> {
        Ok(self.header()?.commit_hash)
    }

    pub(crate) fn array_begin(&self) -> Result<usize> {
        Ok(self.header()?.len)
    }

    /// Replace the key, keeping the key type and the stored commit hash.
    pub(crate) fn write_key(&mut self, key: &RecordKey) -> Result<()> {
        let header = self.header()?;
        if header.key.key_type() != key.key_type() {
            return Err(CarbonError::IllegalArgument(format!(
                "record uses {:?} keys, got {:?}",
                header.key.key_type(),
                key.key_type()
            )));
        }
        let mut buf = Vec::with_capacity(header.len);
        encode_header(&mut buf, key, header.commit_hash.unwrap_or(0));
        if buf.len() > header.len {
            self.block.move_right(header.len, buf.len() - header.len)?;
        } else if buf.len() < header.len {
            self.block.move_left(buf.len(), header.len - buf.len())?;
        }
        self.block.write(0, &buf)
    }

    /// Recompute and store the commit hash of a keyed record.
    pub(crate) fn refresh_commit_hash(&mut self) -> Result<Option<u64>> {
        let header = self.header()?;
        let Some(at) = header.commit_offset() else {
            return Ok(None);
        };
        let hash = compute_commit_hash(&self.block.raw_data()[header.len..]);
        self.block.write(at, &hash.to_le_bytes())?;
        debug_assert_eq!(at + COMMIT_HASH_SIZE, header.len);
        Ok(Some(hash))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Access
    // ════════════════════════════════════════════════════════════════════════

    /// Read-only iterator over the outer array.
    pub fn read(&self) -> Result<ArrayIter<'_>> {
        let begin = self.array_begin()?;
        ArrayIter::open(MemFile::open(&self.block), begin)
    }

    /// Read-write iterator over the outer array. Edits happen in place and
    /// the commit hash is left as is.
    pub fn patch(&mut self) -> Result<ArrayIter<'_>> {
        let begin = self.array_begin()?;
        ArrayIter::open(MemFile::open_mut(&mut self.block, AccessMode::ReadWrite), begin)
    }

    /// Trim the block's capacity to the used bytes.
    pub fn shrink(&mut self) -> Result<()> {
        self.block.shrink()
    }
}
