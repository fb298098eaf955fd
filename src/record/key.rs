use crate::error::{CarbonError, Result};
use crate::types::*;
use crate::varuint::{decode_varuint, encode_varuint_array};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use xxhash_rust::const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Kind of primary key a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyType {
    #[default]
    NoKey,
    AutoKey,
    UKey,
    IKey,
    SKey,
}

impl KeyType {
    pub fn marker(self) -> u8 {
        match self {
            KeyType::NoKey => MARKER_KEY_NOKEY,
            KeyType::AutoKey => MARKER_KEY_AUTOKEY,
            KeyType::UKey => MARKER_KEY_UKEY,
            KeyType::IKey => MARKER_KEY_IKEY,
            KeyType::SKey => MARKER_KEY_SKEY,
        }
    }

    pub fn from_marker(marker: u8) -> Result<Self> {
        Ok(match marker {
            MARKER_KEY_NOKEY => KeyType::NoKey,
            MARKER_KEY_AUTOKEY => KeyType::AutoKey,
            MARKER_KEY_UKEY => KeyType::UKey,
            MARKER_KEY_IKEY => KeyType::IKey,
            MARKER_KEY_SKEY => KeyType::SKey,
            other => {
                return Err(CarbonError::MarkerMapping {
                    marker: other,
                    context: "record key",
                });
            }
        })
    }

    /// Keyed records carry a commit hash after the key.
    #[inline]
    pub fn has_commit_hash(self) -> bool {
        self != KeyType::NoKey
    }
}

/// Primary key value of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RecordKey {
    #[default]
    NoKey,
    Auto(u64),
    Unsigned(u64),
    Signed(i64),
    String(String),
}

impl RecordKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            RecordKey::NoKey => KeyType::NoKey,
            RecordKey::Auto(_) => KeyType::AutoKey,
            RecordKey::Unsigned(_) => KeyType::UKey,
            RecordKey::Signed(_) => KeyType::IKey,
            RecordKey::String(_) => KeyType::SKey,
        }
    }

    /// Key a freshly created record of `key_type` starts with. Auto keys are
    /// generated; user keys start zeroed or empty.
    pub fn initial(key_type: KeyType) -> Self {
        match key_type {
            KeyType::NoKey => RecordKey::NoKey,
            KeyType::AutoKey => RecordKey::Auto(generate_auto_key()),
            KeyType::UKey => RecordKey::Unsigned(0),
            KeyType::IKey => RecordKey::Signed(0),
            KeyType::SKey => RecordKey::String(String::new()),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::NoKey => f.write_str("nokey"),
            RecordKey::Auto(k) | RecordKey::Unsigned(k) => write!(f, "{k}"),
            RecordKey::Signed(k) => write!(f, "{k}"),
            RecordKey::String(k) => f.write_str(k),
        }
    }
}

// ─── Auto keys ──────────────────────────────────────────────────────────────

const AUTO_KEY_SEED: u64 = const_xxh64::xxh64(b"carbon:autokey", 0);

static AUTO_KEY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-wide unique-ish key: a per-process counter mixed with the clock.
pub fn generate_auto_key() -> u64 {
    let n = AUTO_KEY_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    xxh64(&nanos.to_le_bytes(), AUTO_KEY_SEED ^ n)
}

// ─── Header codec ───────────────────────────────────────────────────────────

/// Decoded record key header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub key: RecordKey,
    pub commit_hash: Option<u64>,
    /// Header length in bytes; the outer array begins here.
    pub len: usize,
}

impl Header {
    /// Offset of the commit hash, if the record has one.
    pub fn commit_offset(&self) -> Option<usize> {
        self.commit_hash.map(|_| self.len - COMMIT_HASH_SIZE)
    }
}

pub(crate) fn encode_header(buf: &mut Vec<u8>, key: &RecordKey, commit_hash: u64) {
    buf.push(key.key_type().marker());
    match key {
        RecordKey::NoKey => return,
        RecordKey::Auto(k) | RecordKey::Unsigned(k) => buf.extend_from_slice(&k.to_le_bytes()),
        RecordKey::Signed(k) => buf.extend_from_slice(&k.to_le_bytes()),
        RecordKey::String(k) => {
            let (len, width) = encode_varuint_array(k.len() as u64);
            buf.extend_from_slice(&len[..width]);
            buf.extend_from_slice(k.as_bytes());
        }
    }
    buf.extend_from_slice(&commit_hash.to_le_bytes());
}

fn read_u64(data: &[u8], at: usize) -> Result<u64> {
    data.get(at..at + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| CarbonError::ReadOutOfBounds(format!("record header truncated at {at}")))
}

pub(crate) fn decode_header(data: &[u8]) -> Result<Header> {
    let marker = *data
        .first()
        .ok_or_else(|| CarbonError::ReadOutOfBounds("empty record".into()))?;
    let mut at = 1;
    let key = match KeyType::from_marker(marker)? {
        KeyType::NoKey => {
            return Ok(Header {
                key: RecordKey::NoKey,
                commit_hash: None,
                len: 1,
            });
        }
        KeyType::AutoKey => {
            at += 8;
            RecordKey::Auto(read_u64(data, 1)?)
        }
        KeyType::UKey => {
            at += 8;
            RecordKey::Unsigned(read_u64(data, 1)?)
        }
        KeyType::IKey => {
            at += 8;
            RecordKey::Signed(read_u64(data, 1)? as i64)
        }
        KeyType::SKey => {
            let (len, width) = decode_varuint(data.get(1..).unwrap_or(&[]))?;
            let start = 1 + width;
            let end = usize::try_from(len)
                .ok()
                .and_then(|len| start.checked_add(len))
                .filter(|&end| end <= data.len())
                .ok_or_else(|| {
                    CarbonError::ReadOutOfBounds("record string key truncated".into())
                })?;
            let bytes = &data[start..end];
            let key = std::str::from_utf8(bytes)
                .map_err(|e| CarbonError::Corrupted(format!("record string key: {e}")))?;
            at = end;
            RecordKey::String(key.to_owned())
        }
    };
    let commit_hash = read_u64(data, at)?;
    Ok(Header {
        key,
        commit_hash: Some(commit_hash),
        len: at + COMMIT_HASH_SIZE,
    })
}
