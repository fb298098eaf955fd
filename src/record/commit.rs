use xxhash_rust::xxh64::xxh64;

/// Commit hash of a record revision: xxh64 over the encoded outer array.
#[inline]
pub fn compute_commit_hash(array_bytes: &[u8]) -> u64 {
    xxh64(array_bytes, 0)
}

/// 16 lowercase hex digits, zero padded.
pub fn commit_to_str(hash: u64) -> String {
    format!("{hash:016x}")
}

/// Strict inverse of [`commit_to_str`]: exactly 16 hex digits, nothing else.
pub fn commit_from_str(text: &str) -> Option<u64> {
    if text.len() != 16 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(text, 16).ok()
}
