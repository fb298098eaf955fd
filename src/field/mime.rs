use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// `(mime type, file extension)`. The position in this table is the id
/// stored in binary fields, so entries are only ever appended.
const MIME_TABLE: &[(&str, &str)] = &[
    ("application/octet-stream", "bin"),
    ("application/json", "json"),
    ("application/pdf", "pdf"),
    ("application/zip", "zip"),
    ("application/gzip", "gz"),
    ("application/xml", "xml"),
    ("application/cbor", "cbor"),
    ("application/msgpack", "msgpack"),
    ("application/javascript", "js"),
    ("application/wasm", "wasm"),
    ("audio/mpeg", "mp3"),
    ("audio/ogg", "ogg"),
    ("audio/wav", "wav"),
    ("font/woff2", "woff2"),
    ("image/bmp", "bmp"),
    ("image/gif", "gif"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/svg+xml", "svg"),
    ("image/webp", "webp"),
    ("text/css", "css"),
    ("text/csv", "csv"),
    ("text/html", "html"),
    ("text/markdown", "md"),
    ("text/plain", "txt"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
];

const EXTENSION_ALIASES: &[(&str, &str)] = &[("jpeg", "jpg"), ("htm", "html"), ("text", "txt")];

fn by_extension() -> &'static FxHashMap<&'static str, u32> {
    static INDEX: OnceLock<FxHashMap<&'static str, u32>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = FxHashMap::default();
        for (id, (_, ext)) in MIME_TABLE.iter().enumerate() {
            map.insert(*ext, id as u32);
        }
        for (alias, canonical) in EXTENSION_ALIASES {
            if let Some(&id) = map.get(canonical) {
                map.insert(*alias, id);
            }
        }
        map
    })
}

/// Mime type of a binary field, stored on the wire as its table id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MimeType(u32);

impl MimeType {
    pub const OCTET_STREAM: MimeType = MimeType(0);
    pub const JSON: MimeType = MimeType(1);

    /// Look up by file extension (without the dot, case-insensitive).
    /// Unknown extensions map to `application/octet-stream`.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        by_extension()
            .get(ext.as_str())
            .copied()
            .map(MimeType)
            .unwrap_or(MimeType::OCTET_STREAM)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        MIME_TABLE
            .iter()
            .position(|(mime, _)| mime.eq_ignore_ascii_case(name))
            .map(|id| MimeType(id as u32))
    }

    pub fn from_id(id: u64) -> Option<Self> {
        (id < MIME_TABLE.len() as u64).then_some(MimeType(id as u32))
    }

    #[inline]
    pub fn id(self) -> u64 {
        self.0 as u64
    }

    pub fn name(self) -> &'static str {
        MIME_TABLE[self.0 as usize].0
    }

    pub fn extension(self) -> &'static str {
        MIME_TABLE[self.0 as usize].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_lookup() {
        assert_eq!(MimeType::from_extension("PNG").name(), "image/png");
        assert_eq!(MimeType::from_extension(".jpeg").name(), "image/jpeg");
        assert_eq!(MimeType::from_extension("nope"), MimeType::OCTET_STREAM);
        assert_eq!(MimeType::from_name("application/json"), Some(MimeType::JSON));
        assert_eq!(MimeType::from_id(9999), None);
        assert_eq!(MimeType::from_id(1).map(|m| m.extension()), Some("json"));
    }
}
