//! Dot-separated paths into a record, e.g. `users.0."first.name"`.
//!
//! Unquoted segments made of digits only are array or column indices; every
//! other segment is an object key. Double quotes make a segment a key
//! verbatim, so it may contain dots or digits only (`\"` and `\\` escape).

use crate::error::{CarbonError, Result};
use smol_str::SmolStr;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathNode {
    Key(SmolStr),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DotPath {
    nodes: Vec<PathNode>,
}

impl DotPath {
    /// The empty path addresses the whole record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut nodes = Vec::new();
        if text.is_empty() {
            return Ok(Self { nodes });
        }
        let mut chars = text.char_indices().peekable();
        loop {
            let node = match chars.peek().copied() {
                Some((at, '"')) => {
                    chars.next();
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '"')) => break,
                            Some((_, '\\')) => match chars.next() {
                                Some((_, c @ ('"' | '\\'))) => key.push(c),
                                _ => {
                                    return Err(CarbonError::DotPath(format!(
                                        "bad escape in quoted key starting at {at}"
                                    )));
                                }
                            },
                            Some((_, c)) => key.push(c),
                            None => {
                                return Err(CarbonError::DotPath(format!(
                                    "unterminated quote at {at}"
                                )));
                            }
                        }
                    }
                    PathNode::Key(SmolStr::from(key))
                }
                Some((at, _)) => {
                    let mut end = text.len();
                    while let Some(&(i, c)) = chars.peek() {
                        if c == '.' {
                            end = i;
                            break;
                        }
                        if c == '"' {
                            return Err(CarbonError::DotPath(format!(
                                "unexpected quote at {i}"
                            )));
                        }
                        chars.next();
                    }
                    Self::plain_node(&text[at..end], at)?
                }
                None => {
                    return Err(CarbonError::DotPath(format!(
                        "empty segment at end of '{text}'"
                    )));
                }
            };
            nodes.push(node);
            match chars.next() {
                None => break,
                Some((_, '.')) => {}
                Some((i, c)) => {
                    return Err(CarbonError::DotPath(format!(
                        "expected '.' at {i}, found '{c}'"
                    )));
                }
            }
        }
        Ok(Self { nodes })
    }

    fn plain_node(segment: &str, at: usize) -> Result<PathNode> {
        if segment.is_empty() {
            return Err(CarbonError::DotPath(format!("empty segment at {at}")));
        }
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            let index = segment
                .parse()
                .map_err(|_| CarbonError::DotPath(format!("index '{segment}' out of range")))?;
            return Ok(PathNode::Index(index));
        }
        Ok(PathNode::Key(SmolStr::from(segment)))
    }

    pub fn push_key(&mut self, key: &str) {
        self.nodes.push(PathNode::Key(SmolStr::from(key)));
    }

    pub fn push_index(&mut self, index: usize) {
        self.nodes.push(PathNode::Index(index));
    }

    #[inline]
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl std::str::FromStr for DotPath {
    type Err = CarbonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn needs_quotes(key: &str) -> bool {
    key.is_empty()
        || key.bytes().all(|b| b.is_ascii_digit())
        || key.contains(['.', '"', '\\'])
}

impl fmt::Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathNode::Index(i) => write!(f, "{i}"),
            PathNode::Key(k) if needs_quotes(k) => {
                f.write_str("\"")?;
                for c in k.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            PathNode::Key(k) => f.write_str(k),
        }
    }
}

impl fmt::Display for DotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(k: &str) -> PathNode {
        PathNode::Key(SmolStr::from(k))
    }

    #[test]
    fn test_parse_keys_and_indices() {
        let path = DotPath::parse("users.0.name").unwrap();
        assert_eq!(path.nodes(), &[key("users"), PathNode::Index(0), key("name")]);
    }

    #[test]
    fn test_parse_quoted_keys() {
        let path = DotPath::parse(r#""a.b"."0".x"#).unwrap();
        assert_eq!(path.nodes(), &[key("a.b"), key("0"), key("x")]);
        let path = DotPath::parse(r#""say \"hi\"""#).unwrap();
        assert_eq!(path.nodes(), &[key(r#"say "hi""#)]);
    }

    #[test]
    fn test_parse_empty_is_root() {
        assert!(DotPath::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["a..b", ".a", "a.", "\"open", "a\"b", "\"a\"b", "99999999999999999999999"] {
            assert!(
                matches!(DotPath::parse(bad), Err(CarbonError::DotPath(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_display_quotes_when_needed() {
        let mut path = DotPath::new();
        path.push_key("plain");
        path.push_index(3);
        path.push_key("7");
        path.push_key("a.b");
        assert_eq!(path.to_string(), r#"plain.3."7"."a.b""#);
    }

    proptest! {
        #[test]
        fn prop_display_parse_roundtrip(
            nodes in prop::collection::vec(
                prop_oneof![
                    "[a-z.\"0-9 ]{0,6}".prop_map(|s| PathNode::Key(SmolStr::from(s))),
                    (0usize..1000).prop_map(PathNode::Index),
                ],
                1..5,
            )
        ) {
            let path = DotPath { nodes };
            prop_assert_eq!(DotPath::parse(&path.to_string()).unwrap(), path);
        }
    }
}
