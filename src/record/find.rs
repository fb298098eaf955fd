use super::Record;
use crate::error::Result;
use crate::field::FieldType;
use crate::iter::{ArrayIter, ColumnIter, ObjectIter};
use crate::path::{DotPath, PathNode};
use crate::value::CarbonValue;
use std::borrow::Cow;
use std::fmt;

/// Outcome of a path lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FindResult {
    #[default]
    Undefined,
    Found(CarbonValue),
}

impl FindResult {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, FindResult::Found(_))
    }

    pub fn value(&self) -> Option<&CarbonValue> {
        match self {
            FindResult::Found(v) => Some(v),
            FindResult::Undefined => None,
        }
    }

    pub fn into_value(self) -> Option<CarbonValue> {
        match self {
            FindResult::Found(v) => Some(v),
            FindResult::Undefined => None,
        }
    }
}

impl fmt::Display for FindResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindResult::Undefined => f.write_str("undef"),
            FindResult::Found(v) => f.write_str(&v.to_json().map_err(|_| fmt::Error)?),
        }
    }
}

// ─── Resolution ─────────────────────────────────────────────────────────────

/// The element a path resolved to, with the iterator positioned on it.
pub(crate) enum Target<'i, 'a> {
    Element(&'i mut ArrayIter<'a>),
    Property(&'i mut ObjectIter<'a>),
    Slot(&'i mut ColumnIter<'a>, usize),
}

/// A record whose outer array holds a single object may be addressed
/// without the leading `0`.
fn effective_nodes<'p>(outer: &mut ArrayIter<'_>, path: &'p DotPath) -> Result<Cow<'p, [PathNode]>> {
    let nodes = path.nodes();
    if matches!(nodes.first(), Some(PathNode::Key(_)))
        && outer.length()? == 1
        && outer.move_to(0)?
        && matches!(outer.field_type()?, FieldType::Object(_))
    {
        let mut full = Vec::with_capacity(nodes.len() + 1);
        full.push(PathNode::Index(0));
        full.extend_from_slice(nodes);
        outer.rewind();
        return Ok(Cow::Owned(full));
    }
    outer.rewind();
    Ok(Cow::Borrowed(nodes))
}

/// Resolve `path` from the outer array and apply `f` to the target.
/// `Ok(None)` when the path does not exist.
pub(crate) fn resolve<R, F>(outer: &mut ArrayIter<'_>, path: &DotPath, f: &mut F) -> Result<Option<R>>
where
    F: FnMut(Target<'_, '_>) -> Result<R>,
{
    let nodes = effective_nodes(outer, path)?;
    walk_array(outer, &nodes, f)
}

fn walk_array<R, F>(iter: &mut ArrayIter<'_>, nodes: &[PathNode], f: &mut F) -> Result<Option<R>>
where
    F: FnMut(Target<'_, '_>) -> Result<R>,
{
    let Some((PathNode::Index(index), rest)) = nodes.split_first() else {
        return Ok(None);
    };
    if !iter.move_to(*index)? {
        return Ok(None);
    }
    if rest.is_empty() {
        return f(Target::Element(iter)).map(Some);
    }
    match iter.field_type()? {
        FieldType::Array(_) => walk_array(&mut iter.array_value()?, rest, f),
        FieldType::Object(_) => walk_object(&mut iter.object_value()?, rest, f),
        FieldType::Column(..) => walk_column(&mut iter.column_value()?, rest, f),
        _ => Ok(None),
    }
}

fn walk_object<R, F>(iter: &mut ObjectIter<'_>, nodes: &[PathNode], f: &mut F) -> Result<Option<R>>
where
    F: FnMut(Target<'_, '_>) -> Result<R>,
{
    let Some((PathNode::Key(key), rest)) = nodes.split_first() else {
        return Ok(None);
    };
    if !iter.find_key(key)? {
        return Ok(None);
    }
    if rest.is_empty() {
        return f(Target::Property(iter)).map(Some);
    }
    match iter.field_type()? {
        FieldType::Array(_) => walk_array(&mut iter.array_value()?, rest, f),
        FieldType::Object(_) => walk_object(&mut iter.object_value()?, rest, f),
        FieldType::Column(..) => walk_column(&mut iter.column_value()?, rest, f),
        _ => Ok(None),
    }
}

fn walk_column<R, F>(iter: &mut ColumnIter<'_>, nodes: &[PathNode], f: &mut F) -> Result<Option<R>>
where
    F: FnMut(Target<'_, '_>) -> Result<R>,
{
    match nodes {
        [PathNode::Index(index)] if *index < iter.length()? => {
            f(Target::Slot(iter, *index)).map(Some)
        }
        _ => Ok(None),
    }
}

impl Record {
    /// Look up the value at a dot path. The empty path yields the whole
    /// record as [`to_value`](Record::to_value) decodes it.
    pub fn find(&self, path: &str) -> Result<FindResult> {
        self.find_path(&DotPath::parse(path)?)
    }

    pub fn find_path(&self, path: &DotPath) -> Result<FindResult> {
        if path.is_empty() {
            return Ok(FindResult::Found(self.to_value()?));
        }
        let mut outer = self.read()?;
        let found = resolve(&mut outer, path, &mut |target| match target {
            Target::Element(it) => it.value(),
            Target::Property(it) => it.value(),
            Target::Slot(col, index) => Ok(CarbonValue::from(col.value(index)?)),
        })?;
        Ok(found.map_or(FindResult::Undefined, FindResult::Found))
    }
}
