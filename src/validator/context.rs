//! Traversal context and structural paths
//!
//! A [`ValidationContext`] is created once per top-level call and derived per
//! nested frame. Children share the root and the scenario; only the path grows.

use serde_json::Value;
use std::fmt;

/// One bracketed token of a structural path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Named field, rendered `[key]`
    Key(String),
    /// Sequence position, rendered `[index]`
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "[{}]", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Ordered sequence of path segments from the root to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// The empty (root) path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path extended by one segment.
    pub fn join(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Returns the segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Position of a row inside an each-mode container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIndex {
    /// Row of a sequence
    Position(usize),
    /// Entry of a map walked in each mode
    Key(String),
}

impl RowIndex {
    /// Returns the path segment identifying the row.
    pub fn segment(&self) -> PathSegment {
        match self {
            RowIndex::Position(i) => PathSegment::Index(*i),
            RowIndex::Key(k) => PathSegment::Key(k.clone()),
        }
    }

    /// Returns the position for sequence rows.
    pub fn position(&self) -> Option<usize> {
        match self {
            RowIndex::Position(i) => Some(*i),
            RowIndex::Key(_) => None,
        }
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowIndex::Position(i) => write!(f, "{}", i),
            RowIndex::Key(k) => write!(f, "{}", k),
        }
    }
}

/// Immutable bundle threaded through recursion.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    /// Value passed to the top-level call
    pub root: &'a Value,
    /// Name the root value is known by
    pub root_key: &'a str,
    /// Path of the current frame
    pub path: KeyPath,
    /// Active scenario
    pub scenario: &'a str,
}

impl<'a> ValidationContext<'a> {
    /// Creates the context of a top-level call.
    pub fn new(root: &'a Value, root_key: &'a str, scenario: &'a str) -> Self {
        Self {
            root,
            root_key,
            path: KeyPath::root(),
            scenario,
        }
    }

    /// Derives a child frame with the path extended by `segment`.
    pub fn child(&self, segment: PathSegment) -> Self {
        Self {
            root: self.root,
            root_key: self.root_key,
            path: self.path.join(segment),
            scenario: self.scenario,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_rendering() {
        let path = KeyPath::root()
            .join(PathSegment::Key("foo".into()))
            .join(PathSegment::Index(1))
            .join(PathSegment::Key("x".into()));
        assert_eq!(path.to_string(), "[foo][1][x]");
        assert_eq!(path.segments().len(), 3);
    }

    #[test]
    fn test_root_path_renders_empty() {
        assert_eq!(KeyPath::root().to_string(), "");
        assert!(KeyPath::root().is_root());
    }

    #[test]
    fn test_child_shares_root() {
        let root = json!({"a": 1});
        let ctx = ValidationContext::new(&root, "value", "default");
        let child = ctx.child(PathSegment::Key("a".into()));
        assert!(std::ptr::eq(ctx.root, child.root));
        assert_eq!(child.path.to_string(), "[a]");
        assert!(ctx.path.is_root());
    }

    #[test]
    fn test_row_index_segment() {
        assert_eq!(RowIndex::Position(3).segment(), PathSegment::Index(3));
        assert_eq!(RowIndex::Key("k".into()).segment(), PathSegment::Key("k".into()));
        assert_eq!(RowIndex::Position(3).position(), Some(3));
        assert_eq!(RowIndex::Key("k".into()).position(), None);
    }
}
