// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Immutable path values used as traversal keys
//!
//! A path is either a bare [`Root`] (a mount anchor with zero segments) or an
//! [`ElementPath`] made of one or more named segments. Element paths are
//! absolute when they carry a root and relative otherwise.

use std::fmt;

/// Mount anchor of one independent tree (`/` on Unix, `C:` on Windows)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Root {
    name: String,
    separator: char,
}

impl Root {
    pub fn new(name: impl Into<String>, separator: char) -> Self {
        Self {
            name: name.into(),
            separator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn separator(&self) -> char {
        self.separator
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.name.ends_with(self.separator) {
            write!(f, "{}", self.separator)?;
        }
        Ok(())
    }
}

/// Sequence of named segments, optionally anchored at a [`Root`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementPath {
    root: Option<Root>,
    segments: Vec<String>,
    separator: char,
}

impl ElementPath {
    /// Build an element path. `segments` must not be empty; an empty absolute
    /// path is a [`Root`], see [`AbstractPath::from_parts`].
    pub(crate) fn new(root: Option<Root>, segments: Vec<String>, separator: char) -> Self {
        debug_assert!(!segments.is_empty());
        Self {
            root,
            segments,
            separator,
        }
    }

    pub fn root(&self) -> Option<&Root> {
        self.root.as_ref()
    }

    pub fn is_absolute(&self) -> bool {
        self.root.is_some()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn last_segment(&self) -> &str {
        // Never empty, see `new`
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Render the path truncated to its first `len` segments
    pub fn display_prefix(&self, len: usize) -> String {
        let mut out = self.root.as_ref().map(Root::to_string).unwrap_or_default();
        let sep = self.separator.to_string();
        out.push_str(&self.segments[..len.min(self.segments.len())].join(&sep));
        out
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(root) = &self.root {
            write!(f, "{}", root)?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.separator)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Closed set of path representations understood by the traversal
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AbstractPath {
    Root(Root),
    Element(ElementPath),
}

impl AbstractPath {
    /// Assemble a path from an optional root and its segments.
    ///
    /// Returns `None` for a relative path without segments.
    pub fn from_parts(root: Option<Root>, segments: Vec<String>, separator: char) -> Option<Self> {
        match (root, segments.is_empty()) {
            (Some(root), true) => Some(AbstractPath::Root(root)),
            (None, true) => None,
            (root, false) => Some(AbstractPath::Element(ElementPath::new(root, segments, separator))),
        }
    }

    pub fn root(&self) -> Option<&Root> {
        match self {
            AbstractPath::Root(root) => Some(root),
            AbstractPath::Element(path) => path.root(),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.root().is_some()
    }

    pub fn segment_count(&self) -> usize {
        match self {
            AbstractPath::Root(_) => 0,
            AbstractPath::Element(path) => path.segment_count(),
        }
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        match self {
            AbstractPath::Root(_) => None,
            AbstractPath::Element(path) => path.segment(index),
        }
    }

    pub fn last_segment(&self) -> Option<&str> {
        match self {
            AbstractPath::Root(_) => None,
            AbstractPath::Element(path) => Some(path.last_segment()),
        }
    }

    /// One segment shorter. A single-segment absolute path yields its root;
    /// roots and single-segment relative paths have no parent.
    pub fn parent(&self) -> Option<AbstractPath> {
        match self {
            AbstractPath::Root(_) => None,
            AbstractPath::Element(path) => {
                let mut segments = path.segments.clone();
                segments.pop();
                AbstractPath::from_parts(path.root.clone(), segments, path.separator)
            }
        }
    }

    /// Anchor a relative path at `default_root`; absolute paths are returned unchanged.
    pub fn to_absolute(&self, default_root: &Root) -> AbstractPath {
        match self {
            AbstractPath::Element(path) if path.root.is_none() => {
                AbstractPath::Element(ElementPath::new(
                    Some(default_root.clone()),
                    path.segments.clone(),
                    path.separator,
                ))
            }
            other => other.clone(),
        }
    }
}

impl fmt::Display for AbstractPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstractPath::Root(root) => write!(f, "{}", root),
            AbstractPath::Element(path) => write!(f, "{}", path),
        }
    }
}

impl From<Root> for AbstractPath {
    fn from(root: Root) -> Self {
        AbstractPath::Root(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix_root() -> Root {
        Root::new("/", '/')
    }

    fn abs(segments: &[&str]) -> AbstractPath {
        AbstractPath::from_parts(
            Some(unix_root()),
            segments.iter().map(|s| s.to_string()).collect(),
            '/',
        )
        .unwrap()
    }

    #[test]
    fn test_parent_walks_up_to_root() {
        let path = abs(&["a", "b"]);
        let parent = path.parent().unwrap();
        assert_eq!(parent, abs(&["a"]));
        assert_eq!(parent.parent().unwrap(), AbstractPath::Root(unix_root()));
        assert!(AbstractPath::Root(unix_root()).parent().is_none());
    }

    #[test]
    fn test_relative_single_segment_has_no_parent() {
        let path = AbstractPath::from_parts(None, vec!["a".to_string()], '/').unwrap();
        assert!(path.parent().is_none());
        assert!(!path.is_absolute());
    }

    #[test]
    fn test_to_absolute_anchors_relative_paths() {
        let relative = AbstractPath::from_parts(None, vec!["x".into(), "y".into()], '/').unwrap();
        let absolute = relative.to_absolute(&unix_root());
        assert_eq!(absolute, abs(&["x", "y"]));
        assert_eq!(absolute.to_absolute(&Root::new("C:", '\\')), absolute);
    }

    #[test]
    fn test_segment_access() {
        let path = abs(&["usr", "lib"]);
        assert_eq!(path.segment_count(), 2);
        assert_eq!(path.segment(0), Some("usr"));
        assert_eq!(path.segment(1), Some("lib"));
        assert_eq!(path.segment(2), None);
        assert_eq!(path.last_segment(), Some("lib"));
    }

    #[test]
    fn test_display() {
        assert_eq!(abs(&["a", "b"]).to_string(), "/a/b");
        assert_eq!(AbstractPath::Root(unix_root()).to_string(), "/");

        let drive = Root::new("C:", '\\');
        let windows = AbstractPath::from_parts(Some(drive.clone()), vec!["dir".into()], '\\').unwrap();
        assert_eq!(windows.to_string(), "C:\\dir");
        assert_eq!(drive.to_string(), "C:\\");
    }

    #[test]
    fn test_empty_relative_is_rejected() {
        assert!(AbstractPath::from_parts(None, Vec::new(), '/').is_none());
    }
}
