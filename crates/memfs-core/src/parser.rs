// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Path string parsing for the supported path styles

use crate::error::{FsError, FsResult};
use crate::path::{AbstractPath, Root};

/// Turns textual path segments into [`AbstractPath`] values.
///
/// Parsing is pure given its inputs; `roots` is the set of anchors installed
/// at the time of the call.
pub trait PathParser: Send + Sync {
    fn parse(&self, roots: &[Root], first: &str, more: &[&str]) -> FsResult<AbstractPath>;

    fn separator(&self) -> char;

    /// Roots a fresh filesystem of this style starts with
    fn default_roots(&self) -> Vec<Root>;

    /// The root this style produces for a configured root name.
    /// `InvalidArgument` when no parsed path could ever carry it.
    fn root_named(&self, name: &str) -> FsResult<Root>;
}

/// Collapse raw segments, dropping empty and `.` entries and applying `..`
fn normalize<'a>(raw: impl Iterator<Item = &'a str>, text: &str) -> FsResult<Vec<String>> {
    let mut segments: Vec<String> = Vec::new();
    for segment in raw {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(FsError::InvalidArgument(format!(
                        "{text} escapes above its root"
                    )));
                }
            }
            name => {
                if name.contains('\0') {
                    return Err(FsError::InvalidName(format!("{name:?}")));
                }
                segments.push(name.to_string());
            }
        }
    }
    Ok(segments)
}

fn relative_or_error(segments: Vec<String>, separator: char, text: &str) -> FsResult<AbstractPath> {
    AbstractPath::from_parts(None, segments, separator)
        .ok_or_else(|| FsError::InvalidArgument(format!("empty path {text:?}")))
}

/// `/`-separated paths with the single root `/`
#[derive(Clone, Copy, Debug, Default)]
pub struct UnixPathParser;

impl UnixPathParser {
    pub const SEPARATOR: char = '/';

    pub fn root() -> Root {
        Root::new("/", Self::SEPARATOR)
    }
}

impl PathParser for UnixPathParser {
    fn parse(&self, _roots: &[Root], first: &str, more: &[&str]) -> FsResult<AbstractPath> {
        let joined = std::iter::once(first)
            .chain(more.iter().copied())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        let segments = normalize(joined.split(Self::SEPARATOR), &joined)?;

        if joined.starts_with(Self::SEPARATOR) {
            Ok(AbstractPath::from_parts(Some(Self::root()), segments, Self::SEPARATOR)
                .unwrap_or_else(|| AbstractPath::Root(Self::root())))
        } else {
            relative_or_error(segments, Self::SEPARATOR, &joined)
        }
    }

    fn separator(&self) -> char {
        Self::SEPARATOR
    }

    fn default_roots(&self) -> Vec<Root> {
        vec![Self::root()]
    }

    fn root_named(&self, name: &str) -> FsResult<Root> {
        if name == "/" {
            Ok(Self::root())
        } else {
            Err(FsError::InvalidArgument(format!("{name:?} is not a unix root, only \"/\" is")))
        }
    }
}

/// `\`-separated paths (also accepting `/`) anchored at drive letters
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsPathParser;

impl WindowsPathParser {
    pub const SEPARATOR: char = '\\';

    pub fn drive(letter: char) -> Root {
        Root::new(format!("{}:", letter.to_ascii_uppercase()), Self::SEPARATOR)
    }

    fn split_drive(path: &str) -> Option<(char, &str)> {
        let mut chars = path.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => Some((letter, &path[2..])),
            _ => None,
        }
    }
}

impl PathParser for WindowsPathParser {
    fn parse(&self, roots: &[Root], first: &str, more: &[&str]) -> FsResult<AbstractPath> {
        let joined = std::iter::once(first)
            .chain(more.iter().copied())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\\");
        let is_separator = |c: char| c == '\\' || c == '/';

        match Self::split_drive(&joined) {
            Some((letter, rest)) => {
                if !rest.is_empty() && !rest.starts_with(is_separator) {
                    return Err(FsError::InvalidArgument(format!(
                        "drive-relative path {joined} is not supported"
                    )));
                }
                let wanted = Self::drive(letter);
                let root = roots.iter().find(|r| r.name() == wanted.name()).cloned().unwrap_or(wanted);
                let segments = normalize(rest.split(is_separator), &joined)?;
                Ok(AbstractPath::from_parts(Some(root.clone()), segments, Self::SEPARATOR)
                    .unwrap_or(AbstractPath::Root(root)))
            }
            None if joined.starts_with(is_separator) => Err(FsError::InvalidArgument(format!(
                "path {joined} has no drive letter"
            ))),
            None => {
                let segments = normalize(joined.split(is_separator), &joined)?;
                relative_or_error(segments, Self::SEPARATOR, &joined)
            }
        }
    }

    fn separator(&self) -> char {
        Self::SEPARATOR
    }

    fn default_roots(&self) -> Vec<Root> {
        vec![Self::drive('C')]
    }

    fn root_named(&self, name: &str) -> FsResult<Root> {
        match Self::split_drive(name) {
            Some((letter, rest)) if rest.is_empty() || rest == "\\" || rest == "/" => {
                Ok(Self::drive(letter))
            }
            _ => Err(FsError::InvalidArgument(format!("{name:?} is not a drive root"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_absolute() {
        let parser = UnixPathParser;
        let path = parser.parse(&[], "/usr", &["local", "bin"]).unwrap();
        assert!(path.is_absolute());
        assert_eq!(path.segment_count(), 3);
        assert_eq!(path.to_string(), "/usr/local/bin");
    }

    #[test]
    fn test_unix_root_only() {
        let parser = UnixPathParser;
        assert_eq!(parser.parse(&[], "/", &[]).unwrap(), AbstractPath::Root(UnixPathParser::root()));
        assert_eq!(parser.parse(&[], "//", &["."]).unwrap(), AbstractPath::Root(UnixPathParser::root()));
    }

    #[test]
    fn test_unix_normalizes_dots() {
        let parser = UnixPathParser;
        let path = parser.parse(&[], "/a/./b//../c", &[]).unwrap();
        assert_eq!(path.to_string(), "/a/c");
    }

    #[test]
    fn test_unix_rejects_escape_above_root() {
        let parser = UnixPathParser;
        assert!(matches!(parser.parse(&[], "/..", &[]), Err(FsError::InvalidArgument(_))));
    }

    #[test]
    fn test_unix_relative_and_empty() {
        let parser = UnixPathParser;
        let path = parser.parse(&[], "a", &["b"]).unwrap();
        assert!(!path.is_absolute());
        assert_eq!(path.to_string(), "a/b");
        assert!(matches!(parser.parse(&[], "", &[]), Err(FsError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_nul() {
        let parser = UnixPathParser;
        assert!(matches!(parser.parse(&[], "/a\0b", &[]), Err(FsError::InvalidName(_))));
    }

    #[test]
    fn test_windows_drive_paths() {
        let parser = WindowsPathParser;
        let roots = vec![WindowsPathParser::drive('C'), WindowsPathParser::drive('D')];

        let path = parser.parse(&roots, "d:\\data", &["logs"]).unwrap();
        assert_eq!(path.root().map(Root::name), Some("D:"));
        assert_eq!(path.to_string(), "D:\\data\\logs");

        let mixed = parser.parse(&roots, "C:/Users/me", &[]).unwrap();
        assert_eq!(mixed.to_string(), "C:\\Users\\me");

        assert_eq!(
            parser.parse(&roots, "C:", &[]).unwrap(),
            AbstractPath::Root(WindowsPathParser::drive('C'))
        );
    }

    #[test]
    fn test_windows_absent_drive_still_parses() {
        // Whether the drive exists is decided when the path is used
        let parser = WindowsPathParser;
        let path = parser.parse(&[WindowsPathParser::drive('C')], "E:\\x", &[]).unwrap();
        assert_eq!(path.root(), Some(&WindowsPathParser::drive('E')));
        assert_eq!(path.to_string(), "E:\\x");
    }

    #[test]
    fn test_root_named() {
        assert_eq!(UnixPathParser.root_named("/").unwrap(), UnixPathParser::root());
        assert!(matches!(UnixPathParser.root_named("/mnt"), Err(FsError::InvalidArgument(_))));

        let windows = WindowsPathParser;
        for name in ["c:", "C:", "c:\\", "C:/"] {
            assert_eq!(windows.root_named(name).unwrap(), WindowsPathParser::drive('C'));
        }
        for name in ["", "C", "1:", "C:\\data", "/"] {
            assert!(matches!(windows.root_named(name), Err(FsError::InvalidArgument(_))), "{name}");
        }
    }

    #[test]
    fn test_windows_rejects_rooted_without_drive() {
        let parser = WindowsPathParser;
        assert!(matches!(parser.parse(&[], "\\temp", &[]), Err(FsError::InvalidArgument(_))));
        assert!(matches!(parser.parse(&[], "C:temp", &[]), Err(FsError::InvalidArgument(_))));
    }
}
