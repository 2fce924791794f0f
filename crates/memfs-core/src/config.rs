// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration types for the in-memory filesystem

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};
use crate::parser::{PathParser, UnixPathParser, WindowsPathParser};
use crate::path::Root;
use crate::types::PosixOwnership;

/// Path flavour of a filesystem
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    Unix,
    Windows,
}

impl PathStyle {
    pub fn parser(self) -> Box<dyn PathParser> {
        match self {
            PathStyle::Unix => Box::new(UnixPathParser),
            PathStyle::Windows => Box::new(WindowsPathParser),
        }
    }
}

/// Attribute views a filesystem can expose
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeView {
    Basic,
    Posix,
}

impl AttributeView {
    pub fn name(self) -> &'static str {
        match self {
            AttributeView::Basic => "basic",
            AttributeView::Posix => "posix",
        }
    }
}

/// Main filesystem configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryFsConfig {
    pub path_style: PathStyle,
    /// Root names to install; `None` uses the style's default roots
    pub roots: Option<Vec<String>>,
    pub store_name: String,
    pub read_only: bool,
    pub attribute_views: Vec<AttributeView>,
    pub default_directory_mode: u32,
    pub default_file_mode: u32,
    pub owner: String,
    pub group: String,
    pub users: Vec<String>,
    pub groups: Vec<String>,
}

impl Default for MemoryFsConfig {
    fn default() -> Self {
        Self::unix()
    }
}

impl MemoryFsConfig {
    pub fn unix() -> Self {
        Self {
            path_style: PathStyle::Unix,
            roots: None,
            store_name: "memfs".to_string(),
            read_only: false,
            attribute_views: vec![AttributeView::Basic, AttributeView::Posix],
            default_directory_mode: 0o755,
            default_file_mode: 0o644,
            owner: "root".to_string(),
            group: "root".to_string(),
            users: vec!["root".to_string()],
            groups: vec!["root".to_string()],
        }
    }

    pub fn windows() -> Self {
        Self {
            path_style: PathStyle::Windows,
            attribute_views: vec![AttributeView::Basic],
            owner: "Administrator".to_string(),
            group: "Administrators".to_string(),
            users: vec!["Administrator".to_string()],
            groups: vec!["Administrators".to_string()],
            ..Self::unix()
        }
    }

    pub fn from_json_bytes(bytes: &[u8]) -> FsResult<Self> {
        let config: Self = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> FsResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json_bytes(&bytes)
    }

    pub fn validate(&self) -> FsResult<()> {
        if matches!(&self.roots, Some(roots) if roots.is_empty()) {
            return Err(FsError::InvalidArgument("at least one root is required".to_string()));
        }
        if !self.attribute_views.contains(&AttributeView::Basic) {
            return Err(FsError::InvalidArgument(
                "the basic attribute view cannot be disabled".to_string(),
            ));
        }
        self.resolved_roots()?;
        Ok(())
    }

    /// Roots a new filesystem built from this configuration starts with,
    /// spelled the way the style's parser produces them
    pub fn resolved_roots(&self) -> FsResult<Vec<Root>> {
        let parser = self.path_style.parser();
        let Some(names) = &self.roots else {
            return Ok(parser.default_roots());
        };
        let mut roots: Vec<Root> = Vec::with_capacity(names.len());
        for name in names {
            let root = parser.root_named(name)?;
            if roots.contains(&root) {
                return Err(FsError::InvalidArgument(format!("root {root} is listed twice")));
            }
            roots.push(root);
        }
        Ok(roots)
    }

    pub fn supports(&self, view: AttributeView) -> bool {
        self.attribute_views.contains(&view)
    }

    /// Ownership stamped on new entries, present only when the posix view is enabled
    pub fn ownership(&self) -> Option<PosixOwnership> {
        self.supports(AttributeView::Posix).then(|| PosixOwnership {
            owner: self.owner.clone(),
            group: self.group.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_unix() {
        let config = MemoryFsConfig::default();
        assert_eq!(config.path_style, PathStyle::Unix);
        assert_eq!(config.resolved_roots().unwrap(), vec![Root::new("/", '/')]);
        assert!(config.ownership().is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_windows_preset_has_no_posix_view() {
        let config = MemoryFsConfig::windows();
        assert!(config.ownership().is_none());
        assert_eq!(config.resolved_roots().unwrap(), vec![Root::new("C:", '\\')]);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = MemoryFsConfig::from_json_bytes(
            br#"{"path_style":"windows","roots":["C:","D:"],"read_only":true}"#,
        )
        .unwrap();
        assert!(config.read_only);
        assert_eq!(config.resolved_roots().unwrap().len(), 2);
        assert_eq!(config.default_directory_mode, 0o755);
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(
            MemoryFsConfig::from_json_bytes(br#"{"roots":[]}"#),
            Err(FsError::InvalidArgument(_))
        ));
        assert!(matches!(
            MemoryFsConfig::from_json_bytes(br#"{"attribute_views":["posix"]}"#),
            Err(FsError::InvalidArgument(_))
        ));
        assert!(matches!(MemoryFsConfig::from_json_bytes(b"not json"), Err(FsError::Config(_))));
    }

    #[test]
    fn test_windows_roots_are_normalised() {
        let config = MemoryFsConfig {
            roots: Some(vec!["c:".to_string(), "d:\\".to_string()]),
            ..MemoryFsConfig::windows()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.resolved_roots().unwrap(),
            vec![Root::new("C:", '\\'), Root::new("D:", '\\')]
        );

        let duplicate = MemoryFsConfig {
            roots: Some(vec!["c:".to_string(), "C:".to_string()]),
            ..MemoryFsConfig::windows()
        };
        assert!(matches!(duplicate.validate(), Err(FsError::InvalidArgument(_))));
    }

    #[test]
    fn test_unreachable_roots_rejected() {
        let unix = MemoryFsConfig {
            roots: Some(vec!["/mnt".to_string()]),
            ..MemoryFsConfig::unix()
        };
        assert!(matches!(unix.validate(), Err(FsError::InvalidArgument(_))));

        let windows = MemoryFsConfig {
            roots: Some(vec!["C:\\data".to_string()]),
            ..MemoryFsConfig::windows()
        };
        assert!(matches!(windows.validate(), Err(FsError::InvalidArgument(_))));

        assert!(matches!(
            MemoryFsConfig::from_json_bytes(br#"{"roots":["/", "/mnt"]}"#),
            Err(FsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"store_name":"scratch"}}"#).unwrap();
        let config = MemoryFsConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.store_name, "scratch");

        let missing = MemoryFsConfig::from_json_file(Path::new("/nonexistent/memfs.json"));
        assert!(matches!(missing, Err(FsError::Io(_))));
    }
}
