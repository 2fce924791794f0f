// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory hierarchical filesystem
//!
//! Paths are resolved from a root anchor down to their target with lock
//! coupling: every ancestor is held under a read lock while the next node is
//! locked, and only the final node may be locked for writing. Unrelated
//! subtrees never contend, and no traversal can observe an ancestor being
//! restructured underneath it.

pub mod config;
pub mod error;
pub mod filesystem;
pub mod lifecycle;
pub mod node;
pub mod parser;
pub mod path;
pub mod principal;
pub mod provider;
pub mod roots;
pub mod store;
pub mod traversal;
pub mod types;

// Re-export key types for convenience
pub use config::{AttributeView, MemoryFsConfig, PathStyle};
pub use error::{FsError, FsResult};
pub use filesystem::MemoryFileSystem;
pub use node::{Entry, EntryKind, EntryRef};
pub use parser::{PathParser, UnixPathParser, WindowsPathParser};
pub use path::{AbstractPath, ElementPath, Root};
pub use principal::{UserPrincipal, UserPrincipalLookupService};
pub use provider::{FileSystemRegistry, MemoryFileSystemProvider};
pub use roots::{RootDirectories, RootTable, RootTableCell};
pub use store::MemoryFileStore;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FsError::NoSuchFile("/a".to_string());
        assert_eq!(err.to_string(), "no such file: /a");
        assert_eq!(FsError::ClosedFileSystem.to_string(), "file system is closed");
    }
}
