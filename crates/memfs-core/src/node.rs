// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Tree nodes
//!
//! Every node lives behind its own reader/writer lock (`EntryRef`). A
//! directory owns its direct children through its child map; removing a
//! name from the map is the only way a node leaves the tree.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{FsError, FsResult};
use crate::types::{AccessMode, FileAttributes, FileKind, FileTimes, PosixOwnership};

/// Shared, lockable handle to a tree node
pub type EntryRef = Arc<RwLock<Entry>>;

/// Node variants
#[derive(Debug)]
pub enum EntryKind {
    Directory { children: HashMap<String, EntryRef> },
    File { contents: Vec<u8> },
    Symlink { target: String },
}

/// Node payload guarded by the node's lock
#[derive(Debug)]
pub struct Entry {
    pub(crate) kind: EntryKind,
    pub(crate) times: FileTimes,
    pub(crate) mode: u32,
    pub(crate) ownership: Option<PosixOwnership>,
}

impl Entry {
    pub fn new_directory(mode: u32, ownership: Option<PosixOwnership>) -> Self {
        Self {
            kind: EntryKind::Directory {
                children: HashMap::new(),
            },
            times: FileTimes::now(),
            mode,
            ownership,
        }
    }

    pub fn new_file(mode: u32, ownership: Option<PosixOwnership>) -> Self {
        Self {
            kind: EntryKind::File {
                contents: Vec::new(),
            },
            times: FileTimes::now(),
            mode,
            ownership,
        }
    }

    pub fn new_symlink(target: String, ownership: Option<PosixOwnership>) -> Self {
        Self {
            kind: EntryKind::Symlink { target },
            times: FileTimes::now(),
            mode: 0o777,
            ownership,
        }
    }

    pub fn into_ref(self) -> EntryRef {
        Arc::new(RwLock::new(self))
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn file_kind(&self) -> FileKind {
        match self.kind {
            EntryKind::Directory { .. } => FileKind::Directory,
            EntryKind::File { .. } => FileKind::File,
            EntryKind::Symlink { .. } => FileKind::Symlink,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory { .. })
    }

    pub fn times(&self) -> FileTimes {
        self.times
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Look up a direct child. `None` for a missing name and for non-directories.
    pub fn child(&self, name: &str) -> Option<EntryRef> {
        match &self.kind {
            EntryKind::Directory { children } => children.get(name).cloned(),
            EntryKind::File { .. } | EntryKind::Symlink { .. } => None,
        }
    }

    /// Sorted names of the direct children, `None` for non-directories
    pub fn child_names(&self) -> Option<Vec<String>> {
        match &self.kind {
            EntryKind::Directory { children } => {
                let mut names: Vec<String> = children.keys().cloned().collect();
                names.sort();
                Some(names)
            }
            EntryKind::File { .. } | EntryKind::Symlink { .. } => None,
        }
    }

    /// Link `node` in under `name`. An existing name is never replaced.
    pub fn add_child(&mut self, name: &str, node: EntryRef) -> FsResult<()> {
        match &mut self.kind {
            EntryKind::Directory { children } => {
                if children.contains_key(name) {
                    return Err(FsError::AlreadyExists(name.to_string()));
                }
                children.insert(name.to_string(), node);
                self.times.touch_modified();
                Ok(())
            }
            EntryKind::File { .. } | EntryKind::Symlink { .. } => {
                Err(FsError::NotADirectory(name.to_string()))
            }
        }
    }

    /// Fails with `AccessDenied` naming the first mode the owner bits do not grant
    pub fn check_access(&self, modes: &[AccessMode]) -> FsResult<()> {
        match modes.iter().find(|mode| self.mode & mode.owner_bit() == 0) {
            Some(mode) => Err(FsError::AccessDenied(format!("{mode:?} not permitted"))),
            None => Ok(()),
        }
    }

    pub fn read_attributes<A: FileAttributes>(&self) -> FsResult<A> {
        A::materialize(self).ok_or_else(|| FsError::UnsupportedAttribute(A::VIEW_NAME.to_string()))
    }
}
