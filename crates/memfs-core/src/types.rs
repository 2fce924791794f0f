// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Core type definitions for the in-memory filesystem

use std::time::{SystemTime, UNIX_EPOCH};

use crate::node::{Entry, EntryKind};

/// File timestamps, seconds since the Unix epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileTimes {
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
    pub birthtime: i64,
}

impl FileTimes {
    pub fn now() -> Self {
        let now = current_timestamp();
        Self {
            atime: now,
            mtime: now,
            ctime: now,
            birthtime: now,
        }
    }

    /// Record a change to the entry's contents
    pub fn touch_modified(&mut self) {
        let now = current_timestamp();
        self.mtime = now;
        self.ctime = now;
    }
}

pub(crate) fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Kind of a tree node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    File,
    Symlink,
}

/// Access modes that can be requested from `check_access`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
    Execute,
}

impl AccessMode {
    /// Owner permission bit granting this mode
    pub fn owner_bit(self) -> u32 {
        match self {
            AccessMode::Read => 0o400,
            AccessMode::Write => 0o200,
            AccessMode::Execute => 0o100,
        }
    }
}

/// Owner and group recorded on entries of a POSIX-flavoured filesystem
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PosixOwnership {
    pub owner: String,
    pub group: String,
}

/// An attribute projection an entry can be asked to materialize
pub trait FileAttributes: Sized {
    /// Name of the attribute view this projection belongs to
    const VIEW_NAME: &'static str;

    /// `None` when the entry cannot produce this projection
    fn materialize(entry: &Entry) -> Option<Self>;
}

/// Attributes every entry provides
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicFileAttributes {
    pub kind: FileKind,
    pub size: u64,
    pub times: FileTimes,
}

impl BasicFileAttributes {
    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_regular_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_symbolic_link(&self) -> bool {
        self.kind == FileKind::Symlink
    }
}

impl FileAttributes for BasicFileAttributes {
    const VIEW_NAME: &'static str = "basic";

    fn materialize(entry: &Entry) -> Option<Self> {
        let size = match &entry.kind {
            EntryKind::Directory { .. } => 0,
            EntryKind::File { contents } => contents.len() as u64,
            EntryKind::Symlink { target } => target.len() as u64,
        };
        Some(Self {
            kind: entry.file_kind(),
            size,
            times: entry.times,
        })
    }
}

/// Basic attributes plus ownership and permission bits
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PosixFileAttributes {
    pub basic: BasicFileAttributes,
    pub owner: String,
    pub group: String,
    pub permissions: u32,
}

impl FileAttributes for PosixFileAttributes {
    const VIEW_NAME: &'static str = "posix";

    fn materialize(entry: &Entry) -> Option<Self> {
        let ownership = entry.ownership.as_ref()?;
        Some(Self {
            basic: BasicFileAttributes::materialize(entry)?,
            owner: ownership.owner.clone(),
            group: ownership.group.clone(),
            permissions: entry.mode & 0o7777,
        })
    }
}
