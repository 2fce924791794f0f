// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the in-memory filesystem

use std::io;

/// Core filesystem error type
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    #[error("file system is closed")]
    ClosedFileSystem,
    #[error("no such file: {0}")]
    NoSuchFile(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("unsupported attribute view: {0}")]
    UnsupportedAttribute(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("name not allowed: {0}")]
    InvalidName(String),
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("read-only file system")]
    ReadOnlyFileSystem,
    #[error("file system not found: {0}")]
    FileSystemNotFound(String),
    #[error("user principal not found: {0}")]
    PrincipalNotFound(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type FsResult<T> = Result<T, FsError>;

impl From<serde_json::Error> for FsError {
    fn from(err: serde_json::Error) -> Self {
        FsError::Config(err.to_string())
    }
}
