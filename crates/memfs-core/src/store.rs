// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Store descriptor backing one in-memory filesystem

/// Describes the single store a filesystem keeps its tree in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryFileStore {
    name: String,
    key: String,
    read_only: bool,
}

impl MemoryFileStore {
    pub const TYPE_NAME: &'static str = "memory";

    pub fn new(name: impl Into<String>, key: impl Into<String>, read_only: bool) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            read_only,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity under which the owning filesystem is registered
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }
}
