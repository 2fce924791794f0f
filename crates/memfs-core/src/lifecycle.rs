// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Open/closed state shared by every filesystem operation

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{FsError, FsResult};

#[derive(Debug)]
pub struct ClosedFileSystemChecker {
    open: AtomicBool,
}

impl ClosedFileSystemChecker {
    pub fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
        }
    }

    pub fn check(&self) -> FsResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(FsError::ClosedFileSystem)
        }
    }

    /// Mark the filesystem closed. Returns `true` only for the call that
    /// performed the transition.
    pub fn close(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl Default for ClosedFileSystemChecker {
    fn default() -> Self {
        Self::new()
    }
}
