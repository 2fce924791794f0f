// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Lock-coupled path traversal
//!
//! A traversal walks from a root directory to its target holding a read lock
//! on every ancestor it passes, and takes the terminal lock (read or write)
//! only on the node the path names. Locks are always acquired root-to-leaf
//! and released leaf-to-root, on success and on every error path.

use parking_lot::{ArcRwLockReadGuard, RawRwLock};
use tracing::trace;

use crate::error::{FsError, FsResult};
use crate::node::{Entry, EntryKind, EntryRef};
use crate::path::{AbstractPath, ElementPath};

/// Terminal lock mode of a traversal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalLock {
    Read,
    Write,
}

/// Stack of read locks held on the ancestors of the current position
struct LockChain {
    held: Vec<ArcRwLockReadGuard<RawRwLock, Entry>>,
}

impl LockChain {
    fn with_capacity(depth: usize) -> Self {
        Self {
            held: Vec::with_capacity(depth),
        }
    }

    fn acquire(&mut self, node: &EntryRef) {
        self.held.push(node.read_arc());
        trace!(depth = self.held.len() - 1, "read lock acquired");
    }

    fn top(&self) -> Option<&Entry> {
        self.held.last().map(|guard| &**guard)
    }
}

impl Drop for LockChain {
    fn drop(&mut self) {
        // Vec drops front-to-back; release innermost first instead
        while let Some(guard) = self.held.pop() {
            drop(guard);
        }
    }
}

/// Walk from `root` to the parent of `path`'s last segment, holding read
/// locks on everything visited, and return the still-unlocked target node.
fn descend(root: &EntryRef, path: &ElementPath) -> FsResult<(LockChain, EntryRef)> {
    let count = path.segment_count();
    let mut chain = LockChain::with_capacity(count);
    chain.acquire(root);

    let mut segments = path.segments().enumerate().peekable();
    while let Some((depth, name)) = segments.next() {
        let Some(parent) = chain.top() else {
            break;
        };
        let child = match &parent.kind {
            EntryKind::Directory { children } => children.get(name).cloned(),
            EntryKind::File { .. } | EntryKind::Symlink { .. } => {
                return Err(FsError::NotADirectory(path.display_prefix(depth)));
            }
        };
        let child = child.ok_or_else(|| FsError::NoSuchFile(path.display_prefix(depth + 1)))?;

        if segments.peek().is_none() {
            return Ok((chain, child));
        }
        chain.acquire(&child);
    }

    Err(FsError::InvalidArgument(format!("cannot descend along {path}")))
}

/// Resolve `path` below `root` under read locks and run `op` on the target
/// while its read lock is held.
pub fn with_read_lock_do<R, F>(root: &EntryRef, path: &AbstractPath, op: F) -> FsResult<R>
where
    F: FnOnce(&Entry) -> FsResult<R>,
{
    match path {
        AbstractPath::Root(_) => {
            let guard = root.read();
            op(&guard)
        }
        AbstractPath::Element(element) => {
            let (chain, target) = descend(root, element)?;
            let result = {
                let guard = target.read();
                trace!(depth = chain.held.len(), lock = ?TerminalLock::Read, "terminal lock acquired");
                op(&guard)
            };
            drop(chain);
            result
        }
    }
}

/// Resolve `path` below `root` under read locks and run `op` on the target
/// while holding its write lock. Only the target is ever write-locked.
pub fn with_write_lock_on_last_do<R, F>(root: &EntryRef, path: &AbstractPath, op: F) -> FsResult<R>
where
    F: FnOnce(&mut Entry) -> FsResult<R>,
{
    match path {
        AbstractPath::Root(_) => {
            let mut guard = root.write();
            op(&mut guard)
        }
        AbstractPath::Element(element) => {
            let (chain, target) = descend(root, element)?;
            let result = {
                let mut guard = target.write();
                trace!(depth = chain.held.len(), lock = ?TerminalLock::Write, "terminal lock acquired");
                op(&mut guard)
            };
            drop(chain);
            result
        }
    }
}
