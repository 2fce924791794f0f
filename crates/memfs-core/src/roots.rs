// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Root table: the mapping from mount anchors to their root directories
//!
//! The table is an immutable snapshot. Readers take one atomic load and keep
//! working on what they loaded; updates replace the whole snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::node::EntryRef;
use crate::path::Root;

/// Immutable anchor-to-directory mapping
#[derive(Clone, Debug, Default)]
pub struct RootTable {
    roots: BTreeMap<Root, EntryRef>,
}

impl RootTable {
    pub fn new(roots: impl IntoIterator<Item = (Root, EntryRef)>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    pub fn get(&self, root: &Root) -> Option<&EntryRef> {
        self.roots.get(root)
    }

    pub fn contains(&self, root: &Root) -> bool {
        self.roots.contains_key(root)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Root> {
        self.roots.keys()
    }
}

/// Atomically swappable holder of the current [`RootTable`] snapshot
#[derive(Debug)]
pub struct RootTableCell {
    current: ArcSwap<RootTable>,
}

impl RootTableCell {
    pub fn new(table: RootTable) -> Self {
        Self {
            current: ArcSwap::from_pointee(table),
        }
    }

    /// Capture the current snapshot
    pub fn load(&self) -> Arc<RootTable> {
        self.current.load_full()
    }

    /// Install `table` as the new snapshot; readers holding the old one are unaffected
    pub fn replace(&self, table: RootTable) {
        self.current.store(Arc::new(table));
    }
}

impl Default for RootTableCell {
    fn default() -> Self {
        Self::new(RootTable::default())
    }
}

/// Read-only view over the anchors of one captured snapshot
#[derive(Clone, Debug)]
pub struct RootDirectories {
    snapshot: Arc<RootTable>,
}

impl RootDirectories {
    pub(crate) fn new(snapshot: Arc<RootTable>) -> Self {
        Self { snapshot }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Root> {
        self.snapshot.roots()
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn contains(&self, root: &Root) -> bool {
        self.snapshot.contains(root)
    }
}

impl<'a> IntoIterator for &'a RootDirectories {
    type Item = &'a Root;
    type IntoIter = std::collections::btree_map::Keys<'a, Root, EntryRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshot.roots.keys()
    }
}
