// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Public filesystem surface
//!
//! Every operation checks the open/closed state first, then resolves the
//! path's root in the current root-table snapshot, and only then touches
//! node locks through the lock-coupled traversal.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::sync::Weak;

use tracing::{debug, instrument, warn};

use crate::config::MemoryFsConfig;
use crate::error::{FsError, FsResult};
use crate::lifecycle::ClosedFileSystemChecker;
use crate::node::{Entry, EntryRef};
use crate::parser::PathParser;
use crate::path::{AbstractPath, Root};
use crate::principal::UserPrincipalLookupService;
use crate::provider::FileSystemRegistry;
use crate::roots::{RootDirectories, RootTable, RootTableCell};
use crate::store::MemoryFileStore;
use crate::traversal::{with_read_lock_do, with_write_lock_on_last_do};
use crate::types::{AccessMode, FileAttributes};

/// An in-memory filesystem instance
pub struct MemoryFileSystem {
    config: MemoryFsConfig,
    parser: Box<dyn PathParser>,
    registry: Weak<dyn FileSystemRegistry>,
    store: MemoryFileStore,
    checker: ClosedFileSystemChecker,
    roots: RootTableCell,
    default_root: Root,
    principals: UserPrincipalLookupService,
}

impl std::fmt::Debug for MemoryFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFileSystem")
            .field("key", &self.store.key())
            .field("open", &self.checker.is_open())
            .finish()
    }
}

impl MemoryFileSystem {
    /// Build a filesystem with one empty root directory per configured root.
    ///
    /// `registry` is notified once when the filesystem is closed.
    pub fn new(
        key: &str,
        config: MemoryFsConfig,
        registry: Weak<dyn FileSystemRegistry>,
    ) -> FsResult<Self> {
        config.validate()?;
        let parser = config.path_style.parser();
        let roots = config.resolved_roots()?;
        let default_root = roots
            .first()
            .cloned()
            .ok_or_else(|| FsError::InvalidArgument("at least one root is required".to_string()))?;

        let table = RootTable::new(roots.into_iter().map(|root| {
            let directory = Entry::new_directory(config.default_directory_mode, config.ownership());
            (root, directory.into_ref())
        }));

        let fs = Self {
            store: MemoryFileStore::new(config.store_name.clone(), key, config.read_only),
            principals: UserPrincipalLookupService::new(config.users.clone(), config.groups.clone()),
            parser,
            registry,
            checker: ClosedFileSystemChecker::new(),
            roots: RootTableCell::new(table),
            default_root,
            config,
        };
        debug!(key, roots = fs.roots.load().len(), "memory file system created");
        Ok(fs)
    }

    /// Build a filesystem no registry knows about
    pub fn new_detached(key: &str, config: MemoryFsConfig) -> FsResult<Self> {
        let registry: Weak<dyn FileSystemRegistry> = Weak::<crate::provider::MemoryFileSystemProvider>::new();
        Self::new(key, config, registry)
    }

    /// Replace the root table as a whole. Meant for the initialisation phase;
    /// traversals already running keep the snapshot they loaded.
    pub fn set_root_directories(&self, table: RootTable) {
        debug!(roots = table.len(), "root table replaced");
        self.roots.replace(table);
    }

    fn resolve_root(&self, path: &AbstractPath) -> FsResult<(AbstractPath, EntryRef)> {
        let absolute = path.to_absolute(&self.default_root);
        let snapshot = self.roots.load();
        let directory = absolute
            .root()
            .and_then(|root| snapshot.get(root))
            .cloned()
            .ok_or_else(|| FsError::NoSuchFile(format!("the root of {path} does not exist")))?;
        Ok((absolute, directory))
    }

    fn check(&self, operation: &'static str) -> FsResult<()> {
        self.checker.check().inspect_err(|_| {
            warn!(operation, key = self.store.key(), "operation on closed file system");
        })
    }

    /// Link a freshly built entry under the parent of `path`
    fn create_entry(&self, path: &AbstractPath, make: impl FnOnce() -> Entry) -> FsResult<()> {
        let (absolute, root) = self.resolve_root(path)?;
        if self.store.is_read_only() {
            return Err(FsError::ReadOnlyFileSystem);
        }
        let (Some(name), Some(parent)) = (absolute.last_segment(), absolute.parent()) else {
            return Err(FsError::InvalidArgument(format!("{absolute} can not be created")));
        };

        with_write_lock_on_last_do(&root, &parent, |entry| {
            if !entry.is_directory() {
                return Err(FsError::NotADirectory(parent.to_string()));
            }
            entry.add_child(name, make().into_ref()).map_err(|err| match err {
                FsError::AlreadyExists(_) => FsError::AlreadyExists(absolute.to_string()),
                other => other,
            })
        })
    }

    #[instrument(skip_all, fields(component = "memfs_core", operation = "create_directory", path = %path))]
    pub fn create_directory(&self, path: &AbstractPath) -> FsResult<()> {
        self.check("create_directory")?;
        let mode = self.config.default_directory_mode;
        self.create_entry(path, || Entry::new_directory(mode, self.config.ownership()))?;
        debug!("directory created");
        Ok(())
    }

    #[instrument(skip_all, fields(component = "memfs_core", operation = "create_file", path = %path))]
    pub fn create_file(&self, path: &AbstractPath) -> FsResult<()> {
        self.check("create_file")?;
        let mode = self.config.default_file_mode;
        self.create_entry(path, || Entry::new_file(mode, self.config.ownership()))?;
        debug!("file created");
        Ok(())
    }

    /// Create `link` pointing at `target`. The target is stored as text and
    /// is not required to exist.
    #[instrument(skip_all, fields(component = "memfs_core", operation = "create_symbolic_link", path = %link, target = %target))]
    pub fn create_symbolic_link(&self, link: &AbstractPath, target: &AbstractPath) -> FsResult<()> {
        self.check("create_symbolic_link")?;
        let target = target.to_string();
        self.create_entry(link, || Entry::new_symlink(target, self.config.ownership()))?;
        debug!("symbolic link created");
        Ok(())
    }

    pub fn check_access(&self, path: &AbstractPath, modes: &[AccessMode]) -> FsResult<()> {
        self.check("check_access")?;
        let (absolute, root) = self.resolve_root(path)?;
        let read_only = self.store.is_read_only();
        with_read_lock_do(&root, &absolute, |entry| {
            entry
                .check_access(modes)
                .map_err(|err| FsError::AccessDenied(format!("{absolute}: {err}")))?;
            if read_only && modes.contains(&AccessMode::Write) {
                return Err(FsError::AccessDenied(format!("{absolute}: read-only file system")));
            }
            Ok(())
        })
    }

    pub fn read_attributes<A: FileAttributes>(&self, path: &AbstractPath) -> FsResult<A> {
        self.check("read_attributes")?;
        let (absolute, root) = self.resolve_root(path)?;
        with_read_lock_do(&root, &absolute, |entry| entry.read_attributes::<A>())
    }

    /// Sorted names of the direct children of the directory at `path`
    pub fn list_children(&self, path: &AbstractPath) -> FsResult<Vec<String>> {
        self.check("list_children")?;
        let (absolute, root) = self.resolve_root(path)?;
        with_read_lock_do(&root, &absolute, |entry| {
            entry.child_names().ok_or_else(|| FsError::NotADirectory(absolute.to_string()))
        })
    }

    pub fn new_byte_channel(&self, path: &AbstractPath) -> FsResult<Infallible> {
        self.check("new_byte_channel")?;
        self.resolve_root(path)?;
        Err(FsError::NotImplemented("new_byte_channel"))
    }

    pub fn new_directory_stream(&self, _path: &AbstractPath) -> FsResult<Infallible> {
        self.check("new_directory_stream")?;
        Err(FsError::NotImplemented("new_directory_stream"))
    }

    pub fn delete(&self, _path: &AbstractPath) -> FsResult<Infallible> {
        self.check("delete")?;
        Err(FsError::NotImplemented("delete"))
    }

    pub fn path_matcher(&self, _syntax_and_pattern: &str) -> FsResult<Infallible> {
        self.check("path_matcher")?;
        Err(FsError::NotImplemented("path_matcher"))
    }

    pub fn new_watch_service(&self) -> FsResult<Infallible> {
        self.check("new_watch_service")?;
        Err(FsError::NotImplemented("new_watch_service"))
    }

    /// Close the filesystem. Only the first call deregisters it; later calls
    /// do nothing.
    pub fn close(&self) {
        if !self.checker.close() {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.deregister(self.store.key());
        }
        debug!(key = self.store.key(), "memory file system closed");
    }

    pub fn is_open(&self) -> bool {
        self.checker.is_open()
    }

    pub fn is_read_only(&self) -> FsResult<bool> {
        self.check("is_read_only")?;
        Ok(self.store.is_read_only())
    }

    pub fn separator(&self) -> FsResult<char> {
        self.check("separator")?;
        Ok(self.parser.separator())
    }

    pub fn root_directories(&self) -> FsResult<RootDirectories> {
        self.check("root_directories")?;
        Ok(RootDirectories::new(self.roots.load()))
    }

    pub fn file_stores(&self) -> FsResult<&[MemoryFileStore]> {
        self.check("file_stores")?;
        Ok(std::slice::from_ref(&self.store))
    }

    pub fn supported_file_attribute_views(&self) -> FsResult<BTreeSet<&'static str>> {
        self.check("supported_file_attribute_views")?;
        Ok(self.config.attribute_views.iter().map(|view| view.name()).collect())
    }

    pub fn get_path(&self, first: &str, more: &[&str]) -> FsResult<AbstractPath> {
        self.check("get_path")?;
        let roots: Vec<Root> = self.roots.load().roots().cloned().collect();
        self.parser.parse(&roots, first, more)
    }

    pub fn user_principal_lookup_service(&self) -> FsResult<&UserPrincipalLookupService> {
        self.check("user_principal_lookup_service")?;
        Ok(&self.principals)
    }

    pub fn key(&self) -> &str {
        self.store.key()
    }

    pub fn file_store(&self) -> &MemoryFileStore {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn root_entry(&self, root: &Root) -> Option<EntryRef> {
        self.roots.load().get(root).cloned()
    }
}
