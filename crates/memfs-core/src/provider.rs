// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Registry of live in-memory filesystems keyed by name

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::MemoryFsConfig;
use crate::error::{FsError, FsResult};
use crate::filesystem::MemoryFileSystem;

/// Owner notified when a filesystem closes
pub trait FileSystemRegistry: Send + Sync {
    fn deregister(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryFileSystemProvider {
    file_systems: Mutex<HashMap<String, Arc<MemoryFileSystem>>>,
}

impl MemoryFileSystemProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn new_file_system(
        self: &Arc<Self>,
        key: &str,
        config: MemoryFsConfig,
    ) -> FsResult<Arc<MemoryFileSystem>> {
        let mut file_systems = self.file_systems.lock();
        if file_systems.contains_key(key) {
            return Err(FsError::AlreadyExists(format!("file system {key}")));
        }

        let weak_self: Weak<Self> = Arc::downgrade(self);
        let registry: Weak<dyn FileSystemRegistry> = weak_self;
        let fs = Arc::new(MemoryFileSystem::new(key, config, registry)?);
        file_systems.insert(key.to_string(), Arc::clone(&fs));
        debug!(key, "file system registered");
        Ok(fs)
    }

    pub fn get_file_system(&self, key: &str) -> FsResult<Arc<MemoryFileSystem>> {
        self.file_systems
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| FsError::FileSystemNotFound(key.to_string()))
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.file_systems.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl FileSystemRegistry for MemoryFileSystemProvider {
    fn deregister(&self, key: &str) {
        if self.file_systems.lock().remove(key).is_some() {
            debug!(key, "file system deregistered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let provider = MemoryFileSystemProvider::new();
        let fs = provider.new_file_system("one", MemoryFsConfig::unix()).unwrap();
        assert_eq!(fs.key(), "one");
        assert!(Arc::ptr_eq(&fs, &provider.get_file_system("one").unwrap()));
        assert_eq!(provider.keys(), vec!["one"]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let provider = MemoryFileSystemProvider::new();
        provider.new_file_system("dup", MemoryFsConfig::unix()).unwrap();
        let err = provider.new_file_system("dup", MemoryFsConfig::windows()).unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists(_)));
    }

    #[test]
    fn test_close_deregisters_once() {
        let provider = MemoryFileSystemProvider::new();
        let fs = provider.new_file_system("gone", MemoryFsConfig::unix()).unwrap();
        fs.close();
        assert!(matches!(provider.get_file_system("gone"), Err(FsError::FileSystemNotFound(_))));

        // A new filesystem may reuse the key; closing the old one again must not evict it
        let replacement = provider.new_file_system("gone", MemoryFsConfig::unix()).unwrap();
        fs.close();
        assert!(Arc::ptr_eq(&replacement, &provider.get_file_system("gone").unwrap()));
    }

    #[test]
    fn test_invalid_config_is_not_registered() {
        let provider = MemoryFileSystemProvider::new();
        let config = MemoryFsConfig {
            roots: Some(Vec::new()),
            ..MemoryFsConfig::unix()
        };
        assert!(provider.new_file_system("bad", config).is_err());
        assert!(provider.keys().is_empty());
    }
}
