// ABOUTME: In-memory index storage used by the reference project indexer
// ABOUTME: Maps source paths to their size and modification time

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::collaborators::{FileRecord, StorageCache};

#[derive(Debug, Default)]
pub struct MemoryStorageCache {
    files: RwLock<HashMap<PathBuf, FileRecord>>,
}

impl MemoryStorageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexed paths in sorted order
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn total_size(&self) -> u64 {
        self.files.read().values().map(|record| record.size).sum()
    }
}

impl StorageCache for MemoryStorageCache {
    fn clear(&self) {
        self.files.write().clear();
    }

    fn record_file(&self, path: PathBuf, record: FileRecord) {
        self.files.write().insert(path, record);
    }

    fn file_record(&self, path: &Path) -> Option<FileRecord> {
        self.files.read().get(path).copied()
    }

    fn file_count(&self) -> usize {
        self.files.read().len()
    }
}
