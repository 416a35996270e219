// ABOUTME: Most-recently-used list of opened project files
// ABOUTME: Bounded, de-duplicated and persisted with the application settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum number of entries kept in the recent projects list
pub const RECENT_PROJECTS_CAPACITY: usize = 7;

/// Recently opened projects, most recent first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentProjects {
    entries: Vec<PathBuf>,
}

impl RecentProjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from persisted entries, dropping duplicates and overflow
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut entries: Vec<PathBuf> = Vec::new();
        for path in paths {
            if !entries.contains(&path) {
                entries.push(path);
            }
        }
        entries.truncate(RECENT_PROJECTS_CAPACITY);
        Self { entries }
    }

    /// Move `path` to the front, evicting the oldest entry past capacity
    pub fn push_front(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.entries.retain(|existing| existing != &path);
        self.entries.insert(0, path);
        self.entries.truncate(RECENT_PROJECTS_CAPACITY);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|entry| entry == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.entries
    }
}
