// ABOUTME: Capability traits the application orchestrator drives
// ABOUTME: Storage, projects, settings, styles and the optional UI surface

use cartograph_events::{MessageDispatch, StatusMessage};
use cartograph_types::RecentProjects;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::{ProjectError, SettingsError, StyleError};

/// What the index remembers about one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRecord {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Index storage shared between the orchestrator and the project's indexer
pub trait StorageCache: Send + Sync {
    fn clear(&self);

    fn record_file(&self, path: PathBuf, record: FileRecord);

    fn file_record(&self, path: &Path) -> Option<FileRecord>;

    fn file_count(&self) -> usize;
}

/// An opened project
pub trait Project: Send {
    /// Re-index files that changed since the last pass
    fn refresh(&mut self) -> Result<(), ProjectError>;

    /// Re-index every file
    fn force_refresh(&mut self) -> Result<(), ProjectError>;

    fn log_stats(&self);

    fn settings_file_path(&self) -> &Path;
}

pub trait ProjectFactory: Send {
    /// Open the project at `path`. `events` receives `FinishedParsing` when indexing completes.
    fn create(
        &self,
        path: &Path,
        storage: Arc<dyn StorageCache>,
        events: Arc<dyn MessageDispatch>,
    ) -> Result<Box<dyn Project>, ProjectError>;
}

/// Persistent application settings
pub trait SettingsStore: Send {
    fn load(&mut self, path: &Path) -> Result<(), SettingsError>;

    fn save(&self, path: &Path) -> Result<(), SettingsError>;

    fn recent_projects(&self) -> RecentProjects;

    fn set_recent_projects(&mut self, projects: RecentProjects);

    fn color_scheme_path(&self) -> Option<PathBuf>;
}

pub trait StyleLoader: Send {
    fn load_style(&mut self, color_scheme_path: &Path) -> Result<(), StyleError>;
}

/// Window, dialogs and views. Absent when running headless.
pub trait UiSurface: Send {
    /// Ask the user to pick one of `options`; returns the chosen index
    fn confirm(&mut self, message: &str, options: &[&str]) -> usize;

    fn set_title(&mut self, title: &str);

    fn hide_start_screen(&mut self);

    fn show_start_screen(&mut self);

    fn update_recent_project_menu(&mut self, projects: &RecentProjects);

    fn activate_window(&mut self);

    fn refresh_views(&mut self);

    fn clear_components(&mut self);

    fn show_status(&mut self, status: &StatusMessage);

    fn load_layout(&mut self);

    fn save_layout(&mut self);
}
