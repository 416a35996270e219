// ABOUTME: Recording collaborators shared by the runtime scenario tests
// ABOUTME: Every fake writes what it was asked to do into a shared journal

#![allow(dead_code)]

use cartograph::{
    AppConfig, Collaborators, MemoryStorageCache, Project, ProjectError, ProjectFactory, Runtime,
    StorageCache, StyleError, StyleLoader, TomlSettingsStore, UiSurface,
};
use cartograph_core::{MessageDispatch, StatusMessage};
use cartograph_types::RecentProjects;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Confirm(String),
    Title(String),
    HideStartScreen,
    ShowStartScreen,
    RecentMenu(Vec<PathBuf>),
    ActivateWindow,
    RefreshViews,
    ClearComponents,
    Status(StatusMessage),
    LoadLayout,
    SaveLayout,
}

pub type Journal<T> = Arc<Mutex<Vec<T>>>;

pub struct RecordingUi {
    pub events: Journal<UiEvent>,
    pub confirm_choice: usize,
}

impl UiSurface for RecordingUi {
    fn confirm(&mut self, message: &str, _options: &[&str]) -> usize {
        self.events.lock().push(UiEvent::Confirm(message.to_string()));
        self.confirm_choice
    }

    fn set_title(&mut self, title: &str) {
        self.events.lock().push(UiEvent::Title(title.to_string()));
    }

    fn hide_start_screen(&mut self) {
        self.events.lock().push(UiEvent::HideStartScreen);
    }

    fn show_start_screen(&mut self) {
        self.events.lock().push(UiEvent::ShowStartScreen);
    }

    fn update_recent_project_menu(&mut self, projects: &RecentProjects) {
        self.events
            .lock()
            .push(UiEvent::RecentMenu(projects.as_slice().to_vec()));
    }

    fn activate_window(&mut self) {
        self.events.lock().push(UiEvent::ActivateWindow);
    }

    fn refresh_views(&mut self) {
        self.events.lock().push(UiEvent::RefreshViews);
    }

    fn clear_components(&mut self) {
        self.events.lock().push(UiEvent::ClearComponents);
    }

    fn show_status(&mut self, status: &StatusMessage) {
        self.events.lock().push(UiEvent::Status(status.clone()));
    }

    fn load_layout(&mut self) {
        self.events.lock().push(UiEvent::LoadLayout);
    }

    fn save_layout(&mut self) {
        self.events.lock().push(UiEvent::SaveLayout);
    }
}

/// Project whose refreshes only record that they happened
pub struct ScriptedProject {
    path: PathBuf,
    calls: Journal<String>,
}

impl Project for ScriptedProject {
    fn refresh(&mut self) -> Result<(), ProjectError> {
        self.calls.lock().push("refresh".to_string());
        Ok(())
    }

    fn force_refresh(&mut self) -> Result<(), ProjectError> {
        self.calls.lock().push("force_refresh".to_string());
        Ok(())
    }

    fn log_stats(&self) {
        self.calls.lock().push("log_stats".to_string());
    }

    fn settings_file_path(&self) -> &Path {
        &self.path
    }
}

/// Opens [`ScriptedProject`]s; paths ending in `broken.toml` fail to load
pub struct ScriptedFactory {
    pub calls: Journal<String>,
}

impl ProjectFactory for ScriptedFactory {
    fn create(
        &self,
        path: &Path,
        _storage: Arc<dyn StorageCache>,
        _events: Arc<dyn MessageDispatch>,
    ) -> Result<Box<dyn Project>, ProjectError> {
        self.calls.lock().push(format!("create:{}", path.display()));
        if path.ends_with("broken.toml") {
            return Err(ProjectError::not_found(path));
        }
        Ok(Box::new(ScriptedProject {
            path: path.to_path_buf(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

pub struct RecordingStyle {
    pub loaded: Journal<PathBuf>,
}

impl StyleLoader for RecordingStyle {
    fn load_style(&mut self, color_scheme_path: &Path) -> Result<(), StyleError> {
        self.loaded.lock().push(color_scheme_path.to_path_buf());
        Ok(())
    }
}

/// A runtime wired to recording collaborators in a scratch settings directory
pub struct Harness {
    pub runtime: Runtime,
    pub ui: Journal<UiEvent>,
    pub project_calls: Journal<String>,
    pub styles: Journal<PathBuf>,
    pub storage: Arc<MemoryStorageCache>,
    pub dir: TempDir,
}

pub struct HarnessOptions {
    pub with_ui: bool,
    pub confirm_choice: usize,
    pub license_check: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            with_ui: true,
            confirm_choice: 0,
            license_check: true,
        }
    }
}

impl Harness {
    pub fn start(options: HarnessOptions) -> Self {
        let dir = TempDir::new().unwrap();
        let ui: Journal<UiEvent> = Journal::default();
        let project_calls: Journal<String> = Journal::default();
        let styles: Journal<PathBuf> = Journal::default();
        let storage = Arc::new(MemoryStorageCache::new());

        let mut collaborators = Collaborators::headless()
            .with_storage(storage.clone())
            .with_settings(Box::new(TomlSettingsStore::new()))
            .with_style(Box::new(RecordingStyle {
                loaded: Arc::clone(&styles),
            }))
            .with_projects(Box::new(ScriptedFactory {
                calls: Arc::clone(&project_calls),
            }));
        if options.with_ui {
            collaborators = collaborators.with_ui(Box::new(RecordingUi {
                events: Arc::clone(&ui),
                confirm_choice: options.confirm_choice,
            }));
        }

        let config = AppConfig {
            settings_path: dir.path().join("settings.toml"),
            license_check: options.license_check,
            ..AppConfig::default()
        };
        let runtime = Runtime::start(&config, collaborators).unwrap();

        Self {
            runtime,
            ui,
            project_calls,
            styles,
            storage,
            dir,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.path().join("settings.toml")
    }

    pub fn project_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn ui_events(&self) -> Vec<UiEvent> {
        self.ui.lock().clone()
    }

    pub fn statuses(&self) -> Vec<StatusMessage> {
        self.ui
            .lock()
            .iter()
            .filter_map(|event| match event {
                UiEvent::Status(status) => Some(status.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn error_statuses(&self) -> Vec<StatusMessage> {
        self.statuses()
            .into_iter()
            .filter(|status| status.is_error)
            .collect()
    }

    pub fn count_ui(&self, wanted: &UiEvent) -> usize {
        self.ui.lock().iter().filter(|event| *event == wanted).count()
    }

    pub fn project_calls(&self) -> Vec<String> {
        self.project_calls.lock().clone()
    }

    pub fn count_calls(&self, call: &str) -> usize {
        self.project_calls
            .lock()
            .iter()
            .filter(|recorded| recorded.as_str() == call)
            .count()
    }
}
