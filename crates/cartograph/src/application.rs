// ABOUTME: Central listener that owns the project lifecycle state machine
// ABOUTME: Reacts to load, refresh, style and status messages on the worker thread

use cartograph_events::{
    HandlerError, Listener, Message, MessageDispatch, MessageKind, RefreshRequest, StatusMessage,
};
use cartograph_logging::{debug, error, info, instrument, warn};
use cartograph_types::{ProjectState, RecentProjects};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collaborators::{
    Project, ProjectFactory, SettingsStore, StorageCache, StyleLoader, UiSurface,
};
use crate::project::IndexedProjectFactory;
use crate::settings::TomlSettingsStore;
use crate::storage::MemoryStorageCache;
use crate::style::ColorScheme;

/// Message kinds the application subscribes to
pub const APPLICATION_MESSAGE_KINDS: [MessageKind; 7] = [
    MessageKind::LoadProject,
    MessageKind::Refresh,
    MessageKind::SwitchColorScheme,
    MessageKind::FinishedParsing,
    MessageKind::ActivateWindow,
    MessageKind::Status,
    MessageKind::ShowStartScreen,
];

pub const FORCE_REFRESH_PROMPT: &str = "Some settings were changed, the project needs to be fully reindexed. \
     Do you want to reindex the project?";

pub const FORCE_REFRESH_OPTIONS: [&str; 2] = ["Yes", "No"];

/// Everything the application drives but does not implement itself
pub struct Collaborators {
    pub storage: Arc<dyn StorageCache>,
    pub settings: Box<dyn SettingsStore>,
    pub style: Box<dyn StyleLoader>,
    pub projects: Box<dyn ProjectFactory>,
    pub ui: Option<Box<dyn UiSurface>>,
}

impl Collaborators {
    /// Reference collaborators without a UI
    pub fn headless() -> Self {
        Self {
            storage: Arc::new(MemoryStorageCache::new()),
            settings: Box::new(TomlSettingsStore::new()),
            style: Box::new(ColorScheme::new()),
            projects: Box::new(IndexedProjectFactory::new()),
            ui: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn StorageCache>) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_settings(mut self, settings: Box<dyn SettingsStore>) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_style(mut self, style: Box<dyn StyleLoader>) -> Self {
        self.style = style;
        self
    }

    pub fn with_projects(mut self, projects: Box<dyn ProjectFactory>) -> Self {
        self.projects = projects;
        self
    }

    pub fn with_ui(mut self, ui: Box<dyn UiSurface>) -> Self {
        self.ui = Some(ui);
        self
    }
}

/// Owns the open project and reacts to lifecycle messages.
///
/// All state changes happen inside [`Listener::handle`], which the bus calls
/// on the scheduler's worker thread once task delivery is enabled. Follow-up
/// messages are sent through the dispatcher and never delivered re-entrantly.
pub struct Application {
    app_name: String,
    settings_path: PathBuf,
    state: ProjectState,
    project: Option<Box<dyn Project>>,
    storage: Arc<dyn StorageCache>,
    settings: Box<dyn SettingsStore>,
    style: Box<dyn StyleLoader>,
    projects: Box<dyn ProjectFactory>,
    ui: Option<Box<dyn UiSurface>>,
    events: Arc<dyn MessageDispatch>,
}

impl Application {
    /// Load application settings and the configured color scheme
    pub fn new(
        app_name: impl Into<String>,
        settings_path: PathBuf,
        collaborators: Collaborators,
        events: Arc<dyn MessageDispatch>,
    ) -> Self {
        let Collaborators {
            storage,
            settings,
            style,
            projects,
            ui,
        } = collaborators;

        let mut app = Self {
            app_name: app_name.into(),
            settings_path,
            state: ProjectState::NoProject,
            project: None,
            storage,
            settings,
            style,
            projects,
            ui,
            events,
        };

        app.reload_settings();
        if let Some(color_scheme_path) = app.settings.color_scheme_path() {
            app.load_style(&color_scheme_path);
        }

        info!(app = %app.app_name, has_ui = app.has_ui(), "Application initialized");
        app
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn state(&self) -> ProjectState {
        self.state
    }

    pub fn has_ui(&self) -> bool {
        self.ui.is_some()
    }

    pub fn project_path(&self) -> Option<&Path> {
        self.project.as_ref().map(|project| project.settings_file_path())
    }

    pub fn recent_projects(&self) -> RecentProjects {
        self.settings.recent_projects()
    }

    /// Set the initial window title; returns whether a UI is attached
    pub fn prepare_ui(&mut self) -> bool {
        match self.ui.as_mut() {
            Some(ui) => {
                ui.set_title(&self.app_name);
                true
            }
            None => false,
        }
    }

    pub fn load_layout(&mut self) {
        if let Some(ui) = self.ui.as_mut() {
            ui.load_layout();
        }
    }

    pub fn save_layout(&mut self) {
        if let Some(ui) = self.ui.as_mut() {
            ui.save_layout();
        }
    }

    fn reload_settings(&mut self) {
        let loaded = cartograph_logging::timed!("load_settings", {
            self.settings.load(&self.settings_path)
        });
        if let Err(err) = loaded {
            warn!(
                path = %self.settings_path.display(),
                error = %err,
                "Failed to load application settings, keeping previous values"
            );
        }
    }

    fn load_style(&mut self, color_scheme_path: &Path) {
        if let Err(err) = self.style.load_style(color_scheme_path) {
            warn!(
                path = %color_scheme_path.display(),
                error = %err,
                "Failed to load color scheme"
            );
        }
    }

    fn send_status(&self, status: StatusMessage) {
        self.events.dispatch(Message::Status(status));
    }

    /// Whether `path` is the open project and it is usable
    fn is_loaded(&self, path: &Path) -> bool {
        self.state.has_project() && self.project_path() == Some(path)
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn handle_load_project(&mut self, path: &Path, force_refresh: bool) {
        self.reload_settings();

        if path.as_os_str().is_empty() {
            debug!("Ignoring load request without a project path");
            return;
        }

        if force_refresh {
            if let Some(ui) = self.ui.as_mut() {
                let choice = ui.confirm(FORCE_REFRESH_PROMPT, &FORCE_REFRESH_OPTIONS);
                if choice != 0 {
                    info!(choice, "Full reindex declined");
                    return;
                }
            }

            if self.is_loaded(path) {
                self.refresh_project(true);
            } else {
                self.create_and_load(path);
            }
            return;
        }

        if self.is_loaded(path) {
            debug!(state = %self.state, "Project already loaded");
            return;
        }

        self.create_and_load(path);
    }

    fn create_and_load(&mut self, path: &Path) {
        self.state = ProjectState::Loading;
        self.send_status(StatusMessage::loading(format!(
            "Loading Project: {}",
            path.display()
        )));

        // Release the previous project (and its indexer) before clearing shared storage
        self.project = None;
        self.storage.clear();

        match self
            .projects
            .create(path, Arc::clone(&self.storage), Arc::clone(&self.events))
        {
            Ok(project) => {
                self.project = Some(project);
                self.state = ProjectState::Loaded;

                if let Some(ui) = self.ui.as_mut() {
                    let file_name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    ui.clear_components();
                    ui.set_title(&format!("{} - {}", self.app_name, file_name));
                    ui.hide_start_screen();
                    ui.refresh_views();
                }

                self.update_recent_projects(path);
                info!(path = %path.display(), "Project loaded");
            }
            Err(err) => {
                self.state = ProjectState::Failed;
                error!(path = %path.display(), error = %err, "Failed to load project");
                self.send_status(StatusMessage::error(format!(
                    "Failed to load project: {err}"
                )));
            }
        }
    }

    fn update_recent_projects(&mut self, path: &Path) {
        let mut recent = self.settings.recent_projects();
        recent.push_front(path);
        self.settings.set_recent_projects(recent.clone());

        if let Err(err) = self.settings.save(&self.settings_path) {
            warn!(
                path = %self.settings_path.display(),
                error = %err,
                "Failed to persist recent projects"
            );
        }

        if let Some(ui) = self.ui.as_mut() {
            ui.update_recent_project_menu(&recent);
        }
    }

    fn refresh_project(&mut self, all: bool) {
        if !self.state.can_refresh() {
            debug!(state = %self.state, "No loaded project to refresh");
            return;
        }
        let Some(project) = self.project.as_mut() else {
            debug!("No loaded project to refresh");
            return;
        };

        self.state = ProjectState::Refreshing;
        self.events
            .dispatch(Message::Status(StatusMessage::info("Refreshing Project")));

        self.storage.clear();
        if let Some(ui) = self.ui.as_mut() {
            ui.refresh_views();
        }

        let result = if all {
            project.force_refresh()
        } else {
            project.refresh()
        };

        match result {
            Ok(()) => {
                self.state = ProjectState::Loaded;
                debug!(all, "Project refresh started");
            }
            Err(err) => {
                self.state = ProjectState::Failed;
                error!(error = %err, "Failed to refresh project");
                self.send_status(StatusMessage::error(format!(
                    "Failed to refresh project: {err}"
                )));
            }
        }
    }

    fn handle_refresh(&mut self, request: RefreshRequest) {
        if request.reload_settings {
            self.reload_settings();
        }

        if request.ui_only {
            if let Some(ui) = self.ui.as_mut() {
                ui.refresh_views();
            }
        } else {
            self.refresh_project(request.all);
        }
    }

    fn handle_switch_color_scheme(&mut self, color_scheme_path: &Path) {
        self.load_style(color_scheme_path);
        self.events.dispatch(Message::Refresh(
            RefreshRequest::new().refresh_ui_only().keep_settings(),
        ));
    }

    fn handle_finished_parsing(&mut self, finished: &Path) {
        let Some(project) = self.project.as_ref() else {
            debug!("Parsing finished without an open project");
            return;
        };
        if project.settings_file_path() != finished {
            debug!(
                finished = %finished.display(),
                "Ignoring parsing result of a project that is no longer open"
            );
            return;
        }
        project.log_stats();

        if self.has_ui() {
            self.events
                .dispatch(Message::Refresh(RefreshRequest::new().refresh_ui_only()));
        }
    }

    fn handle_status(&mut self, status: &StatusMessage) {
        if status.is_error {
            error!(text = %status.text, "Status");
        } else {
            info!(text = %status.text, is_loading = status.is_loading, "Status");
        }

        if let Some(ui) = self.ui.as_mut() {
            ui.show_status(status);
        }
    }
}

impl Listener for Application {
    fn name(&self) -> &str {
        "application"
    }

    fn handle(&mut self, message: &Message) -> Result<(), HandlerError> {
        match message {
            Message::LoadProject {
                path,
                force_refresh,
            } => self.handle_load_project(path, *force_refresh),
            Message::Refresh(request) => self.handle_refresh(*request),
            Message::SwitchColorScheme { color_scheme_path } => {
                self.handle_switch_color_scheme(color_scheme_path)
            }
            Message::FinishedParsing { project } => self.handle_finished_parsing(project),
            Message::ActivateWindow => {
                if let Some(ui) = self.ui.as_mut() {
                    ui.activate_window();
                }
            }
            Message::Status(status) => self.handle_status(status),
            Message::ShowStartScreen => {
                if let Some(ui) = self.ui.as_mut() {
                    ui.show_start_screen();
                }
            }
            other => return Err(HandlerError::unsupported(other)),
        }
        Ok(())
    }
}
