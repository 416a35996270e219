// ABOUTME: Cartograph application library: lifecycle orchestration and collaborators
// ABOUTME: The carto binary and integration tests build on these modules

pub mod application;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod project;
pub mod runtime;
pub mod settings;
pub mod storage;
pub mod style;
pub mod watch;

pub use application::{APPLICATION_MESSAGE_KINDS, Application, Collaborators};
pub use collaborators::{
    FileRecord, Project, ProjectFactory, SettingsStore, StorageCache, StyleLoader, UiSurface,
};
pub use config::AppConfig;
pub use error::{ProjectError, RuntimeError, SettingsError, StyleError};
pub use project::{IndexReport, IndexedProject, IndexedProjectFactory};
pub use runtime::Runtime;
pub use settings::{ApplicationSettings, TomlSettingsStore};
pub use storage::MemoryStorageCache;
pub use style::ColorScheme;
pub use watch::{LoadOutcome, ProjectLoadWatcher};
