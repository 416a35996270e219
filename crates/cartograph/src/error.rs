// ABOUTME: Error types for project loading, settings, styles and runtime startup
// ABOUTME: Each collaborator boundary gets its own enum with path context

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project path does not exist: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to parse project file at {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid project file {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("Source path {path} listed by the project does not exist")]
    MissingSource { path: PathBuf },

    #[error("Failed to start indexing: {reason}")]
    Indexing { reason: String },
}

impl ProjectError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn manifest_parse<E>(path: PathBuf, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ManifestParse {
            path,
            source: Box::new(error),
        }
    }

    pub fn invalid_manifest<S: Into<String>>(path: PathBuf, reason: S) -> Self {
        Self::InvalidManifest {
            path,
            reason: reason.into(),
        }
    }

    pub fn indexing<S: Into<String>>(reason: S) -> Self {
        Self::Indexing {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("Color scheme {path} could not be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Color scheme {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Color scheme {path} has an invalid color '{name}' = '{value}'")]
    InvalidColor {
        path: PathBuf,
        name: String,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Task scheduler failed to start: {0}")]
    Scheduler(#[from] cartograph_core::SchedulerError),

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}
