// ABOUTME: Lifecycle states of the currently opened project
// ABOUTME: Owned by the application orchestrator and only changed on the worker thread

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the application is in the project lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    /// Nothing has been opened yet
    #[default]
    NoProject,
    /// A project is being created from its settings file
    Loading,
    /// A project is open and indexed
    Loaded,
    /// An open project is being re-indexed
    Refreshing,
    /// The last load or refresh attempt failed
    Failed,
}

impl ProjectState {
    /// True when a project instance exists and is usable
    pub fn has_project(self) -> bool {
        matches!(self, Self::Loaded | Self::Refreshing)
    }

    /// True when a refresh request may start from this state
    pub fn can_refresh(self) -> bool {
        self == Self::Loaded
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoProject => "no project",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Refreshing => "refreshing",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
