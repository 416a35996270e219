// ABOUTME: Immutable messages exchanged between application components
// ABOUTME: One closed enum so every consumer matches kinds exhaustively

use std::fmt;
use std::path::PathBuf;

/// Which parts of the application a refresh touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Re-index everything instead of only changed files
    pub all: bool,
    /// Only redraw views, leave the project alone
    pub ui_only: bool,
    /// Re-read application settings before refreshing
    pub reload_settings: bool,
}

impl Default for RefreshRequest {
    fn default() -> Self {
        Self {
            all: false,
            ui_only: false,
            reload_settings: true,
        }
    }
}

impl RefreshRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_all(mut self) -> Self {
        self.all = true;
        self
    }

    pub fn refresh_ui_only(mut self) -> Self {
        self.ui_only = true;
        self
    }

    pub fn keep_settings(mut self) -> Self {
        self.reload_settings = false;
        self
    }
}

/// Text shown in the status bar and written to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub is_loading: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
            is_loading: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::info(text)
        }
    }

    pub fn loading(text: impl Into<String>) -> Self {
        Self {
            is_loading: true,
            ..Self::info(text)
        }
    }
}

/// Everything that can travel over the message bus
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Open the project described by a settings file
    LoadProject { path: PathBuf, force_refresh: bool },

    Refresh(RefreshRequest),

    SwitchColorScheme { color_scheme_path: PathBuf },

    /// The indexer finished a pass over the sources of `project`
    FinishedParsing { project: PathBuf },

    /// Bring the main window to the front
    ActivateWindow,

    Status(StatusMessage),

    /// Focus the given graph nodes in the views
    ActivateNodes { node_ids: Vec<u64> },

    ScrollSpeedChange { scroll_speed: f32 },

    ShowStartScreen,

    /// Deliver the wrapped message once the license is known to be valid
    DispatchWhenLicenseValid(Box<Message>),

    /// Outcome of a license check
    LicenseValidity { valid: bool },
}

/// Tag of a [`Message`], used as the subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    LoadProject,
    Refresh,
    SwitchColorScheme,
    FinishedParsing,
    ActivateWindow,
    Status,
    ActivateNodes,
    ScrollSpeedChange,
    ShowStartScreen,
    DispatchWhenLicenseValid,
    LicenseValidity,
}

impl MessageKind {
    pub const ALL: [MessageKind; 11] = [
        MessageKind::LoadProject,
        MessageKind::Refresh,
        MessageKind::SwitchColorScheme,
        MessageKind::FinishedParsing,
        MessageKind::ActivateWindow,
        MessageKind::Status,
        MessageKind::ActivateNodes,
        MessageKind::ScrollSpeedChange,
        MessageKind::ShowStartScreen,
        MessageKind::DispatchWhenLicenseValid,
        MessageKind::LicenseValidity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::LoadProject => "load_project",
            MessageKind::Refresh => "refresh",
            MessageKind::SwitchColorScheme => "switch_color_scheme",
            MessageKind::FinishedParsing => "finished_parsing",
            MessageKind::ActivateWindow => "activate_window",
            MessageKind::Status => "status",
            MessageKind::ActivateNodes => "activate_nodes",
            MessageKind::ScrollSpeedChange => "scroll_speed_change",
            MessageKind::ShowStartScreen => "show_start_screen",
            MessageKind::DispatchWhenLicenseValid => "dispatch_when_license_valid",
            MessageKind::LicenseValidity => "license_validity",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::LoadProject { .. } => MessageKind::LoadProject,
            Message::Refresh(_) => MessageKind::Refresh,
            Message::SwitchColorScheme { .. } => MessageKind::SwitchColorScheme,
            Message::FinishedParsing { .. } => MessageKind::FinishedParsing,
            Message::ActivateWindow => MessageKind::ActivateWindow,
            Message::Status(_) => MessageKind::Status,
            Message::ActivateNodes { .. } => MessageKind::ActivateNodes,
            Message::ScrollSpeedChange { .. } => MessageKind::ScrollSpeedChange,
            Message::ShowStartScreen => MessageKind::ShowStartScreen,
            Message::DispatchWhenLicenseValid(_) => MessageKind::DispatchWhenLicenseValid,
            Message::LicenseValidity { .. } => MessageKind::LicenseValidity,
        }
    }

    pub fn load_project(path: impl Into<PathBuf>, force_refresh: bool) -> Self {
        Message::LoadProject {
            path: path.into(),
            force_refresh,
        }
    }

    pub fn finished_parsing(project: impl Into<PathBuf>) -> Self {
        Message::FinishedParsing {
            project: project.into(),
        }
    }

    pub fn status(status: StatusMessage) -> Self {
        Message::Status(status)
    }

    /// Wrap this message so it is held until the license is valid
    pub fn when_license_valid(self) -> Self {
        Message::DispatchWhenLicenseValid(Box::new(self))
    }
}
