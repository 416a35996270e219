// ABOUTME: Application settings persisted as TOML between sessions
// ABOUTME: Holds the active color scheme and the recent projects list

use cartograph_logging::{debug, info};
use cartograph_types::RecentProjects;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::collaborators::SettingsStore;
use crate::error::SettingsError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// Color scheme applied at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scheme_path: Option<PathBuf>,

    #[serde(default)]
    pub recent_projects: RecentProjects,
}

impl ApplicationSettings {
    /// Parse settings, normalising the recent projects list
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let mut settings: Self = toml::from_str(content)?;
        settings.recent_projects = RecentProjects::from_paths(settings.recent_projects.into_vec());
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// [`SettingsStore`] backed by a TOML file
#[derive(Debug, Default)]
pub struct TomlSettingsStore {
    settings: ApplicationSettings,
}

impl TomlSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ApplicationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ApplicationSettings {
        &self.settings
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&mut self, path: &Path) -> Result<(), SettingsError> {
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            self.settings = ApplicationSettings::default();
            return Ok(());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.settings =
            ApplicationSettings::from_toml_str(&content).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            path = %path.display(),
            recent_projects = self.settings.recent_projects.len(),
            "Loaded application settings"
        );
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = self.settings.to_toml_string()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Saved application settings");
        Ok(())
    }

    fn recent_projects(&self) -> RecentProjects {
        self.settings.recent_projects.clone()
    }

    fn set_recent_projects(&mut self, projects: RecentProjects) {
        self.settings.recent_projects = projects;
    }

    fn color_scheme_path(&self) -> Option<PathBuf> {
        self.settings.color_scheme_path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let mut store = TomlSettingsStore::with_settings(ApplicationSettings {
            color_scheme_path: Some(PathBuf::from("stale.toml")),
            recent_projects: RecentProjects::new(),
        });

        store.load(&dir.path().join("settings.toml")).unwrap();

        assert_eq!(store.settings(), &ApplicationSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut recent = RecentProjects::new();
        recent.push_front("/projects/a.toml");
        recent.push_front("/projects/b.toml");

        let mut store = TomlSettingsStore::new();
        store.set_recent_projects(recent.clone());
        store.save(&path).unwrap();

        let mut reloaded = TomlSettingsStore::new();
        reloaded.load(&path).unwrap();
        assert_eq!(reloaded.recent_projects(), recent);
        assert_eq!(reloaded.color_scheme_path(), None);
    }

    #[test]
    fn test_load_normalises_recent_projects() {
        let settings = ApplicationSettings::from_toml_str(
            r#"
            color_scheme_path = "/schemes/dark.toml"
            recent_projects = ["a", "b", "a", "c", "d", "e", "f", "g", "h"]
            "#,
        )
        .unwrap();

        assert_eq!(
            settings.color_scheme_path,
            Some(PathBuf::from("/schemes/dark.toml"))
        );
        assert_eq!(settings.recent_projects.len(), 7);
        assert_eq!(
            settings.recent_projects.as_slice().first(),
            Some(&PathBuf::from("a"))
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "recent_projects = 42").unwrap();

        let mut store = TomlSettingsStore::new();
        let err = store.load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
