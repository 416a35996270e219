// ABOUTME: Color scheme loaded from a TOML table of named colors
// ABOUTME: Implements the style loader the orchestrator calls on scheme switches

use cartograph_logging::info;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::collaborators::StyleLoader;
use crate::error::StyleError;

/// An sRGB color parsed from `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ColorSchemeFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    colors: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct ColorScheme {
    name: Option<String>,
    source: Option<PathBuf>,
    colors: BTreeMap<String, Color>,
}

impl ColorScheme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn color(&self, key: &str) -> Option<Color> {
        self.colors.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl StyleLoader for ColorScheme {
    fn load_style(&mut self, color_scheme_path: &Path) -> Result<(), StyleError> {
        let content = fs::read_to_string(color_scheme_path).map_err(|source| StyleError::Read {
            path: color_scheme_path.to_path_buf(),
            source,
        })?;
        let file: ColorSchemeFile = toml::from_str(&content).map_err(|source| StyleError::Parse {
            path: color_scheme_path.to_path_buf(),
            source,
        })?;

        let mut colors = BTreeMap::new();
        for (name, value) in file.colors {
            let Some(color) = Color::parse_hex(&value) else {
                return Err(StyleError::InvalidColor {
                    path: color_scheme_path.to_path_buf(),
                    name,
                    value,
                });
            };
            colors.insert(name, color);
        }

        // Only replace the active scheme once the whole file validated
        self.name = file.name;
        self.source = Some(color_scheme_path.to_path_buf());
        self.colors = colors;

        info!(
            path = %color_scheme_path.display(),
            colors = self.colors.len(),
            "Loaded color scheme"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_scheme(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(
            Color::parse_hex("#ff8000"),
            Some(Color {
                r: 255,
                g: 128,
                b: 0
            })
        );
        assert_eq!(Color::parse_hex("ff8000"), None);
        assert_eq!(Color::parse_hex("#ff80"), None);
        assert_eq!(Color::parse_hex("#gg0000"), None);
    }

    #[test]
    fn test_load_scheme() {
        let dir = TempDir::new().unwrap();
        let path = write_scheme(
            &dir,
            "dark.toml",
            r##"
            name = "Dark"

            [colors]
            background = "#101010"
            node = "#4488cc"
            "##,
        );

        let mut scheme = ColorScheme::new();
        scheme.load_style(&path).unwrap();

        assert_eq!(scheme.name(), Some("Dark"));
        assert_eq!(scheme.source(), Some(path.as_path()));
        assert_eq!(scheme.len(), 2);
        assert_eq!(
            scheme.color("background"),
            Some(Color {
                r: 0x10,
                g: 0x10,
                b: 0x10
            })
        );
    }

    #[test]
    fn test_invalid_scheme_keeps_previous_colors() {
        let dir = TempDir::new().unwrap();
        let good = write_scheme(&dir, "good.toml", "[colors]\ntext = \"#000000\"\n");
        let bad = write_scheme(&dir, "bad.toml", "[colors]\ntext = \"black\"\n");

        let mut scheme = ColorScheme::new();
        scheme.load_style(&good).unwrap();

        let err = scheme.load_style(&bad).unwrap_err();
        assert!(matches!(err, StyleError::InvalidColor { ref name, .. } if name == "text"));
        assert_eq!(scheme.source(), Some(good.as_path()));
    }

    #[test]
    fn test_missing_scheme_is_read_error() {
        let dir = TempDir::new().unwrap();
        let mut scheme = ColorScheme::new();
        let err = scheme.load_style(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StyleError::Read { .. }));
        assert!(scheme.is_empty());
    }
}
