//! Renderer configuration
//!
//! Optional TOML file; every field has a default, and command-line flags
//! override whatever the file sets.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::backend::SizeUnit;
use crate::errors::{RenderError, Result};
use crate::selector::RendererOverride;

/// Renderer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Backend name: auto, kitty, sixel, braille, ascii or iterm2
    pub renderer: String,

    /// Emit 24-bit color codes from the ASCII backend
    pub color: bool,

    /// Size unit for inline images
    pub inline_unit: SizeUnit,

    /// Cell width in pixels when the terminal does not report it
    pub cell_width: u32,

    /// Cell height in pixels when the terminal does not report it
    pub cell_height: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            renderer: "auto".to_string(),
            color: true,
            inline_unit: SizeUnit::Cells,
            cell_width: 8,
            cell_height: 16,
        }
    }
}

impl RendererConfig {
    /// Per-user configuration directory
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "tileterm", "tileterm").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Path of the config file
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// The configured backend choice (unknown names mean auto)
    pub fn renderer_override(&self) -> RendererOverride {
        RendererOverride::parse_lenient(&self.renderer)
    }
}

/// Load configuration from `path`; a missing file yields the defaults
pub fn load_config(path: &Path) -> Result<RendererConfig> {
    if !path.exists() {
        return Ok(RendererConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| RenderError::Config(format!("Failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| RenderError::Config(format!("Invalid TOML in {}: {e}", path.display())))
}

/// Load from the per-user config location, or defaults
pub fn load_default_config() -> Result<RendererConfig> {
    match RendererConfig::config_path() {
        Some(path) => load_config(&path),
        None => Ok(RendererConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = RendererConfig::default();
        assert_eq!(config.renderer_override(), RendererOverride::Auto);
        assert!(config.color);
        assert_eq!((config.cell_width, config.cell_height), (8, 16));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, RendererConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "renderer = \"sixel\"\ninline_unit = \"percent\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.renderer_override(), RendererOverride::Sixel);
        assert_eq!(config.inline_unit, SizeUnit::Percent);
        assert!(config.color);
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "color = \"maybe\"").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
    }
}
