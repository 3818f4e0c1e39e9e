//! Settings file storage

use anyhow::{Context, Result};
use log::{info, warn};
use round_panel_core::{ColorTable, PanelError, Settings};
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.json";

/// Location of the persisted settings file
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the platform configuration directory
    pub fn default_location() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("com", "round-panel", "round-panel")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(Self::at(dirs.config_dir().join(SETTINGS_FILE_NAME)))
    }

    /// Store at a specific file path
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to defaults if the file is missing or
    /// cannot be parsed
    pub fn load_or_default(&self) -> Settings {
        if !self.path.exists() {
            info!("No settings file at {}, using defaults", self.path.display());
            return Settings::default();
        }

        match self.load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}; using defaults", e);
                Settings::default()
            }
        }
    }

    /// Load settings, reporting why the file was rejected
    pub fn load(&self) -> std::result::Result<Settings, PanelError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            PanelError::Config(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            PanelError::Config(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(settings.sanitized())
    }

    /// Write settings to disk, creating the parent directory if needed
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Load a color table from a JSON object of token -> name
pub fn load_color_table(path: &Path) -> Result<ColorTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read color table {}", path.display()))?;
    let table: ColorTable = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse color table {}", path.display()))?;
    Ok(table)
}
