use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SPARSE_COLUMN_THRESHOLD: usize = 3;

/// Section header names the template builder looks for. Each list is
/// consulted in order and the first name present in the sheet wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub takeover_divider_names: Vec<String>,
    pub contact_person_names: Vec<String>,
    pub responsible_person_names: Vec<String>,
    /// Data columns with at most this many populated fields are reported
    /// as sparse.
    pub sparse_column_threshold: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            takeover_divider_names: Vec::new(),
            contact_person_names: Vec::new(),
            responsible_person_names: Vec::new(),
            sparse_column_threshold: DEFAULT_SPARSE_COLUMN_THRESHOLD,
        }
    }
}

impl ExtractionConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reads the config at [`default_config_path`], falling back to the
    /// default when no file exists yet.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path()?;
        if !path.is_file() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let project_dirs =
        ProjectDirs::from("com", "hellhbbd", "takeover_forms").ok_or(ConfigError::NoConfigDir)?;
    Ok(project_dirs.config_dir().join("config.json"))
}
