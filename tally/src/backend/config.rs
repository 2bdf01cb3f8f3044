//! # Tally Configuration
//!
//! Application configuration stored as a single YAML file. Every field has a
//! default, so a missing file or a partial file is fine.
//!
//! ## YAML Format
//!
//! ```yaml
//! data_directory: "/home/user/.local/share/kinshu-tally"
//! storage_key: "notes_data"
//! save_debounce_ms: 100
//! max_saved_points: 30
//! default_note_name: "新規ノート"
//! log_level: "info"
//! ```

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Storage key of the notes document
pub const DEFAULT_STORAGE_KEY: &str = "notes_data";
/// History entries kept per note
pub const DEFAULT_MAX_SAVED_POINTS: usize = 30;
/// Window in which live edits are coalesced into one write
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 100;
/// Prefix of generated note names ("新規ノート 1", "新規ノート 2", ...)
pub const DEFAULT_NOTE_NAME: &str = "新規ノート";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Directory holding the persisted notes and preferences
    pub data_directory: PathBuf,
    /// Key the notes document is stored under
    pub storage_key: String,
    /// Delay before a coalesced write lands, in milliseconds
    pub save_debounce_ms: u64,
    /// Maximum number of save points kept per note
    pub max_saved_points: usize,
    /// Prefix used when a note name has to be generated
    pub default_note_name: String,
    /// Level for this crate's log output
    pub log_level: String,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            max_saved_points: DEFAULT_MAX_SAVED_POINTS,
            default_note_name: DEFAULT_NOTE_NAME.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl TallyConfig {
    /// Defaults with the data directory pointed somewhere else
    pub fn for_directory<P: AsRef<Path>>(data_directory: P) -> Self {
        Self {
            data_directory: data_directory.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file, falling back to defaults if it doesn't exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: TallyConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yaml::to_string(self)?;

        // Use atomic write pattern: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, path)?;

        debug!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(anyhow::anyhow!("storage_key cannot be empty"));
        }
        if self.max_saved_points == 0 {
            return Err(anyhow::anyhow!("max_saved_points must be at least 1"));
        }
        if self.default_note_name.trim().is_empty() {
            return Err(anyhow::anyhow!("default_note_name cannot be empty"));
        }
        Ok(())
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

fn default_data_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kinshu-tally")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = TallyConfig::load(temp_dir.path().join("config.yaml")).unwrap();

        assert_eq!(config.storage_key, "notes_data");
        assert_eq!(config.max_saved_points, 30);
        assert_eq!(config.save_debounce(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "max_saved_points: 5\nlog_level: debug\n").unwrap();

        let config = TallyConfig::load(&path).unwrap();
        assert_eq!(config.max_saved_points, 5);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");
        let config = TallyConfig {
            save_debounce_ms: 250,
            ..TallyConfig::for_directory(temp_dir.path())
        };

        config.save(&path).unwrap();
        assert_eq!(TallyConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "max_saved_points: 0\n").unwrap();

        let result = TallyConfig::load(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_saved_points"));
    }
}
