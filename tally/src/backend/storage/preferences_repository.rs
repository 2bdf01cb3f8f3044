//! # Preferences Repository
//!
//! App-wide preferences that don't belong to any note, stored as YAML under
//! the `preferences` key next to the notes document.
//!
//! ```yaml
//! dark_mode: true
//! data_format_version: "1.0"
//! updated_at: "2025-01-21T19:35:00Z"
//! ```

use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::traits::KeyValueStorage;

pub const PREFERENCES_KEY: &str = "preferences";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub dark_mode: bool,
    /// Data format version for future migrations
    pub data_format_version: String,
    pub updated_at: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            data_format_version: "1.0".to_string(),
            updated_at: None,
        }
    }
}

#[derive(Clone)]
pub struct PreferencesRepository {
    storage: Arc<dyn KeyValueStorage>,
}

impl PreferencesRepository {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Current preferences; unreadable or malformed data yields defaults
    pub fn get_preferences(&self) -> Preferences {
        let yaml_content = match self.storage.get(PREFERENCES_KEY) {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!("No stored preferences, using defaults");
                return Preferences::default();
            }
            Err(e) => {
                warn!("Failed to read preferences: {}. Using defaults.", e);
                return Preferences::default();
            }
        };

        match serde_yaml::from_str(&yaml_content) {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!("Stored preferences are malformed: {}. Using defaults.", e);
                Preferences::default()
            }
        }
    }

    pub fn update_preferences(&self, preferences: &Preferences) -> Result<Preferences> {
        let mut updated = preferences.clone();
        updated.updated_at = Some(Utc::now().to_rfc3339());

        let yaml_content = serde_yaml::to_string(&updated)?;
        self.storage.set(PREFERENCES_KEY, &yaml_content)?;

        info!("Updated preferences");
        Ok(updated)
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<Preferences> {
        let mut preferences = self.get_preferences();
        preferences.dark_mode = enabled;
        self.update_preferences(&preferences)
    }
}
