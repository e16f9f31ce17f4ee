//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "app": { "maxFileSize": 10485760 },
//!   "import": { "likelyDuplicateThreshold": 0.7, "dateWindowDays": 3 }
//! }
//! ```
//! Saving preserves any fields the engine does not manage.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;
use crate::services::detect::DEFAULT_MAX_FILE_SIZE;
use crate::services::duplicates::DuplicateConfig;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    import: ImportSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    max_file_size: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportSettings {
    #[serde(default)]
    likely_duplicate_threshold: Option<f64>,
    #[serde(default)]
    include_threshold: Option<f64>,
    #[serde(default)]
    date_window_days: Option<i64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Simplified view of the settings the engine cares about
#[derive(Debug, Clone)]
pub struct Config {
    pub max_file_size: u64,
    pub duplicates: DuplicateConfig,
    // Raw settings kept for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            duplicates: DuplicateConfig::default(),
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory; a missing or malformed file
    /// yields the defaults
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let mut duplicates = DuplicateConfig::default();
        if let Some(threshold) = raw.import.likely_duplicate_threshold {
            duplicates.likely_threshold = threshold;
        }
        if let Some(threshold) = raw.import.include_threshold {
            duplicates.include_threshold = threshold;
        }
        if let Some(days) = raw.import.date_window_days {
            duplicates.date_window_days = days;
        }

        Ok(Self {
            max_file_size: raw.app.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE),
            duplicates,
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory, keeping unmanaged fields intact
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.max_file_size = Some(self.max_file_size);
        settings.import.likely_duplicate_threshold = Some(self.duplicates.likely_threshold);
        settings.import.include_threshold = Some(self.duplicates.include_threshold);
        settings.import.date_window_days = Some(self.duplicates.date_window_days);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!((config.duplicates.likely_threshold - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_load_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"app": {"maxFileSize": 1024}, "import": {"likelyDuplicateThreshold": 0.9, "dateWindowDays": 5}}"#,
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.max_file_size, 1024);
        assert!((config.duplicates.likely_threshold - 0.9).abs() < 1e-9);
        assert_eq!(config.duplicates.date_window_days, 5);
    }

    #[test]
    fn test_save_preserves_unmanaged_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"app": {"theme": "dark"}, "import": {}}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        config.max_file_size = 2048;
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        assert!(content.contains("\"theme\""));
        assert!(content.contains("2048"));
    }

    #[test]
    fn test_malformed_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }
}
