use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FinboardError, Result};

/// File name of the rule document inside the data directory.
pub const RULES_FILE_NAME: &str = "categories.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    /// Rule document path; `<data_dir>/categories.json` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<String>,
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            rules_file: None,
        }
    }
}

impl Settings {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.data_dir))
    }

    pub fn rules_path(&self) -> PathBuf {
        match &self.rules_file {
            Some(file) => PathBuf::from(shellexpand_path(file)),
            None => self.data_path().join(RULES_FILE_NAME),
        }
    }

    /// Apply per-invocation overrides from the command line.
    pub fn with_overrides(mut self, data_dir: Option<&str>, rules: Option<&str>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir.to_string();
        }
        if let Some(file) = rules {
            self.rules_file = Some(file.to_string());
        }
        self
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("finboard")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("finboard")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Settings {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Ignoring unreadable settings {}: {e}", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| FinboardError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/finance".to_string(),
            rules_file: Some("/tmp/rules.json".to_string()),
        };
        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.data_dir, "/tmp/finance");
        assert_eq!(loaded.rules_path(), PathBuf::from("/tmp/rules.json"));
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert!(s.rules_file.is_none());
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_rules_path_defaults_into_data_dir() {
        let json = r#"{"data_dir": "/tmp/finance"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.rules_path(), PathBuf::from("/tmp/finance/categories.json"));
    }

    #[test]
    fn test_overrides_win() {
        let s = Settings::default().with_overrides(Some("/data"), None);
        assert_eq!(s.data_path(), PathBuf::from("/data"));
        assert_eq!(s.rules_path(), PathBuf::from("/data/categories.json"));
        let s = s.with_overrides(None, Some("/elsewhere/rules.json"));
        assert_eq!(s.rules_path(), PathBuf::from("/elsewhere/rules.json"));
    }

    #[test]
    fn test_garbage_settings_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        let s = load_settings_from(&path);
        assert!(s.rules_file.is_none());
    }
}
