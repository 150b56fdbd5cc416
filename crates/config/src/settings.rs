// Application settings
// Loaded from ~/.config/terrapin/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Canvas preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    /// Edge length of the (square) canvas in pixels.
    pub size: i32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self { size: 2048 }
    }
}

/// Message display preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageSettings {
    /// Show script print() output as it arrives.
    pub auto_show_output: bool,
    /// Show script errors as they arrive.
    pub auto_show_errors: bool,
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            auto_show_output: true,
            auto_show_errors: true,
        }
    }
}

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub canvas: CanvasSettings,
    pub messages: MessageSettings,
    /// Script files executed before the first user submission.
    pub startup_scripts: Vec<String>,
    /// Lua module search patterns seeded into the engine (e.g.
    /// "/home/user/turtle-libs/?.lua").
    pub require_paths: Vec<String>,
}

impl Settings {
    /// Default settings file location (~/.config/terrapin/settings.json).
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("terrapin")
            .join("settings.json")
    }

    /// Load settings from the default location. Never fails: a missing
    /// file produces defaults (and writes a commented default file), a
    /// malformed one produces defaults with a warning.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &PathBuf) -> Self {
        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(path);
            return settings;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("error parsing {}: {}; using defaults", path.display(), e);
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::warn!("error reading {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to the default location.
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Write the default settings file with explanatory comments.
    fn create_default_file(&self, path: &PathBuf) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Canvas
    "canvas": {
        // Edge length of the square canvas in pixels
        "size": 2048
    },

    // Script messages
    "messages": {
        "auto_show_output": true,
        "auto_show_errors": true
    },

    // Script files executed at startup, before the first submission
    "startup_scripts": [],

    // Lua module search patterns, e.g. "/home/user/turtle-libs/?.lua"
    "require_paths": []
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("error writing default settings: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.canvas.size, 2048);
        assert!(settings.messages.auto_show_output);
        assert!(settings.messages.auto_show_errors);
        assert!(settings.startup_scripts.is_empty());
        assert!(settings.require_paths.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.canvas.size = 512;
        settings.require_paths.push("/libs/?.lua".to_string());
        settings.startup_scripts.push("init.lua".to_string());
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_file_creates_commented_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings::load_from(&path);
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        // The generated file has comments but still round-trips.
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("//"));
        let reloaded = Settings::load_from(&path);
        assert_eq!(reloaded, Settings::default());
    }

    #[test]
    fn test_load_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "canvas": { "size": 100 } }"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.canvas.size, 100);
        assert!(settings.messages.auto_show_output);
    }
}
