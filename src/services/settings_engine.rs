// marksmith Settings Engine
// Loads, validates and persists `settings.json` from the platform config dir.
// Single values are addressed with dot-separated keys such as `audit.workers`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

pub struct SettingsEngine {
    config_path: PathBuf,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Uses `path_override` when given, else `settings.json` in
    /// [`platform::get_config_dir`]. Nothing is read until [`load`](SettingsEngineTrait::load).
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override
            .map(PathBuf::from)
            .unwrap_or_else(|| platform::get_config_dir().join("settings.json"));
        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }
}

/// Rejects values that deserialize fine but cannot work at runtime.
fn validate(settings: &AppSettings) -> Result<(), SettingsError> {
    let problem = if settings.general.scratch_folder_title.trim().is_empty() {
        Some("general.scratch_folder_title must not be empty")
    } else if settings.audit.workers == 0 {
        Some("audit.workers must be at least 1")
    } else if settings.audit.timeout_secs == 0 {
        Some("audit.timeout_secs must be at least 1")
    } else if settings
        .liveness
        .processes
        .iter()
        .any(|p| p.executable.trim().is_empty())
    {
        Some("liveness.processes entries need an executable name")
    } else {
        None
    };
    match problem {
        Some(msg) => Err(SettingsError::InvalidValue(msg.to_string())),
        None => Ok(()),
    }
}

/// Replaces the existing field named by `key` inside `root`.
///
/// Only keys already present can be set; the serialized defaults define
/// the full key space.
fn replace_at(root: &mut Value, key: &str, value: Value) -> Result<(), SettingsError> {
    let unknown = || SettingsError::InvalidKey(format!("Key '{}' not found in settings", key));
    if key.is_empty() {
        return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
    }

    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = parts.split_last().ok_or_else(unknown)?;
    let mut current = root;
    for part in parents {
        current = current.get_mut(*part).ok_or_else(unknown)?;
    }
    match current {
        Value::Object(map) => match map.get_mut(*last) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(unknown()),
        },
        _ => Err(SettingsError::InvalidKey(format!(
            "Cannot navigate to key '{}': intermediate value is not an object",
            key
        ))),
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Reads the settings file. A missing file yields the defaults; a file
    /// that does not parse or validate is an error and leaves the current
    /// settings untouched.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "no settings file, using defaults");
            self.settings = AppSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;
        let settings: AppSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Writes the settings through a temp file in the same directory, so a
    /// crash never leaves a half-written `settings.json`.
    fn save(&self) -> Result<(), SettingsError> {
        let io = |what: &str, e: std::io::Error| SettingsError::IoError(format!("{}: {}", what, e));

        let dir = match self.config_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| io("Failed to create config directory", e))?;

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| io("Failed to create temp file", e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| io("Failed to write config file", e))?;
        tmp.persist(&self.config_path)
            .map_err(|e| io("Failed to replace config file", e.error))?;
        Ok(())
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Sets one value and saves.
    ///
    /// Keys look like `general.scratch_folder_title` or `audit.workers`;
    /// `liveness.processes` replaces the whole list.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut tree = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;
        replace_at(&mut tree, key, value)?;

        let updated: AppSettings = serde_json::from_value(tree).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        validate(&updated)?;

        self.settings = updated;
        self.save()?;
        debug!(key, "setting updated");
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
