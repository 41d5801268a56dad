//! Settings persistence.
//!
//! One XML document, `PadForge.xml`, sitting next to the executable
//! (with `Settings.xml` accepted as a legacy name on load). The root
//! element holds four children in a fixed order: the remembered
//! devices, the user's device-to-slot settings, the unique mapping
//! configurations they reference by content checksum, and the
//! application options.
//!
//! Saves are atomic: the document is written to a temporary file in the
//! same directory and renamed over the target, so a crash mid-save
//! never leaves a half-written settings file.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(rust_2018_idioms)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use padforge_mapping::MappingConfig;
use padforge_schemas::{DeviceEntry, UserSetting};

/// Primary settings file name.
pub const PRIMARY_FILE: &str = "PadForge.xml";
/// Legacy file name accepted on load when the primary is absent.
pub const LEGACY_FILE: &str = "Settings.xml";

/// Settings persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The document does not parse
    #[error("Unparseable settings document {path}: {message}")]
    Parse {
        /// The file involved
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Serialization failure on save
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),

    /// A user setting references a mapping checksum that is not in the
    /// document
    #[error("Setting for device {device} references missing mapping {checksum:#018x}")]
    DanglingChecksum {
        /// The referencing device
        device: String,
        /// The missing checksum
        checksum: u64,
    },
}

impl From<SettingsError> for padforge_errors::PadForgeError {
    fn from(e: SettingsError) -> Self {
        use padforge_errors::PadForgeError;
        match e {
            SettingsError::Io { source, .. } => PadForgeError::Io(source),
            other => PadForgeError::Config(other.to_string()),
        }
    }
}

/// Application options outside the pipeline core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Polling period override in microseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_period_us: Option<u64>,
    /// Log filter applied at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct DeviceList {
    #[serde(rename = "Device", default)]
    items: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct UserSettingList {
    #[serde(rename = "Setting", default)]
    items: Vec<UserSetting>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct PadSettingList {
    #[serde(rename = "PadSetting", default)]
    items: Vec<MappingConfig>,
}

/// The on-disk document shape. Field order is the element order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "PadForgeSettings")]
struct SettingsDocument {
    #[serde(rename = "Devices", default)]
    devices: DeviceList,
    #[serde(rename = "UserSettings", default)]
    user_settings: UserSettingList,
    #[serde(rename = "PadSettings", default)]
    pad_settings: PadSettingList,
    #[serde(rename = "AppSettings", default)]
    app_settings: AppSettings,
}

/// The loaded settings graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Remembered devices
    pub devices: Vec<DeviceEntry>,
    /// Device-to-slot settings
    pub user_settings: Vec<UserSetting>,
    /// Unique mapping configurations, referenced by checksum
    pub pad_settings: Vec<MappingConfig>,
    /// Application options
    pub app: AppSettings,
}

impl Settings {
    /// Load from a directory: the primary file, else the legacy file,
    /// else empty defaults. A present-but-unparseable file is an error;
    /// silently starting fresh would discard the user's configuration.
    pub fn load_or_default(dir: &Path) -> Result<Self, SettingsError> {
        for name in [PRIMARY_FILE, LEGACY_FILE] {
            let path = dir.join(name);
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        tracing::info!(dir = %dir.display(), "no settings file, starting with defaults");
        Ok(Self::default())
    }

    /// Load a specific document.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: SettingsDocument =
            quick_xml::de::from_str(&text).map_err(|e| SettingsError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let settings = Self {
            devices: document.devices.items,
            user_settings: document.user_settings.items,
            pad_settings: document.pad_settings.items,
            app: document.app_settings,
        };
        tracing::info!(
            path = %path.display(),
            devices = settings.devices.len(),
            settings = settings.user_settings.len(),
            mappings = settings.pad_settings.len(),
            "settings loaded"
        );
        Ok(settings)
    }

    /// Save under the primary name in `dir`, atomically.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, SettingsError> {
        let document = SettingsDocument {
            devices: DeviceList {
                items: self.devices.clone(),
            },
            user_settings: UserSettingList {
                items: self.user_settings.clone(),
            },
            pad_settings: PadSettingList {
                items: self.pad_settings.clone(),
            },
            app_settings: self.app.clone(),
        };
        let body = quick_xml::se::to_string(&document)
            .map_err(|e| SettingsError::Serialize(e.to_string()))?;
        let text = format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{body}");

        let target = dir.join(PRIMARY_FILE);
        let temp = dir.join(format!("{PRIMARY_FILE}.tmp"));
        fs::write(&temp, text).map_err(|source| SettingsError::Io {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &target).map_err(|source| SettingsError::Io {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }

    /// Index the mapping configurations by content checksum. Duplicate
    /// content collapses to one entry, which is exactly the sharing the
    /// checksum linkage exists for.
    pub fn configs_by_checksum(&self) -> HashMap<u64, &MappingConfig> {
        self.pad_settings
            .iter()
            .map(|config| (config.checksum(), config))
            .collect()
    }

    /// The configuration a user setting references, if present.
    pub fn config_for(&self, setting: &UserSetting) -> Option<&MappingConfig> {
        self.pad_settings
            .iter()
            .find(|config| config.checksum() == setting.map_checksum)
    }

    /// Check every checksum link, reporting each dangling reference.
    pub fn validate_links(&self) -> Vec<SettingsError> {
        let known = self.configs_by_checksum();
        self.user_settings
            .iter()
            .filter(|setting| !known.contains_key(&setting.map_checksum))
            .map(|setting| SettingsError::DanglingChecksum {
                device: setting.instance_id.to_string(),
                checksum: setting.map_checksum,
            })
            .collect()
    }

    /// Add a mapping configuration if its content is new, returning its
    /// checksum either way.
    pub fn intern_config(&mut self, config: MappingConfig) -> u64 {
        let checksum = config.checksum();
        if !self
            .pad_settings
            .iter()
            .any(|existing| existing.checksum() == checksum)
        {
            self.pad_settings.push(config);
        }
        checksum
    }
}
