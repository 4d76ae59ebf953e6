//! Persisted pairing state: the watch's Bluetooth address and the code it
//! was paired with, so a second run doesn't need to repeat the pairing
//! handshake.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine a config directory for this platform")]
    NoConfigDir,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// One previously paired watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairedDevice {
    pub address: String,
    pub pairing_code: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    devices: Vec<PairedDevice>,
}

/// Reads and writes `wristlink/config.toml` under the platform config
/// directory (`$XDG_CONFIG_HOME`, `~/Library/Application Support`, or
/// `%APPDATA%`, resolved by the `directories` crate).
pub struct Config {
    path: PathBuf,
    file: ConfigFile,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let dirs = directories::ProjectDirs::from("", "", "wristlink").ok_or(ConfigError::NoConfigDir)?;
        let path = dirs.config_dir().join("config.toml");

        let file = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigFile::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        Ok(Self { path, file })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let serialized = toml::to_string_pretty(&self.file)?;
        std::fs::write(&self.path, serialized).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn find_device(&self, address: &str) -> Option<&PairedDevice> {
        self.file
            .devices
            .iter()
            .find(|d| d.address.eq_ignore_ascii_case(address))
    }

    /// Record or update a paired device's code.
    pub fn remember_device(&mut self, address: &str, pairing_code: u32) {
        if let Some(existing) = self
            .file
            .devices
            .iter_mut()
            .find(|d| d.address.eq_ignore_ascii_case(address))
        {
            existing.pairing_code = pairing_code;
        } else {
            self.file.devices.push(PairedDevice {
                address: address.to_string(),
                pairing_code,
            });
        }
    }
}
