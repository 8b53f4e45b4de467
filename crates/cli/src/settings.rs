use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use faceguard_kiosk_core::pipeline::recognition_poller::PollerConfig;
use faceguard_kiosk_core::presentation::kiosk::KioskConfig;
use faceguard_kiosk_core::recognition::infrastructure::http_recognition_client::ClientConfig;
use faceguard_kiosk_core::shared::constants::{
    DEFAULT_SERVER_URL, MAX_IN_FLIGHT, POLL_INTERVAL_MS, REQUEST_TIMEOUT_SECS,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("no configuration directory on this platform")]
    NoConfigDir,
    #[error("cannot access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_in_flight: usize,
    pub use_system_proxy: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
            poll_interval_ms: POLL_INTERVAL_MS,
            max_in_flight: MAX_IN_FLIGHT,
            use_system_proxy: true,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceGuard Kiosk").join("settings.json"))
    }

    /// Loads the user's settings, falling back to defaults when the file is
    /// missing or broken.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(SettingsError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source: io::Error| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.server_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            use_system_proxy: self.use_system_proxy,
            ..ClientConfig::default()
        }
    }

    pub fn kiosk_config(&self) -> KioskConfig {
        KioskConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            poller: PollerConfig {
                max_in_flight: self.max_in_flight.max(1),
                ..PollerConfig::default()
            },
            ..KioskConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            server_url: "http://kiosk-backend:9000".to_string(),
            timeout_secs: 3,
            ..Settings::default()
        };

        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"server_url": "http://10.0.0.5:8000"}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.server_url, "http://10.0.0.5:8000");
        assert_eq!(settings.poll_interval_ms, POLL_INTERVAL_MS);
        assert_eq!(settings.max_in_flight, MAX_IN_FLIGHT);
    }

    #[test]
    fn test_invalid_json_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let err = Settings::load_from(&path).unwrap_err();

        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();

        let err = Settings::load_from(&dir.path().join("absent.json")).unwrap_err();

        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_client_config_carries_server_and_timeout() {
        let settings = Settings {
            server_url: "http://kiosk-backend:9000".to_string(),
            timeout_secs: 4,
            use_system_proxy: false,
            ..Settings::default()
        };

        let config = settings.client_config();

        assert_eq!(config.base_url, "http://kiosk-backend:9000");
        assert_eq!(config.timeout, Duration::from_secs(4));
        assert!(!config.use_system_proxy);
        assert_eq!(config.identify_path, "/reconocer");
    }

    #[test]
    fn test_client_config_never_uses_zero_timeout() {
        let settings = Settings {
            timeout_secs: 0,
            ..Settings::default()
        };

        assert_eq!(settings.client_config().timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_kiosk_config_never_uses_zero_interval_or_cap() {
        let settings = Settings {
            poll_interval_ms: 0,
            max_in_flight: 0,
            ..Settings::default()
        };

        let config = settings.kiosk_config();

        assert_eq!(config.poll_interval, Duration::from_millis(1));
        assert_eq!(config.poller.max_in_flight, 1);
    }
}
