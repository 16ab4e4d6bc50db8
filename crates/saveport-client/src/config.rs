//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Default upload size limit: 448 KiB
pub const DEFAULT_UPLOAD_LIMIT: u64 = 458_752;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Server URL missing or unparsable
    #[error("invalid server URL: {0}")]
    InvalidServerUrl(String),

    /// Console id must be 16 hex characters
    #[error("invalid console id: {0:?}")]
    InvalidConsoleId(String),

    /// API key must not be empty
    #[error("api key is empty")]
    EmptyApiKey,
}

/// Configuration record consumed by the engine
///
/// Injected once at engine construction and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the sync server
    pub server_url: String,

    /// API key sent with every request
    pub api_key: String,

    /// This device's console id, 16 hex characters
    pub console_id: String,

    /// Directory for engine state, including the sync journal
    pub state_directory: PathBuf,

    /// Largest encoded bundle the engine will upload
    #[serde(default = "default_upload_limit")]
    pub upload_size_limit_bytes: u64,

    /// Directory scanned for external-handheld ROM images
    #[serde(default)]
    pub external_handheld_rom_directory: Option<PathBuf>,
}

fn default_upload_limit() -> u64 {
    DEFAULT_UPLOAD_LIMIT
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            api_key: String::new(),
            console_id: "0000000000000000".to_string(),
            state_directory: PathBuf::from("./state"),
            upload_size_limit_bytes: DEFAULT_UPLOAD_LIMIT,
            external_handheld_rom_directory: None,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given server and console identity
    pub fn new(
        server_url: impl Into<String>,
        api_key: impl Into<String>,
        console_id: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: api_key.into(),
            console_id: console_id.into(),
            ..Self::default()
        }
    }

    /// Set the state directory
    #[must_use]
    pub fn with_state_directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.state_directory = dir.as_ref().to_path_buf();
        self
    }

    /// Set the upload size limit
    #[must_use]
    pub const fn with_upload_limit(mut self, bytes: u64) -> Self {
        self.upload_size_limit_bytes = bytes;
        self
    }

    /// Set the external-handheld ROM directory
    #[must_use]
    pub fn with_handheld_rom_directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.external_handheld_rom_directory = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Check the record for values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.server_url).is_err() {
            return Err(ConfigError::InvalidServerUrl(self.server_url.clone()));
        }
        if self.console_id.len() != 16 || !self.console_id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidConsoleId(self.console_id.clone()));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn valid() -> ClientConfig {
        ClientConfig::new("https://sync.example", "secret", "AAAA000011112222")
    }

    #[test]
    fn test_valid_config_passes() {
        valid().validate().expect("valid config");
    }

    #[test]
    fn test_default_upload_limit() {
        assert_eq!(valid().upload_size_limit_bytes, 458_752);
    }

    #[test]
    fn test_bad_console_id_rejected() {
        for bad in ["", "1234", "zzzz000011112222", "AAAA0000111122223"] {
            let mut config = valid();
            config.console_id = bad.to_string();
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidConsoleId(_))
            ));
        }
    }

    #[test]
    fn test_bad_server_url_rejected() {
        let mut config = valid();
        config.server_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidServerUrl(_))
        ));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let mut config = valid();
        config.api_key = String::new();
        assert_eq!(config.validate(), Err(ConfigError::EmptyApiKey));
    }

    #[test]
    fn test_deserialization_fills_defaults() {
        let json = r#"{
            "server_url": "https://sync.example",
            "api_key": "secret",
            "console_id": "AAAA000011112222",
            "state_directory": "/tmp/state"
        }"#;
        let config: ClientConfig = serde_json::from_str(json).expect("deserializes");
        assert_eq!(config.upload_size_limit_bytes, DEFAULT_UPLOAD_LIMIT);
        assert_eq!(config.external_handheld_rom_directory, None);
    }
}
