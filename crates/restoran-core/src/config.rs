//! Application configuration management.
//!
//! The config holds the backend address, request timeout, how to treat
//! 401/403 responses, and the last email used to log in.
//!
//! Configuration is stored at `~/.config/restoran/config.json`. The backend
//! address can be overridden with `RESTORAN_API_URL`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{AuthFailurePolicy, ClientOptions};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "restoran";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Hosted backend used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "https://restoran-be.vercel.app";

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "RESTORAN_API_URL";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Log out automatically when a protected call comes back 401/403.
    pub clear_session_on_auth_failure: bool,
    /// Serialize cart mutations per user instead of letting them race.
    pub serialize_cart_mutations: bool,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            clear_session_on_auth_failure: true,
            serialize_cart_mutations: false,
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Load the config file, falling back to defaults if it is unreadable.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Let `RESTORAN_API_URL` override the configured backend address.
    pub fn apply_env(&mut self) {
        if let Some(url) = std::env::var(API_URL_ENV).ok().filter(|url| !url.trim().is_empty()) {
            debug!(url = %url, "Backend address taken from environment");
            self.api_base_url = Some(url);
        }
    }

    pub fn base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            auth_failure_policy: if self.clear_session_on_auth_failure {
                AuthFailurePolicy::ClearSession
            } else {
                AuthFailurePolicy::Keep
            },
            serialize_cart_mutations: self.serialize_cart_mutations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"last_email":"a@b.com"}"#).unwrap();
        assert_eq!(config.last_email.as_deref(), Some("a@b.com"));
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert!(config.clear_session_on_auth_failure);
        assert!(!config.serialize_cart_mutations);
    }

    #[test]
    fn test_base_url_falls_back_to_default() {
        assert_eq!(Config::default().base_url(), DEFAULT_API_BASE_URL);
        let config = Config {
            api_base_url: Some("http://localhost:3000".to_string()),
            ..Config::default()
        };
        assert_eq!(config.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_client_options_follow_config() {
        let config = Config {
            request_timeout_secs: 0,
            clear_session_on_auth_failure: false,
            ..Config::default()
        };
        let options = config.client_options();
        assert_eq!(options.timeout, Duration::from_secs(1));
        assert_eq!(options.auth_failure_policy, AuthFailurePolicy::Keep);
    }
}
