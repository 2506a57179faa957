//! Configuration model.
//!
//! The host hands a [`Config`] to
//! [`StatusContext::config_changed`](crate::StatusContext::config_changed)
//! on every reload. It can be loaded from TOML:
//!
//! ```toml
//! [caches]
//! request = "expireAfterAccess=6h, maximumSize=1000"
//! favicon = "expireAfterWrite=6h, maximumSize=25"
//!
//! [plugin]
//! favicons = true
//! player_tracking = true
//! stats = false
//! ```
//!
//! Every field has a default. Whether the status response is customized at
//! all is decided by the status engine, not the file; set it with
//! [`Config::with_customization`].

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::cache::{DEFAULT_FAVICON_SPEC, DEFAULT_REQUEST_SPEC};
use crate::{PingCacheError, Result};

/// Full configuration snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub caches: CachesConfig,
    #[serde(default)]
    pub plugin: PluginConfig,
    /// Whether any status customization requires intercepting pings.
    #[serde(skip)]
    pub customization_active: bool,
}

/// Cache policy strings.
#[derive(Debug, Clone, Deserialize)]
pub struct CachesConfig {
    #[serde(default = "default_request")]
    pub request: String,
    #[serde(default = "default_favicon")]
    pub favicon: String,
}

impl Default for CachesConfig {
    fn default() -> Self {
        Self {
            request: default_request(),
            favicon: default_favicon(),
        }
    }
}

fn default_request() -> String {
    DEFAULT_REQUEST_SPEC.to_string()
}

fn default_favicon() -> String {
    DEFAULT_FAVICON_SPEC.to_string()
}

/// Feature toggles.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    /// Serve custom favicons (default: true).
    #[serde(default = "default_true")]
    pub favicons: bool,
    /// Remember players by address (default: true).
    #[serde(default = "default_true")]
    pub player_tracking: bool,
    /// Report usage statistics (default: false).
    #[serde(default)]
    pub stats: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            favicons: true,
            player_tracking: true,
            stats: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PingCacheError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            PingCacheError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PingCacheError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Set whether the status response is customized.
    pub fn with_customization(mut self, active: bool) -> Self {
        self.customization_active = active;
        self
    }

    /// The favicon cache policy, or `None` when favicons are disabled.
    pub fn favicon_spec(&self) -> Option<&str> {
        self.plugin
            .favicons
            .then_some(self.caches.favicon.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.caches.request, DEFAULT_REQUEST_SPEC);
        assert_eq!(config.caches.favicon, DEFAULT_FAVICON_SPEC);
        assert!(config.plugin.favicons);
        assert!(config.plugin.player_tracking);
        assert!(!config.plugin.stats);
        assert!(!config.customization_active);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [caches]
            request = "maximumSize=10"
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.caches.request, "maximumSize=10");
        // Defaults preserved
        assert_eq!(config.caches.favicon, DEFAULT_FAVICON_SPEC);
        assert!(config.plugin.favicons);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [caches]
            request = "expireAfterWrite=1m"
            favicon = "maximumSize=3"

            [plugin]
            favicons = false
            player_tracking = false
            stats = true
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.caches.favicon, "maximumSize=3");
        assert!(!config.plugin.player_tracking);
        assert!(config.plugin.stats);
        assert_eq!(config.favicon_spec(), None);
    }

    #[test]
    fn customization_is_not_read_from_file() {
        let config = Config::from_toml_str("customization_active = true").unwrap();
        assert!(!config.customization_active);
        assert!(config.with_customization(true).customization_active);
    }

    #[test]
    fn favicon_spec_when_enabled() {
        let config = Config::default();
        assert_eq!(config.favicon_spec(), Some(DEFAULT_FAVICON_SPEC));
    }

    #[test]
    fn invalid_toml_is_configuration_error() {
        let err = Config::from_toml_str("[caches").unwrap_err();
        assert!(matches!(err, PingCacheError::Configuration(_)));
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Path::new("/nonexistent/pingcache.toml"));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }
}
