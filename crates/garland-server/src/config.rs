//! Server configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (GARLAND_*)
//! - TOML configuration file

use anyhow::{Context, Result};
use garland_core::ChannelPolicy;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Channel policy configuration.
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Channel policy configuration, applied to every channel the registry
/// creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Decoration-store capacity per channel.
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,

    /// Roster capacity per channel.
    #[serde(default = "default_max_ccu")]
    pub max_ccu: usize,

    /// Guard-acquisition deadline in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Minimum milliseconds between two pushes by the same user. Zero
    /// disables the check.
    #[serde(default)]
    pub cooldown_ms: u64,
}

/// Resource limits configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum WebSocket message size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics export.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_host() -> String {
    std::env::var("GARLAND_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
}

fn default_port() -> u16 {
    std::env::var("GARLAND_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
}

fn default_true() -> bool {
    true
}

fn default_max_objects() -> usize {
    30
}

fn default_max_ccu() -> usize {
    10
}

fn default_lock_timeout_ms() -> u64 {
    1_000
}

fn default_max_message_size() -> usize {
    64 * 1024 // 64 KB
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            channel: ChannelConfig::default(),
            limits: LimitsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_objects: default_max_objects(),
            max_ccu: default_max_ccu(),
            lock_timeout_ms: default_lock_timeout_ms(),
            cooldown_ms: 0,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_metrics_port(),
        }
    }
}

impl ChannelConfig {
    /// Materialize the channel policy.
    #[must_use]
    pub fn policy(&self) -> ChannelPolicy {
        ChannelPolicy {
            max_objects: self.max_objects,
            max_ccu: self.max_ccu,
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}

impl Config {
    /// Load configuration from file or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        // Try to load from default paths
        let config_paths = [
            "garland.toml",
            "/etc/garland/garland.toml",
            "~/.config/garland/garland.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Get the socket address to bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid host:port")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.channel.max_objects, 30);
        assert_eq!(config.channel.max_ccu, 10);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_config_bind_addr() {
        let config = Config::default();
        let addr = config.bind_addr();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_policy_materialization() {
        let config = ChannelConfig {
            max_objects: 5,
            max_ccu: 2,
            lock_timeout_ms: 250,
            cooldown_ms: 3_000,
        };

        let policy = config.policy();
        assert_eq!(policy.max_objects, 5);
        assert_eq!(policy.max_ccu, 2);
        assert_eq!(policy.lock_timeout, Duration::from_millis(250));
        assert_eq!(policy.cooldown, Duration::from_secs(3));
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            host = "0.0.0.0"
            port = 9000

            [channel]
            max_objects = 50
            cooldown_ms = 1000
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.channel.max_objects, 50);
        assert_eq!(config.channel.cooldown_ms, 1000);
        // Unspecified fields keep their defaults.
        assert_eq!(config.channel.max_ccu, 10);
        assert_eq!(config.limits.max_message_size, 64 * 1024);
    }
}
