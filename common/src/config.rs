//! Runtime settings for a discovery run.
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, then command-line flags. Every field has a serde
//! default so a partial file is valid.
//!
//! ```toml
//! port = 8080
//! connect_timeout_ms = 200
//! fallback_subnets = true
//! cache_file = "/home/me/.cache/seekr/cache.toml"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 200;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_PROBE_PATH: &str = "/ping";
pub const DEFAULT_ALIVE_MARKER: &str = "\"status\":200";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TCP port the paired service listens on.
    pub port: u16,
    /// Connect deadline for a single probe.
    pub connect_timeout_ms: u64,
    /// Deadline for the whole probe request, body included.
    pub request_timeout_ms: u64,
    pub probe_path: String,
    /// Substring whose presence in the probe body marks a host alive.
    pub alive_marker: String,
    /// Also scan the neighbouring 192.168.0/1 network.
    pub fallback_subnets: bool,
    /// Where the last confirmed address is persisted.
    pub cache_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            probe_path: DEFAULT_PROBE_PATH.to_string(),
            alive_marker: DEFAULT_ALIVE_MARKER.to_string(),
            fallback_subnets: true,
            cache_file: default_cache_file(),
        }
    }
}

impl Config {
    /// Loads `path`, filling missing fields with defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Config = toml::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".into()));
        }
        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        if !self.probe_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "probe path '{}' must start with '/'",
                self.probe_path
            )));
        }
        if self.alive_marker.is_empty() {
            return Err(ConfigError::Invalid("alive marker must not be empty".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// `$XDG_CACHE_HOME/seekr/cache.toml`, then `$HOME/.cache/seekr/cache.toml`,
/// then `./seekr-cache.toml`.
pub fn default_cache_file() -> PathBuf {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".cache"))
        });

    match base {
        Some(dir) => dir.join("seekr").join("cache.toml"),
        None => PathBuf::from("seekr-cache.toml"),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
