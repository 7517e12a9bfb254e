//! Configuration loading
//!
//! Settings live in a user-level TOML file. Resolution priority:
//! 1. Explicit path given by the caller
//! 2. `PROGCOM_CONFIG` environment variable
//! 3. `<user config dir>/progcom/config.toml`
//!
//! Only the `[upstream]` section is required. The optional `[storage]` and
//! `[communication]` sections configure external providers handled by other
//! tooling; leaving them out disables those features without affecting core
//! operation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default wire version pinned on every request.
pub const DEFAULT_API_VERSION: &str = "v1";

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_rate_limit() -> u32 {
    2
}

fn default_burst() -> u32 {
    5
}

/// Connection settings for the CfP service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the upstream instance, e.g. `https://cfp.example.org`.
    pub base_url: String,
    /// API token; optional, but `reviews` and `answers` need privileged
    /// credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Per-request wall-clock deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sustained request rate (requests per second).
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    /// Burst capacity of the rate limiter.
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// Storage provider settings (spreadsheet/file adapters live elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<PathBuf>,
}

/// Communication provider settings (mail/ticket adapters live elsewhere).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunicationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Raw file shape; everything optional so we can report precise
/// missing-field errors instead of opaque parse failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default)]
    upstream: Option<RawUpstream>,
    #[serde(default)]
    storage: Option<StorageConfig>,
    #[serde(default)]
    communication: Option<CommunicationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawUpstream {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    rate_limit: Option<u32>,
    #[serde(default)]
    burst: Option<u32>,
}

/// Validated configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub upstream: UpstreamConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication: Option<CommunicationConfig>,
}

impl Config {
    /// Load configuration following the resolution priority above.
    pub fn load(explicit_path: Option<&Path>) -> Result<Config> {
        let path = resolve_config_path(explicit_path)?;
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Config::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Config> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;

        let upstream = raw.upstream.ok_or(Error::ConfigMissing { field: "upstream" })?;
        let base_url = upstream.base_url.ok_or(Error::ConfigMissing {
            field: "upstream.base_url",
        })?;

        if let Some(storage) = &raw.storage {
            if storage.provider.is_empty() {
                return Err(Error::ConfigMissing {
                    field: "storage.provider",
                });
            }
        }

        Ok(Config {
            upstream: UpstreamConfig {
                base_url,
                token: upstream.token,
                api_version: upstream.api_version.unwrap_or_else(default_api_version),
                timeout_secs: upstream.timeout_secs.unwrap_or_else(default_timeout_secs),
                rate_limit: upstream.rate_limit.unwrap_or_else(default_rate_limit),
                burst: upstream.burst.unwrap_or_else(default_burst),
            },
            storage: raw.storage,
            communication: raw.communication,
        })
    }

    /// Whether a storage provider is configured.
    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    /// Whether a mail provider is configured.
    pub fn has_mail(&self) -> bool {
        self.communication
            .as_ref()
            .and_then(|c| c.email_provider.as_ref())
            .is_some()
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("PROGCOM_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|dir| dir.join("progcom").join("config.toml"))
        .ok_or_else(|| Error::Config("cannot determine user config directory".to_string()))
}
