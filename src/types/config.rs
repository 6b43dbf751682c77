//! Configuration structures.
//!
//! Configuration is loaded from a JSON document or environment variables;
//! every field has a default.

use serde::{Deserialize, Serialize};

use crate::codec::{self, DecodeOptions, EncodeOptions, DEFAULT_DEPTH};
use crate::types::{Error, Result};

/// Env var overriding [`CodecConfig::depth`].
pub const ENV_JSON_DEPTH: &str = "JSEND_JSON_DEPTH";
/// Env var overriding [`CodecConfig::pretty`] (`1`/`true`).
pub const ENV_JSON_PRETTY: &str = "JSEND_JSON_PRETTY";
/// Env var overriding [`ObservabilityConfig::log_level`].
pub const ENV_LOG_LEVEL: &str = "JSEND_LOG_LEVEL";
/// Env var switching to JSON logs when set to `json`.
pub const ENV_LOG_FORMAT: &str = "JSEND_LOG_FORMAT";

/// Global configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON codec defaults.
    #[serde(default)]
    pub codec: CodecConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Parse a JSON configuration document; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        codec::decode_as(json, &DecodeOptions::default())
            .map_err(|err| Error::config(format!("invalid configuration: {err}")))
    }

    /// Defaults with `JSEND_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`; unparsable values are logged and ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_JSON_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(depth) => self.codec.depth = depth,
                Err(err) => tracing::warn!(var = ENV_JSON_DEPTH, value = %raw, error = %err, "config_override_ignored"),
            }
        }
        if let Some(raw) = lookup(ENV_JSON_PRETTY) {
            self.codec.pretty = is_truthy(&raw);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.observability.json_logs = format.eq_ignore_ascii_case("json");
        }
        self
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// JSON codec defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum container nesting for encode and decode.
    pub depth: usize,

    /// Indent rendered documents.
    pub pretty: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            pretty: false,
        }
    }
}

impl CodecConfig {
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            depth: self.depth,
            pretty: self.pretty,
        }
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions { depth: self.depth }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
