//! Configuration for the as-of join.
//!
//! The join itself exposes two flags, `join_mode` and `order`; the rest
//! tunes tie-breaking, sortedness checks, the worker pool and logging.
//!
//! # Usage
//!
//! ```rust,ignore
//! use asof_engine::config::{JoinConfig, load_config};
//!
//! // Load from default path (asof.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/asof.yaml"))?;
//! ```
//!
//! ```yaml
//! join_mode: ${ASOF_JOIN_MODE:-inner}
//! order: by_group_then_time
//! reference_tie_break: last_inserted
//! assume_sorted: false
//! parallel:
//!   max_threads: 0
//!   min_parallel_groups: 2
//! observability:
//!   logging:
//!     level: info
//!     format: json
//! ```

mod observability;
mod parallel;

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorCode;
use crate::join::{JoinMode, OutputOrder, ReferenceTieBreak};

pub use observability::{LoggingConfig, ObservabilityConfig};
pub use parallel::ParallelConfig;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "asof.yaml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["json", "pretty", "compact"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ReadError { .. } => ErrorCode::Io,
            Self::ParseError(_) | Self::ValidationError(_) => ErrorCode::InvalidConfig,
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Inner drops unmatched primary events; outer keeps them.
    #[serde(default)]
    pub join_mode: JoinMode,
    /// Output ordering.
    #[serde(default)]
    pub order: OutputOrder,
    /// Winner among reference events sharing the best timestamp.
    #[serde(default)]
    pub reference_tie_break: ReferenceTieBreak,
    /// Verify input order instead of always sorting.
    #[serde(default)]
    pub assume_sorted: bool,
    /// Worker pool configuration.
    #[serde(default)]
    pub parallel: ParallelConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "asof.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<JoinConfig, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<JoinConfig, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);

    // An empty document means "all defaults"
    let config: JoinConfig = if interpolated.trim().is_empty() {
        JoinConfig::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };

    validate_config(&config)?;
    Ok(config)
}

fn env_var_regex() -> &'static Regex {
    static ENV_VAR_REGEX: OnceLock<Regex> = OnceLock::new();

    ENV_VAR_REGEX.get_or_init(|| {
        #[allow(clippy::expect_used)] // pattern is a literal
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("env var regex is valid")
    })
}

/// Replace `${VAR}` and `${VAR:-default}` with environment values.
///
/// An unset or empty variable falls back to its default, or to the empty
/// string when none is given.
fn interpolate_env_vars(input: &str) -> String {
    env_var_regex()
        .replace_all(input, |caps: &Captures<'_>| {
            let fallback = caps.get(2).map_or("", |m| m.as_str());
            match std::env::var(&caps[1]) {
                Ok(value) if !value.is_empty() => value,
                _ => fallback.to_string(),
            }
        })
        .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &JoinConfig) -> Result<(), ConfigError> {
    let logging = &config.observability.logging;

    if !LOG_LEVELS.contains(&logging.level.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.level must be one of: {LOG_LEVELS:?}"
        )));
    }

    if !LOG_FORMATS.contains(&logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {LOG_FORMATS:?}"
        )));
    }

    if config.parallel.min_parallel_groups == 0 {
        return Err(ConfigError::ValidationError(
            "parallel.min_parallel_groups must be at least 1".to_string(),
        ));
    }

    Ok(())
}
