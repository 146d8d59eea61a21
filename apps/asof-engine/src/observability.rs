//! Logging subscriber setup and join metrics.
//!
//! Metrics go through the `metrics` facade; with no recorder installed they
//! are no-ops, so library users opt in by installing their own exporter.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `asof_join_runs_total` | counter | `mode` |
//! | `asof_join_primary_events_total` | counter | `mode` |
//! | `asof_join_emitted_records_total` | counter | `mode` |
//! | `asof_join_unmatched_total` | counter | `mode` |
//! | `asof_join_resorted_sequences_total` | counter | - |
//! | `asof_join_duration_seconds` | histogram | `mode` |
//! | `asof_join_match_rate` | gauge | `mode` |

use metrics::{counter, gauge, histogram};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;
use crate::join::{JoinMode, JoinStats};

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// The configured level is not a valid filter directive.
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber is already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    AlreadyInstalled(String),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `asof_engine=<level>` is used.
///
/// # Errors
///
/// Returns an error if the directive does not parse or a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ObservabilityError> {
    let directive = format!("asof_engine={}", config.level.to_ascii_lowercase());
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&directive).map_err(|e| ObservabilityError::InvalidFilter {
            filter: directive.clone(),
            message: e.to_string(),
        })?,
    };

    let span_events = if config.include_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_writer(std::io::stderr);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };

    installed.map_err(|e| ObservabilityError::AlreadyInstalled(e.to_string()))
}

/// Record the counters of one finished join.
pub fn record_join_metrics(stats: &JoinStats, mode: JoinMode) {
    let mode = mode.as_str();

    counter!("asof_join_runs_total", "mode" => mode).increment(1);
    counter!("asof_join_primary_events_total", "mode" => mode).increment(stats.primary_events);
    counter!("asof_join_emitted_records_total", "mode" => mode).increment(stats.emitted);
    counter!("asof_join_unmatched_total", "mode" => mode).increment(stats.unmatched);
    counter!("asof_join_resorted_sequences_total").increment(stats.resorted_sequences);
    histogram!("asof_join_duration_seconds", "mode" => mode)
        .record(stats.elapsed_ms as f64 / 1000.0);
    gauge!("asof_join_match_rate", "mode" => mode).set(stats.match_rate());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected_when_rust_log_unset() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "verbose".to_string(),
            ..LoggingConfig::default()
        };

        let result = init_logging(&config);

        assert!(matches!(result, Err(ObservabilityError::InvalidFilter { .. })));
    }

    #[test]
    fn test_record_metrics_without_recorder_is_noop() {
        let stats = JoinStats {
            primary_events: 3,
            matched: 2,
            unmatched: 1,
            emitted: 2,
            ..JoinStats::default()
        };

        record_join_metrics(&stats, JoinMode::Inner);
    }
}
