//! Worker pool configuration.

use serde::{Deserialize, Serialize};

/// How groups are dispatched to worker threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Maximum number of threads to use (0 = rayon's global pool).
    pub max_threads: usize,

    /// Minimum group count for parallel dispatch (fewer groups run sequentially).
    pub min_parallel_groups: usize,

    /// Whether to log per-group progress at DEBUG.
    pub track_progress: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            min_parallel_groups: 2,
            track_progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_config_default() {
        let config = ParallelConfig::default();

        assert_eq!(config.max_threads, 0);
        assert_eq!(config.min_parallel_groups, 2);
        assert!(config.track_progress);
    }
}
