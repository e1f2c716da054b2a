//! Pipeline configuration.
//!
//! One flat struct with conservative defaults; everything that tunes the
//! validation loop or the worker pool lives here so tests can tighten it.

use serde::Serialize;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    "cardioscribe=info".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Hard cap on validate → revise rounds per job.
    pub max_iterations: u32,
    /// Per-request timeout for the external critique service, seconds.
    pub critique_timeout_secs: u64,
    /// Extra attempts after a retryable critique failure.
    pub critique_retries: u32,
    /// Worker threads draining the job queue.
    pub worker_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            max_iterations: 5,
            critique_timeout_secs: 60,
            critique_retries: 2,
            worker_count: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_bounded() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_iterations, 5);
        assert!(config.worker_count >= 1);
        assert!(config.critique_timeout_secs > 0);
    }

    #[test]
    fn config_serializes() {
        let json = serde_json::to_string(&PipelineConfig::default()).unwrap();
        assert!(json.contains("\"max_iterations\":5"));
    }
}
