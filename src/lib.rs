//! Cardioscribe: structured reports from free-form cardiology dictation.
//!
//! The pipeline segments a dictated transcript into span-indexed statements,
//! extracts typed facts that must cite their source text, validates drafts
//! through an external critique service with local grounding checks, and
//! assembles a deterministic Dutch report in which everything not dictated
//! is explicitly marked rather than invented.

pub mod config;
pub mod confidence;
pub mod extraction;
pub mod job;
pub mod report;
pub mod template;
pub mod transcript;
pub mod validation;

use tracing_subscriber::EnvFilter;

/// Initializes structured logging. `RUST_LOG` wins over the built-in
/// default; calling twice is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
