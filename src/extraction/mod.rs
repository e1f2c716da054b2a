pub mod certainty;
pub mod history;
pub mod templated;
pub mod types;

pub use types::*;

use thiserror::Error;

/// Extraction-level failures.
///
/// These are always recovered locally: a candidate that cannot be grounded
/// is logged and discarded, never surfaced as a job failure.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("candidate for '{field}' cites span {start}..{end} that does not resolve in the transcript")]
    MalformedSpan {
        field: String,
        start: usize,
        end: usize,
    },
}
