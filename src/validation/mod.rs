pub mod critique;
pub mod hallucination;
pub mod orchestrator;

pub use critique::*;
pub use hallucination::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::transcript::SegmentationError;

/// Failures that end a job.
///
/// Timeouts of the critique service are deliberately absent: those degrade
/// to local-only validation instead of failing the job.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error("fact '{field}' cites span {start}..{end} outside the transcript")]
    SpanOutOfBounds {
        field: String,
        start: usize,
        end: usize,
    },

    #[error("critique service unavailable: {0}")]
    CritiqueUnavailable(#[from] critique::CritiqueError),

    #[error("job cancelled")]
    Cancelled,
}
