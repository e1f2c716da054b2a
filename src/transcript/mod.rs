pub mod segmenter;
pub mod types;

pub use segmenter::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("transcript is empty or contains no readable text")]
    EmptyTranscript,
}
