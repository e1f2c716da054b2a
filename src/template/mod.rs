pub mod catalog;
pub mod resolver;

pub use catalog::*;
pub use resolver::*;

use thiserror::Error;

/// Template resolution failures. `NoMatch` is always handled by falling back
/// to the generic template; it never fails a job.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("no investigation template matched the transcript")]
    NoMatch,
}
