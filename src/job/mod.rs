pub mod store;
pub mod types;
pub mod worker;

pub use store::*;
pub use types::*;
pub use worker::*;

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {0} already reached a terminal state")]
    AlreadyTerminal(Uuid),
}
