pub mod assembler;
pub mod audit;

pub use assembler::*;
pub use audit::*;
