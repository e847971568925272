//! Tool execution seam and argument shaping.

pub mod augment;
pub mod errors;
mod executor;

pub use augment::augment_fetch_args;
pub use errors::ToolError;
pub use executor::{Invocation, ToolExecutor};
