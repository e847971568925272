use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// The dispatch loop folds every variant into an error-flagged tool result;
/// `ToolExecutor` implementations pick whichever fits their failure.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ToolError {
    /// The requested tool is not in the executor's catalogue.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// The arguments did not match the tool's schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The tool ran out of its own time budget.
    #[error("timeout after {0}ms")]
    Timeout(u64),
    /// The tool ran and failed.
    #[error("execution failed: {0}")]
    Execution(String),
}
