use thiserror::Error;

/// Errors from structured output coercion.
#[derive(Debug, Error)]
pub enum CoerceError {
    /// A candidate object did not satisfy the schema contract.
    #[error("schema validation failed: {0}")]
    Invalid(String),

    /// Every stage failed and no last-resort default exists for the shape.
    /// The only coercion outcome that reaches the caller as an error.
    #[error("structured output coercion failed after retry")]
    Unrecoverable,
}
