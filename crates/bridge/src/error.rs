use crate::coerce::CoerceError;
use crate::config::ConfigError;
use crate::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Coerce(#[from] CoerceError),

    /// The wall-clock budget for the whole logical operation elapsed.
    ///
    /// Distinct from the iteration cap, which is a soft outcome. Callers
    /// should not retry automatically: the operation may have partially
    /// mutated external state such as a written artifact.
    #[error("operation timed out after {budget_secs}s")]
    Timeout { budget_secs: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
