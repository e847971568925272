//! Provider-agnostic conversation types and the provider trait.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::{
    Provider, ProviderInput, ProviderRequest, ProviderResponse, RequestParams, Role,
    ToolCallRequest, ToolCallResult, ToolSpec, Turn, ensure_developer_first,
};
