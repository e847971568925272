//! Tool executor trait.

use super::ToolError;
use crate::model::ToolSpec;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Output of one tool invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub text: String,
    pub is_error: bool,
}

/// Trait for tool execution hosts, owned by the agent framework.
///
/// This is the boundary between the dispatch loop and side effects. The
/// bridge tolerates arbitrary latency and occasional errors from `invoke`.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// The tool catalogue advertised to the model.
    fn specs(&self) -> &[ToolSpec];

    /// Invoke a named tool with arguments.
    async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<Invocation, ToolError>;
}
