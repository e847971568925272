//! Core conversation types (provider-agnostic).
//!
//! These represent the universal concepts shared across model providers.
//! Provider-specific wire details belong in backend modules.

use super::errors::ModelError;
use crate::coerce::SchemaContract;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Instruction turn; at most one, always first if present.
    Developer,
    User,
    Assistant,
    /// Carries tool outputs back to the model, keyed by call id.
    ToolResult,
}

/// A tool call requested by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque provider-issued identifier, consumed exactly once.
    pub id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// The outcome fed back into the conversation for one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Matches the originating [`ToolCallRequest`] id.
    pub id: String,
    pub text: String,
    pub is_error: bool,
    /// Provenance tag, e.g. "document-extract" or "cache".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ToolCallResult {
    pub fn success(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_error: false,
            source: None,
        }
    }

    pub fn error(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_error: true,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A turn in the conversation. Owned by the caller; the bridge only appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolCallResult>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: Some(text.into()),
            tool_results: Vec::new(),
        }
    }

    pub fn developer(text: impl Into<String>) -> Self {
        Self::new(Role::Developer, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// A turn carrying tool outputs back to the model.
    pub fn tool_results(results: Vec<ToolCallResult>) -> Self {
        Self {
            role: Role::ToolResult,
            text: None,
            tool_results: results,
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Insert a developer instruction at the front unless one is already present.
pub fn ensure_developer_first(turns: &mut Vec<Turn>, instruction: &str) {
    if !turns.iter().any(|t| t.role == Role::Developer) {
        turns.insert(0, Turn::developer(instruction));
    }
}

/// A tool definition exposed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for input parameters.
    pub schema: Value,
}

/// Per-request knobs.
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub model: String,
    pub max_output_tokens: Option<u32>,
    pub reasoning_effort: Option<String>,
}

impl RequestParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_output_tokens: None,
            reasoning_effort: None,
        }
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn reasoning_effort(mut self, effort: impl Into<String>) -> Self {
        self.reasoning_effort = Some(effort.into());
        self
    }
}

/// What the provider receives: either the conversation (first call of a
/// dispatch) or only the new tool results when continuing a prior response.
#[derive(Debug, Clone)]
pub enum ProviderInput<'a> {
    Turns(&'a [Turn]),
    ToolResults(&'a [ToolCallResult]),
}

/// Everything needed for one provider round trip.
#[derive(Debug, Clone)]
pub struct ProviderRequest<'a> {
    pub input: ProviderInput<'a>,
    pub tools: &'a [ToolSpec],
    pub schema: Option<&'a SchemaContract>,
    pub params: &'a RequestParams,
    /// Opaque handle from a prior response, extending that session without
    /// resending earlier turns.
    pub continuation: Option<&'a str>,
}

/// The provider's answer: plain text, tool-call requests, or both.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub continuation: Option<String>,
}

/// Trait for model provider backends.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn respond(&self, request: ProviderRequest<'_>) -> Result<ProviderResponse, ModelError>;
}
