//! Skiff bridge — robust request/response bridging to an LLM provider.
//!
//! The bridge turns one logical "ask the model to do X, possibly using
//! tools, and return data matching schema Y" operation into a sequence of
//! provider calls, tool executions, caching decisions, and output-repair
//! attempts. It stays correct even though the remote model is
//! non-deterministic, occasionally violates the requested output contract,
//! and may request tool invocations in non-standard shapes.
//!
//! # Overview
//!
//! - **Dispatch loop**: sends a conversation to the provider, resolves tool
//!   calls through cache-or-execute (with a PDF-aware fetch shortcut), and
//!   repeats until the model answers in plain text or the iteration cap.
//! - **Structured output coercion**: parse, heuristic extraction,
//!   shape-aware normalization, one reprompt, and last-resort defaults —
//!   every returned object has passed schema validation.
//! - **Completion monitor**: a concurrent watcher that ends a long
//!   operation as soon as its expected artifact appears.
//!
//! # Example
//!
//! ```ignore
//! use bridge::{Bridge, BridgeConfig, RequestParams, Turn};
//!
//! # async fn example(provider: std::sync::Arc<dyn bridge::Provider>,
//! #                  executor: std::sync::Arc<dyn bridge::ToolExecutor>) -> bridge::Result<()> {
//! let bridge = Bridge::builder(provider, executor)
//!     .config(BridgeConfig::default())
//!     .build()
//!     .await;
//!
//! let mut turns = vec![Turn::user("what is X?")];
//! let text = bridge.generate_text(&mut turns, &RequestParams::new("gpt-5")).await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

mod bridge;
mod config;
pub mod coerce;
pub mod dispatch;
mod error;
pub mod model;
pub mod monitor;
pub mod providers;
pub mod tools;

pub use bridge::{Bridge, BridgeBuilder, EarlyStopOutcome};
pub use config::{BridgeConfig, ConfigError};
pub use error::{Error, Result};

pub use coerce::{CoerceError, FieldContract, FieldType, SchemaContract, Shape};
pub use dispatch::{DispatchOutcome, UsageLedger, UsageSnapshot};
pub use model::{
    ModelError, Provider, ProviderInput, ProviderRequest, ProviderResponse, RequestParams, Role,
    ToolCallRequest, ToolCallResult, ToolSpec, Turn, ensure_developer_first,
};
pub use monitor::{ArtifactStore, CompletionMonitor, FsArtifacts};
pub use providers::{ResponsesBackend, ResponsesBackendBuilder};
pub use tools::{Invocation, ToolError, ToolExecutor};
