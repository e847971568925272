//! The dispatch loop: provider round trips with tool-call resolution.
//!
//! Sends the conversation to the provider, resolves any requested tool calls
//! (document extraction first, then cache, then live invocation), feeds the
//! results back as a continuation, and repeats until the provider answers
//! with plain text or the iteration cap is hit.

pub mod aggregate;
pub mod usage;

pub use usage::{UsageLedger, UsageSnapshot};

use crate::coerce::SchemaContract;
use crate::config::BridgeConfig;
use crate::model::{
    ModelError, Provider, ProviderInput, ProviderRequest, RequestParams, ToolCallRequest,
    ToolCallResult, Turn,
};
use crate::tools::{ToolExecutor, augment};
use cache::{TieredCache, canonical_key};
use extract::DocumentExtractor;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// How one dispatch run ended.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Final plain text; empty when the run was capped or cancelled before
    /// the provider produced any.
    pub text: String,
    /// Last continuation handle, for session reuse by a follow-up request.
    pub continuation: Option<String>,
    pub iterations: u32,
    pub tool_calls: u64,
    /// The iteration cap was reached with tool calls still pending.
    pub capped: bool,
    pub cancelled: bool,
}

/// Cache payload wire form for a tool result body.
#[derive(Debug, Serialize, Deserialize)]
struct CachedPayload {
    text: String,
    is_error: bool,
}

/// A provider session carried over from a previous run.
///
/// The handle already covers the first `sent_turns` turns of the
/// conversation server-side, so only the turns after that index are sent
/// alongside it.
#[derive(Debug, Clone)]
pub(crate) struct Resume {
    pub handle: String,
    pub sent_turns: usize,
}

/// One dispatch invocation's collaborators. State lives in locals of
/// [`DispatchLoop::run`]; this struct is freely reusable across runs.
pub(crate) struct DispatchLoop<'a> {
    provider: &'a dyn Provider,
    executor: &'a dyn ToolExecutor,
    /// `None` disables caching entirely.
    cache: Option<&'a TieredCache>,
    extractor: Option<&'a DocumentExtractor>,
    ledger: &'a UsageLedger,
    config: &'a BridgeConfig,
}

impl<'a> DispatchLoop<'a> {
    pub(crate) fn new(
        provider: &'a dyn Provider,
        executor: &'a dyn ToolExecutor,
        cache: Option<&'a TieredCache>,
        extractor: Option<&'a DocumentExtractor>,
        ledger: &'a UsageLedger,
        config: &'a BridgeConfig,
    ) -> Self {
        Self {
            provider,
            executor,
            cache,
            extractor,
            ledger,
            config,
        }
    }

    /// Run until plain text, the iteration cap, or cancellation.
    ///
    /// Tool-result turns and the final assistant turn are appended to
    /// `turns`. A capped or cancelled run is a soft outcome carrying whatever
    /// text was last seen, not an error.
    pub(crate) async fn run(
        &self,
        turns: &mut Vec<Turn>,
        params: &RequestParams,
        schema: Option<&SchemaContract>,
        resume: Option<Resume>,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome, ModelError> {
        // Correlates log lines across concurrent dispatch runs.
        let run_id = Uuid::new_v4();
        let (mut continuation, sent) = match resume {
            Some(resume) => (Some(resume.handle), resume.sent_turns.min(turns.len())),
            None => (None, 0),
        };
        let mut pending: Option<Vec<ToolCallResult>> = None;
        let mut last_text = String::new();
        let mut iterations = 0u32;
        let mut tool_calls = 0u64;

        loop {
            // Cancellation is polled between iterations only; an in-flight
            // provider round trip is allowed to finish.
            if cancel.is_cancelled() {
                debug!(%run_id, iterations, "dispatch cancelled");
                return Ok(DispatchOutcome {
                    text: last_text,
                    continuation,
                    iterations,
                    tool_calls,
                    capped: false,
                    cancelled: true,
                });
            }
            if iterations >= self.config.max_iterations {
                warn!(%run_id, iterations, "dispatch iteration cap reached");
                return Ok(DispatchOutcome {
                    text: last_text,
                    continuation,
                    iterations,
                    tool_calls,
                    capped: true,
                    cancelled: false,
                });
            }
            iterations += 1;

            let request = ProviderRequest {
                input: match &pending {
                    Some(results) => ProviderInput::ToolResults(results),
                    None => ProviderInput::Turns(&turns[sent..]),
                },
                tools: self.executor.specs(),
                schema,
                params,
                continuation: continuation.as_deref(),
            };
            let response = self.provider.respond(request).await?;
            if response.continuation.is_some() {
                continuation = response.continuation;
            }
            if !response.text.is_empty() {
                last_text = response.text.clone();
            }

            let calls = aggregate::unpack_aggregates(response.tool_calls);
            if calls.is_empty() {
                debug!(
                    %run_id,
                    origin = %self.config.origin,
                    iterations,
                    tool_calls,
                    "dispatch complete",
                );
                turns.push(Turn::assistant(response.text.clone()));
                return Ok(DispatchOutcome {
                    text: response.text,
                    continuation,
                    iterations,
                    tool_calls,
                    capped: false,
                    cancelled: false,
                });
            }

            debug!(%run_id, iteration = iterations, calls = calls.len(), "resolving tool calls");
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                results.push(self.resolve(call).await);
            }
            tool_calls += results.len() as u64;
            turns.push(Turn::tool_results(results.clone()));
            pending = Some(results);
        }
    }

    /// Resolve one tool call: document extraction, then cache, then live
    /// invocation. A failing invocation becomes an error-flagged result,
    /// never an aborted loop.
    async fn resolve(&self, mut call: ToolCallRequest) -> ToolCallResult {
        augment::augment_fetch_args(
            &call.name,
            &mut call.arguments,
            self.executor.specs(),
            self.config.min_fetch_length,
        );

        if let Some(extractor) = self.extractor {
            let url = augment::url_argument(&call.arguments).map(str::to_string);
            if let Some(url) = url {
                if augment::is_fetch_tool(&call.name) && extract::looks_like_document(&url) {
                    if let Some(text) = extractor.extract(&url).await {
                        self.ledger.record(&call.name, "extract");
                        return ToolCallResult::success(call.id, text)
                            .with_source("document-extract");
                    }
                    debug!(%url, "document extraction failed, falling back to tool");
                }
            }
        }

        let key = canonical_key(&call.name, &call.arguments);
        if let Some(cache) = self.cache {
            if let Some(raw) = cache.get(&key).await {
                if let Ok(hit) = serde_json::from_str::<CachedPayload>(&raw) {
                    self.ledger.record(&call.name, "cache");
                    return ToolCallResult {
                        id: call.id,
                        text: hit.text,
                        is_error: hit.is_error,
                        source: Some("cache".into()),
                    };
                }
                debug!(%key, "discarding undecodable cache payload");
            }
        }

        self.ledger.record(&call.name, "live");
        match self.executor.invoke(&call.name, &call.arguments).await {
            Ok(invocation) => {
                if !invocation.is_error {
                    if let Some(cache) = self.cache {
                        let payload = CachedPayload {
                            text: invocation.text.clone(),
                            is_error: false,
                        };
                        match serde_json::to_string(&payload) {
                            Ok(raw) => cache.set(&key, &raw, None).await,
                            Err(err) => debug!(%key, %err, "skipping cache write"),
                        }
                    }
                }
                if invocation.is_error {
                    ToolCallResult::error(call.id, invocation.text)
                } else {
                    ToolCallResult::success(call.id, invocation.text)
                }
            }
            Err(err) => {
                warn!(tool = %call.name, %err, "tool invocation failed");
                ToolCallResult::error(call.id, err.to_string())
            }
        }
    }
}
