//! The caller-facing bridge facade.

use crate::coerce::{self, SchemaContract};
use crate::config::BridgeConfig;
use crate::dispatch::{DispatchLoop, Resume, UsageLedger, UsageSnapshot};
use crate::error::{Error, Result};
use crate::model::{Provider, RequestParams, Role, Turn};
use crate::monitor::{CompletionMonitor, FsArtifacts};
use crate::tools::ToolExecutor;
use cache::{RedisTier, RemoteTier, TieredCache};
use extract::DocumentExtractor;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Builder for a [`Bridge`].
pub struct BridgeBuilder {
    provider: Arc<dyn Provider>,
    executor: Arc<dyn ToolExecutor>,
    config: BridgeConfig,
}

impl BridgeBuilder {
    pub fn new(provider: Arc<dyn Provider>, executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            provider,
            executor,
            config: BridgeConfig::default(),
        }
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the bridge. Async because the remote cache tier connects here;
    /// an unreachable Redis degrades to the local tier with a warning.
    pub async fn build(self) -> Bridge {
        let config = self.config;
        let cache = if config.cache_enabled {
            let remote: Option<Box<dyn RemoteTier>> = match &config.redis_url {
                Some(url) => RedisTier::connect(url, config.cache_prefix.clone())
                    .await
                    .map(|tier| Box::new(tier) as Box<dyn RemoteTier>),
                None => None,
            };
            Some(TieredCache::new(
                remote,
                Some(Duration::from_secs(config.cache_ttl_seconds)),
            ))
        } else {
            None
        };
        let extractor = config.extract_enabled.then(|| {
            DocumentExtractor::builder()
                .max_bytes(config.extract_max_bytes)
                .max_chars(config.extract_max_chars)
                .build()
        });
        Bridge {
            provider: self.provider,
            executor: self.executor,
            cache,
            extractor,
            ledger: UsageLedger::new(),
            config,
        }
    }
}

/// How an early-stop run ended.
#[derive(Debug, Clone)]
pub struct EarlyStopOutcome {
    /// The artifact was observed before the dispatch converged on its own.
    pub early: bool,
    pub text: String,
}

/// Bridges a caller's conversation to a model provider, resolving tool calls
/// through the cache and extractor along the way.
pub struct Bridge {
    provider: Arc<dyn Provider>,
    executor: Arc<dyn ToolExecutor>,
    cache: Option<TieredCache>,
    extractor: Option<DocumentExtractor>,
    ledger: UsageLedger,
    config: BridgeConfig,
}

impl Bridge {
    pub fn builder(provider: Arc<dyn Provider>, executor: Arc<dyn ToolExecutor>) -> BridgeBuilder {
        BridgeBuilder::new(provider, executor)
    }

    fn dispatch(&self) -> DispatchLoop<'_> {
        DispatchLoop::new(
            self.provider.as_ref(),
            self.executor.as_ref(),
            self.cache.as_ref(),
            self.extractor.as_ref(),
            &self.ledger,
            &self.config,
        )
    }

    pub fn usage(&self) -> UsageSnapshot {
        self.ledger.snapshot()
    }

    pub fn reset_usage(&self) {
        self.ledger.reset();
    }

    /// Run the dispatch loop to plain text.
    ///
    /// Tool-result and assistant turns are appended to `turns`. A capped run
    /// yields whatever text was last seen, possibly empty.
    pub async fn generate_text(
        &self,
        turns: &mut Vec<Turn>,
        params: &RequestParams,
    ) -> Result<String> {
        let cancel = CancellationToken::new();
        let outcome = self
            .dispatch()
            .run(turns, params, None, None, &cancel)
            .await?;
        Ok(outcome.text)
    }

    /// Run the dispatch loop and coerce the answer into `schema`.
    ///
    /// On a failed first pass, exactly one corrective reprompt is sent,
    /// reusing the provider session via the continuation handle. If that
    /// also fails, the shape's last-resort default is returned; only shapes
    /// without one surface an error.
    pub async fn generate_structured(
        &self,
        turns: &mut Vec<Turn>,
        schema: &SchemaContract,
        params: &RequestParams,
    ) -> Result<Value> {
        let cancel = CancellationToken::new();
        let outcome = self
            .dispatch()
            .run(turns, params, Some(schema), None, &cancel)
            .await?;
        if let Some(value) = coerce::attempt(&outcome.text, schema) {
            return Ok(value);
        }

        let task = turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.text().to_string())
            .unwrap_or_else(|| "Produce the requested JSON object.".into());
        info!(schema = %schema.name, "first coercion pass failed, reprompting");
        // The provider session already holds the conversation so far; only
        // the reprompt turn rides along with the handle.
        let sent = turns.len();
        turns.push(Turn::user(coerce::retry_prompt(&task, schema)));
        let resume = outcome.continuation.map(|handle| Resume {
            handle,
            sent_turns: sent,
        });
        let retry = self
            .dispatch()
            .run(turns, params, Some(schema), resume, &cancel)
            .await?;
        if let Some(value) = coerce::attempt_lenient(&retry.text, schema) {
            return Ok(value);
        }

        match coerce::last_resort(schema) {
            Some(value) => {
                warn!(schema = %schema.name, "returning last-resort default");
                Ok(value)
            }
            None => Err(Error::Coerce(coerce::CoerceError::Unrecoverable)),
        }
    }

    /// Run the dispatch loop while watching for `artifact` to appear.
    ///
    /// Returns as soon as the artifact passes `valid`, abandoning the still
    /// running dispatch (the artifact is the deliverable, so `text` is empty
    /// in that case), or when the dispatch finishes on its own. The whole
    /// operation is bounded by the configured wall-clock budget; exceeding it
    /// is a [`Error::Timeout`], distinct from the iteration cap.
    pub async fn run_with_early_stop<F>(
        &self,
        turns: &mut Vec<Turn>,
        params: &RequestParams,
        artifact: &Path,
        valid: F,
    ) -> Result<EarlyStopOutcome>
    where
        F: Fn(&[u8]) -> bool + Send + Sync,
    {
        let budget = Duration::from_secs(self.config.operation_timeout_seconds);
        let monitor = CompletionMonitor::new(
            Duration::from_millis(self.config.monitor_interval_ms),
            self.config.monitor_min_bytes,
        );
        let cancel = CancellationToken::new();

        let loop_ = self.dispatch();
        let dispatch = loop_.run(turns, params, None, None, &cancel);
        let watch = monitor.watch(&FsArtifacts, artifact, valid, budget, &cancel);
        tokio::pin!(dispatch);
        tokio::pin!(watch);

        tokio::time::timeout(budget, async {
            tokio::select! {
                outcome = &mut dispatch => {
                    // Natural completion releases the monitor.
                    cancel.cancel();
                    Ok(EarlyStopOutcome {
                        early: false,
                        text: outcome?.text,
                    })
                }
                seen = &mut watch => {
                    if seen {
                        Ok(EarlyStopOutcome {
                            early: true,
                            text: String::new(),
                        })
                    } else {
                        // The watch gave up; let the dispatch run out the
                        // remaining budget.
                        let outcome = (&mut dispatch).await?;
                        Ok(EarlyStopOutcome {
                            early: false,
                            text: outcome.text,
                        })
                    }
                }
            }
        })
        .await
        .map_err(|_| Error::Timeout {
            budget_secs: self.config.operation_timeout_seconds,
        })?
    }
}
