//! Invocation engine: guards, validates, authorizes, deduplicates, times,
//! executes, recovers and audits a single tool call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use relay_types::{ExecutionStatus, Outcome, RelayEvent};

use crate::cache::{dedup_key, DedupCache};
use crate::context::{ChainContext, EntryDraft};
use crate::digest::{hash_input, render_value, summarize_output};
use crate::error::RuntimeError;
use crate::executor::{run_with_deadline, Settled};
use crate::handler::{Registry, ToolContext};
use crate::metrics::ExecutionMetrics;
use crate::options::InvokeOptions;
use crate::runtime_config::{DedupScope, RuntimeConfig};

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of one attempt, before auditing.
struct Attempt {
    result: Result<Outcome, RuntimeError>,
    duration: Duration,
    /// Original failure when `on_error` supplied the result.
    recovered_from: Option<RuntimeError>,
}

struct Inner {
    registry: Arc<Registry>,
    config: RuntimeConfig,
    metrics: Arc<ExecutionMetrics>,
    process_dedup: DedupCache,
    events: broadcast::Sender<RelayEvent>,
}

/// Entry point for tool calls. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ToolOrchestrator {
    inner: Arc<Inner>,
}

impl ToolOrchestrator {
    /// Creates an orchestrator over a fully built registry.
    pub fn new(registry: Registry, config: RuntimeConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                registry: Arc::new(registry),
                config,
                metrics: ExecutionMetrics::new_shared(),
                process_dedup: DedupCache::new(),
                events,
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Returns a shared handle to the live counters.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    /// Subscribes to invocation events.
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.inner.events.subscribe()
    }

    /// Creates a root chain context using the configured chain defaults.
    pub fn root_context(&self, correlation_id: Option<String>) -> ChainContext {
        ChainContext::root(correlation_id, &self.inner.config.chain)
    }

    /// Invokes `name` with `args`, optionally inside a chain.
    ///
    /// # Errors
    /// `RecursionDepth` and `ChainTimeout` are returned before anything
    /// runs and bypass `on_error`. Lookup, validation, authorization,
    /// timeout and raised handler failures are returned unless `on_error`
    /// recovers them. A handler's own `success: false` outcome is `Ok`.
    #[tracing::instrument(
        name = "invoke",
        skip_all,
        fields(
            tool = %name,
            correlation_id = context.map(ChainContext::correlation_id),
            depth = context.map(ChainContext::depth),
        )
    )]
    pub async fn invoke(
        &self,
        name: &str,
        args: Value,
        context: Option<&ChainContext>,
        options: InvokeOptions,
    ) -> Result<Outcome, RuntimeError> {
        let input_hash = hash_input(&args);

        if let Some(ctx) = context {
            if let Err(e) = check_guards(ctx) {
                self.reject(name, &input_hash, ctx, &e);
                return Err(e);
            }
        }
        self.inner.metrics.record_invocation();
        self.emit(RelayEvent::started(
            name,
            context.map(|c| c.correlation_id().to_string()),
            context.map_or(0, ChainContext::depth),
        ));

        let timeout = self.effective_timeout(context, &options);

        if options.deduplicate {
            if let Some(cache) = self.dedup_cache_for(context) {
                return self
                    .invoke_deduplicated(cache, name, args, &input_hash, context, &options, timeout)
                    .await;
            }
            debug!("chain-scoped dedup without a chain, executing directly");
        }

        let attempt = self.attempt(name, args, context, &options, timeout).await;
        self.settle(name, &input_hash, context, attempt)
    }

    /// Runs the call through the dedup slot for its key.
    ///
    /// The caller that initializes the slot executes the tool under its own
    /// deadline. Every other caller waits on the shared slot, but never past
    /// its own effective timeout; giving up leaves the slot to the executor.
    #[allow(clippy::too_many_arguments)]
    async fn invoke_deduplicated(
        &self,
        cache: &DedupCache,
        name: &str,
        args: Value,
        input_hash: &str,
        context: Option<&ChainContext>,
        options: &InvokeOptions,
        timeout: Duration,
    ) -> Result<Outcome, RuntimeError> {
        let key = dedup_key(name, input_hash);
        let slot = cache.acquire(&key, &self.inner.config.dedup);
        let ran = AtomicBool::new(false);
        let ran_ref = &ran;
        let start = Instant::now();

        let init = slot.get_or_init(|| async move {
            ran_ref.store(true, Ordering::Relaxed);
            let attempt = self.attempt(name, args, context, options, timeout).await;
            self.settle(name, input_hash, context, attempt)
        });
        tokio::pin!(init);

        let shared = tokio::select! {
            biased;
            shared = &mut init => shared.clone(),
            () = tokio::time::sleep(timeout) => {
                if ran.load(Ordering::Relaxed) {
                    // The executor is bounded by its own deadline.
                    init.await.clone()
                } else {
                    self.inner.metrics.record_timeout();
                    warn!(
                        %key,
                        timeout_ms = timeout.as_millis() as u64,
                        "gave up waiting on deduplicated call"
                    );
                    let timed_out = Err(RuntimeError::Timeout {
                        tool: name.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    });
                    let attempt = self.recover(name, timed_out, start.elapsed(), options).await;
                    return self.settle(name, input_hash, context, attempt);
                }
            }
        };

        if ran.load(Ordering::Relaxed) {
            cache.mark_settled(&key, &slot);
            return shared;
        }

        self.inner.metrics.record_dedup_hit();
        debug!(%key, "served from dedup cache");
        let (summary, details) = describe(&shared);
        match &shared {
            Ok(outcome) if outcome.success => self.inner.metrics.record_success(),
            _ => self.inner.metrics.record_failure(),
        }
        if let Some(ctx) = context {
            ctx.append_entry(EntryDraft {
                tool_name: name.to_string(),
                input_hash: input_hash.to_string(),
                output_summary: summary,
                duration_ms: 0,
                status: ExecutionStatus::Skipped,
                error_details: details,
            });
        }
        self.emit(RelayEvent::completed(
            name,
            context.map(|c| c.correlation_id().to_string()),
            ExecutionStatus::Skipped,
            0,
        ));
        shared
    }

    /// Lookup, validate, authorize, execute, then recover on failure.
    async fn attempt(
        &self,
        name: &str,
        args: Value,
        context: Option<&ChainContext>,
        options: &InvokeOptions,
        timeout: Duration,
    ) -> Attempt {
        let start = Instant::now();
        let result = self.execute(name, args, context, timeout).await;
        self.recover(name, result, start.elapsed(), options).await
    }

    /// Hands a non-fatal failure to `on_error`, if the call installed one.
    async fn recover(
        &self,
        name: &str,
        result: Result<Outcome, RuntimeError>,
        duration: Duration,
        options: &InvokeOptions,
    ) -> Attempt {
        match result {
            Err(e) if !e.is_fatal() => match &options.on_error {
                Some(on_error) => {
                    let recovered = match on_error(e.clone()).await {
                        Ok(outcome) => {
                            self.inner.metrics.record_recovery();
                            info!(tool = name, error = %e, "failure recovered");
                            Ok(outcome)
                        }
                        Err(recovery_err) => Err(RuntimeError::Recovery {
                            tool: name.to_string(),
                            message: recovery_err.message().to_string(),
                        }),
                    };
                    Attempt {
                        result: recovered,
                        duration,
                        recovered_from: Some(e),
                    }
                }
                None => Attempt {
                    result: Err(e),
                    duration,
                    recovered_from: None,
                },
            },
            result => Attempt {
                result,
                duration,
                recovered_from: None,
            },
        }
    }

    async fn execute(
        &self,
        name: &str,
        args: Value,
        context: Option<&ChainContext>,
        timeout: Duration,
    ) -> Result<Outcome, RuntimeError> {
        let tool = self
            .inner
            .registry
            .lookup(name)
            .map_err(|_| RuntimeError::ToolNotFound {
                name: name.to_string(),
            })?;
        let registration = &tool.registration;

        let args = registration
            .input_schema
            .validate(&args)
            .map_err(|e| RuntimeError::Validation {
                tool: name.to_string(),
                message: e.message,
            })?;

        let caller = context.and_then(ChainContext::parent_tool);
        if !registration.permits(caller) {
            return Err(RuntimeError::Unauthorized {
                tool: name.to_string(),
                caller: caller.map(ToString::to_string).unwrap_or_default(),
            });
        }

        let ctx = ToolContext::new(registration.name.clone(), context.cloned(), self.clone());
        let probe = ctx.clone();
        let settled = run_with_deadline(Arc::clone(&tool.handler), args, ctx, timeout).await;

        match settled {
            Settled::Completed(Ok(outcome)) => Ok(outcome),
            Settled::Completed(Err(tool_err)) => Err(probe.escalated().unwrap_or_else(|| {
                RuntimeError::Handler {
                    tool: name.to_string(),
                    message: tool_err.message().to_string(),
                }
            })),
            Settled::TimedOut => {
                self.inner.metrics.record_timeout();
                Err(RuntimeError::Timeout {
                    tool: name.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
            Settled::Crashed(message) => Err(RuntimeError::Handler {
                tool: name.to_string(),
                message,
            }),
        }
    }

    /// Records the audit entry, metrics and event for a finished attempt.
    fn settle(
        &self,
        name: &str,
        input_hash: &str,
        context: Option<&ChainContext>,
        attempt: Attempt,
    ) -> Result<Outcome, RuntimeError> {
        let duration_ms = attempt.duration.as_millis() as u64;
        let (summary, mut details) = describe(&attempt.result);
        let status = match &attempt.result {
            Ok(outcome) if outcome.success => ExecutionStatus::Success,
            _ => ExecutionStatus::Error,
        };
        if let Some(original) = &attempt.recovered_from {
            details.get_or_insert_with(|| original.to_string());
        }

        match status {
            ExecutionStatus::Success => self.inner.metrics.record_success(),
            _ => self.inner.metrics.record_failure(),
        }

        if let Some(ctx) = context {
            ctx.append_entry(EntryDraft {
                tool_name: name.to_string(),
                input_hash: input_hash.to_string(),
                output_summary: summary,
                duration_ms,
                status,
                error_details: details.clone(),
            });
        }

        match &details {
            Some(reason) if status == ExecutionStatus::Error => {
                warn!(tool = name, duration_ms, %reason, "invocation failed");
            }
            _ => info!(tool = name, duration_ms, status = ?status, "invocation complete"),
        }
        self.emit(RelayEvent::completed(
            name,
            context.map(|c| c.correlation_id().to_string()),
            status,
            duration_ms,
        ));
        attempt.result
    }

    /// Logs and reports a call refused by a fatal chain guard.
    fn reject(&self, name: &str, input_hash: &str, ctx: &ChainContext, err: &RuntimeError) {
        self.inner.metrics.record_fatal_rejection();
        warn!(tool = name, error = %err, "invocation rejected");
        let message = err.to_string();
        ctx.append_entry(EntryDraft {
            tool_name: name.to_string(),
            input_hash: input_hash.to_string(),
            output_summary: summarize_output(&message),
            duration_ms: 0,
            status: ExecutionStatus::Error,
            error_details: Some(message.clone()),
        });
        self.emit(RelayEvent::rejected(
            name,
            Some(ctx.correlation_id().to_string()),
            message,
        ));
    }

    /// Explicit option, else chain default, else configured default;
    /// never longer than what is left of the chain deadline.
    fn effective_timeout(
        &self,
        context: Option<&ChainContext>,
        options: &InvokeOptions,
    ) -> Duration {
        let base = options
            .timeout
            .or_else(|| context.map(ChainContext::timeout))
            .unwrap_or(self.inner.config.chain.timeout);
        match context.and_then(ChainContext::remaining_chain_time) {
            Some(remaining) => base.min(remaining),
            None => base,
        }
    }

    fn dedup_cache_for<'a>(&'a self, context: Option<&'a ChainContext>) -> Option<&'a DedupCache> {
        match self.inner.config.dedup.scope {
            DedupScope::Process => Some(&self.inner.process_dedup),
            DedupScope::Chain => context.map(ChainContext::dedup_cache),
        }
    }

    fn emit(&self, event: RelayEvent) {
        // Sending only fails when nobody is subscribed.
        let _ = self.inner.events.send(event);
    }
}

impl std::fmt::Debug for ToolOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolOrchestrator")
            .field("tools", &self.inner.registry.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Recursion guard first, then the chain deadline.
fn check_guards(ctx: &ChainContext) -> Result<(), RuntimeError> {
    if ctx.depth() >= ctx.max_depth() {
        return Err(RuntimeError::RecursionDepth {
            attempted_depth: ctx.depth(),
            max_depth: ctx.max_depth(),
            snapshot: ctx.snapshot(),
        });
    }
    if let Some(limit) = ctx.chain_timeout() {
        if ctx.has_chain_timed_out() {
            return Err(RuntimeError::ChainTimeout {
                elapsed_ms: ctx.elapsed().as_millis() as u64,
                chain_timeout_ms: limit.as_millis() as u64,
                snapshot: ctx.snapshot(),
            });
        }
    }
    Ok(())
}

/// Output summary and error details for a settled result.
fn describe(result: &Result<Outcome, RuntimeError>) -> (String, Option<String>) {
    match result {
        Ok(outcome) if outcome.success => {
            let rendered = outcome.data.as_ref().map(render_value).unwrap_or_default();
            (summarize_output(&rendered), None)
        }
        Ok(outcome) => {
            let message = outcome
                .error
                .clone()
                .unwrap_or_else(|| "tool reported failure".to_string());
            (summarize_output(&message), Some(message))
        }
        Err(e) => {
            let message = e.to_string();
            (summarize_output(&message), Some(message))
        }
    }
}
