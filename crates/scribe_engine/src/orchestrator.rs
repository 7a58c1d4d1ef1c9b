use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use scribe_core::{Mode, ModificationType, OperationId, OperationOutcome};
use scribe_logging::{scribe_debug, scribe_info, scribe_warn};

use crate::optimizer::{OptimisticUpdate, OptimizerMetrics, PerformanceOptimizer, RequestOptions};
use crate::recovery::{backoff_delay, ErrorState};
use crate::transport::{Endpoint, RequestEnvelope};
use crate::{AiError, AiErrorKind, AiResponse, EngineEvent, OperationParams, OperationRequest};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Per-attempt limit raced against the endpoint.
    pub request_timeout: Duration,
    /// Retries after the initial attempt.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub optimistic_updates: bool,
    pub graceful_degradation: bool,
    pub cache_responses: bool,
    pub debounce_requests: bool,
    pub success_display: Duration,
    pub failure_display: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_millis(1000),
            backoff_cap: Duration::from_millis(5000),
            optimistic_updates: true,
            graceful_degradation: true,
            cache_responses: true,
            debounce_requests: false,
            success_display: Duration::from_secs(1),
            failure_display: Duration::from_secs(3),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Debug, Default)]
struct OrchestratorState {
    current: Option<(OperationId, CancellationToken)>,
    error: ErrorState,
    optimistic: Option<OptimisticUpdate>,
    last_request: Option<OperationRequest>,
    timeout_streak: u32,
}

/// Runs AI operations one at a time: validation, cache, timeout, retries
/// and cancellation.
pub struct RequestOrchestrator {
    settings: OrchestratorSettings,
    endpoint: Arc<dyn Endpoint>,
    optimizer: Arc<PerformanceOptimizer>,
    conversation_id: String,
    next_op: AtomicU64,
    state: Mutex<OrchestratorState>,
}

impl RequestOrchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        endpoint: Arc<dyn Endpoint>,
        optimizer: Arc<PerformanceOptimizer>,
    ) -> Self {
        Self {
            settings,
            endpoint,
            optimizer,
            conversation_id: uuid::Uuid::new_v4().to_string(),
            next_op: AtomicU64::new(1),
            state: Mutex::new(OrchestratorState::default()),
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    fn lock(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn execute(
        &self,
        request: OperationRequest,
        sink: &dyn ProgressSink,
    ) -> Result<AiResponse, AiError> {
        self.run(request, 0, sink).await
    }

    /// Replays the last failed operation against `document_content`.
    pub async fn retry_last_operation(
        &self,
        document_content: String,
        sink: &dyn ProgressSink,
    ) -> Result<AiResponse, AiError> {
        let (request, retry_count) = {
            let state = self.lock();
            match (&state.last_request, state.error.can_retry) {
                (Some(request), true) => (request.clone(), state.error.retry_count + 1),
                _ => {
                    return Err(AiError::validation(
                        "NOTHING_TO_RETRY",
                        "no retryable operation recorded",
                    ))
                }
            }
        };
        scribe_info!("Retrying {} operation (retry {})", request.params.mode(), retry_count);
        let request = OperationRequest {
            document_content,
            ..request
        };
        self.run(request, retry_count, sink).await
    }

    async fn run(
        &self,
        request: OperationRequest,
        retry_count: u32,
        sink: &dyn ProgressSink,
    ) -> Result<AiResponse, AiError> {
        let mode = request.params.mode();
        if let Err(error) = validate(&request) {
            scribe_info!("Rejected {} request: {}", mode, error);
            let mut state = self.lock();
            let streak = state.timeout_streak;
            state.error.record(error.clone(), mode, 0, streak);
            return Err(error);
        }

        let op = self.next_op.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        {
            let mut state = self.lock();
            if let Some((previous, previous_token)) = state.current.replace((op, token.clone())) {
                scribe_debug!(op = previous; "Superseded by operation {}", op);
                previous_token.cancel();
            }
            state.last_request = Some(request.clone());
            state.optimistic = self
                .settings
                .optimistic_updates
                .then(|| self.optimizer.create_optimistic_update(mode, &request.params));
        }

        sink.emit(EngineEvent::Started {
            op,
            mode,
            status: status_for(mode).to_string(),
        });
        sink.emit(EngineEvent::Progress {
            op,
            progress: initial_progress(mode),
            status: None,
        });

        let options = RequestOptions {
            cache: self.settings.cache_responses && !request.bypass_cache,
            debounce: self.settings.debounce_requests,
            optimize_content: true,
        };
        let pipeline = self.optimizer.optimized_request(
            mode,
            &request.document_content,
            &request.params,
            options,
            |content| self.dispatch_with_retries(op, &token, &request.params, content, sink),
        );
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(AiError::cancelled("operation cancelled")),
            result = pipeline => result,
        };

        let mut state = self.lock();
        if state.current.as_ref().is_some_and(|(current, _)| *current == op) {
            state.current = None;
            state.optimistic = None;
        }

        match outcome {
            Ok(response) => {
                state.error.clear();
                drop(state);
                sink.emit(EngineEvent::Progress {
                    op,
                    progress: 85,
                    status: Some("Finalizing".to_string()),
                });
                sink.emit(EngineEvent::Finished {
                    op,
                    outcome: OperationOutcome::Succeeded,
                });
                scribe_info!(op = op; "{} completed ({} chars)", mode, response.content.len());
                Ok(AiResponse {
                    operation: op,
                    mode,
                    content: response.content,
                    cached: response.cached,
                })
            }
            Err(error) if error.is_cancelled() => {
                drop(state);
                scribe_debug!(op = op; "{} cancelled: {}", mode, error.message);
                sink.emit(EngineEvent::Finished {
                    op,
                    outcome: OperationOutcome::Cancelled,
                });
                Err(error)
            }
            Err(error) => {
                let streak = state.timeout_streak;
                state.error.record(error.clone(), mode, retry_count, streak);
                drop(state);
                scribe_warn!(op = op; "{} failed: {}", mode, error);
                sink.emit(EngineEvent::Finished {
                    op,
                    outcome: OperationOutcome::Failed {
                        message: error.message.clone(),
                    },
                });
                Err(error)
            }
        }
    }

    async fn dispatch_with_retries(
        &self,
        op: OperationId,
        token: &CancellationToken,
        params: &OperationParams,
        document_content: String,
        sink: &dyn ProgressSink,
    ) -> Result<String, AiError> {
        let envelope = RequestEnvelope {
            params: params.clone(),
            conversation_id: self.conversation_id.clone(),
            document_content,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        sink.emit(EngineEvent::Progress {
            op,
            progress: 60,
            status: Some("Waiting for AI response".to_string()),
        });

        let mut attempt: u32 = 0;
        loop {
            if token.is_cancelled() {
                return Err(AiError::cancelled("operation cancelled"));
            }
            attempt += 1;
            let result = match tokio::time::timeout(
                self.settings.request_timeout,
                self.endpoint.send(&envelope),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(AiError::timeout(self.settings.request_timeout)),
            };

            let error = match result {
                Ok(content) => {
                    self.lock().timeout_streak = 0;
                    return Ok(content);
                }
                Err(error) => error,
            };
            {
                let mut state = self.lock();
                if error.kind == AiErrorKind::Timeout {
                    state.timeout_streak += 1;
                } else {
                    state.timeout_streak = 0;
                }
            }
            if !error.retryable || attempt > self.settings.max_retries {
                return Err(error);
            }

            let delay = backoff_delay(attempt, self.settings.backoff_base, self.settings.backoff_cap);
            scribe_warn!(op = op; "Attempt {} failed ({}), retrying in {} ms", attempt, error, delay.as_millis());
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(AiError::cancelled("operation cancelled")),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Cancels the in-flight operation, if any, and any debounced request.
    pub fn cancel_current(&self) {
        let mut state = self.lock();
        if let Some((op, token)) = state.current.take() {
            scribe_debug!(op = op; "Cancelling in-flight operation");
            token.cancel();
        }
        state.optimistic = None;
        drop(state);
        self.optimizer.cancel_pending_requests();
    }

    pub fn current_operation(&self) -> Option<OperationId> {
        self.lock().current.as_ref().map(|(op, _)| *op)
    }

    pub fn error_state(&self) -> ErrorState {
        self.lock().error.clone()
    }

    pub fn clear_error(&self) {
        self.lock().error.clear();
    }

    pub fn optimistic_update(&self) -> Option<OptimisticUpdate> {
        self.lock().optimistic.clone()
    }

    pub fn metrics(&self) -> OptimizerMetrics {
        self.optimizer.metrics()
    }

    pub fn optimizer(&self) -> &PerformanceOptimizer {
        &self.optimizer
    }
}

fn validate(request: &OperationRequest) -> Result<(), AiError> {
    match &request.params {
        OperationParams::Prompt { prompt, .. } if prompt.trim().is_empty() => {
            Err(AiError::validation("EMPTY_PROMPT", "prompt cannot be empty"))
        }
        OperationParams::Continue { .. } if request.document_content.trim().is_empty() => Err(
            AiError::validation("EMPTY_DOCUMENT", "nothing to continue: the document is empty"),
        ),
        OperationParams::Modify { selected_text, .. } if selected_text.trim().is_empty() => {
            Err(AiError::validation("EMPTY_SELECTION", "select some text to modify"))
        }
        OperationParams::Modify {
            modification_type: ModificationType::Custom,
            custom_prompt,
            ..
        } if custom_prompt.as_deref().map_or(true, |p| p.trim().is_empty()) => Err(
            AiError::validation("EMPTY_CUSTOM_PROMPT", "custom modification needs an instruction"),
        ),
        _ => Ok(()),
    }
}

pub fn status_for(mode: Mode) -> &'static str {
    match mode {
        Mode::Prompt => "Processing prompt",
        Mode::Continue => "Generating continuation",
        Mode::Modify => "Modifying text",
        Mode::None => "Idle",
    }
}

fn initial_progress(mode: Mode) -> u8 {
    match mode {
        Mode::Prompt => 10,
        Mode::Continue => 25,
        Mode::Modify => 40,
        Mode::None => 0,
    }
}
