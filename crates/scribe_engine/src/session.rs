//! `EditingSession`: drives the core state machine, runs its effects and
//! routes AI operations through the orchestrator.

use std::sync::{Arc, Mutex, MutexGuard};

use scribe_core::{
    update, Effect, Mode, ModificationType, Msg, ProcessingState, ResetDelay, SessionState,
    SessionViewModel, TextSelection,
};
use scribe_logging::{scribe_debug, scribe_warn};

use crate::optimizer::{OptimisticUpdate, OptimizerMetrics, PerformanceOptimizer};
use crate::orchestrator::{ProgressSink, RequestOrchestrator};
use crate::recovery::ErrorState;
use crate::transport::{Endpoint, ReqwestEndpoint};
use crate::{AiError, AiResponse, EngineEvent, OperationParams, OperationRequest, SessionConfig};

/// The document the session edits. Implemented by the embedding editor.
pub trait EditorHost: Send + Sync {
    fn document_content(&self) -> String;

    /// Replaces `original` (at `selection` when known) with `replacement`.
    /// Returns whether the document changed.
    fn replace_text(
        &self,
        selection: Option<&TextSelection>,
        original: &str,
        replacement: &str,
    ) -> bool;
}

#[derive(Debug, Clone)]
struct ModificationRequest {
    text: String,
    modification_type: ModificationType,
    custom_prompt: Option<String>,
    regenerate: bool,
}

#[derive(Clone)]
struct Shared {
    core: Arc<Mutex<SessionState>>,
    orchestrator: Arc<RequestOrchestrator>,
    host: Arc<dyn EditorHost>,
}

impl Shared {
    fn lock_core(&self) -> MutexGuard<'_, SessionState> {
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies one message and runs the synchronous effects. A requested
    /// modification is handed back for the caller to await.
    fn apply(&self, msg: Msg) -> Option<ModificationRequest> {
        let effects = {
            let mut core = self.lock_core();
            let state = std::mem::replace(&mut *core, SessionState::new());
            let (next, effects) = update(state, msg);
            *core = next;
            effects
        };

        let mut pending = None;
        for effect in effects {
            match effect {
                Effect::CancelInFlight => self.orchestrator.cancel_current(),
                Effect::RequestModification {
                    text,
                    modification_type,
                    custom_prompt,
                    regenerate,
                } => {
                    pending = Some(ModificationRequest {
                        text,
                        modification_type,
                        custom_prompt,
                        regenerate,
                    });
                }
                Effect::ApplyModification {
                    selection,
                    original,
                    replacement,
                } => {
                    if !self
                        .host
                        .replace_text(selection.as_ref(), &original, &replacement)
                    {
                        scribe_warn!("Editor could not apply modification");
                    }
                }
                Effect::ScheduleProgressReset { op, after } => self.schedule_reset(op, after),
            }
        }
        pending
    }

    fn schedule_reset(&self, op: u64, after: ResetDelay) {
        let settings = self.orchestrator.settings();
        let delay = match after {
            ResetDelay::AfterSuccess => settings.success_display,
            ResetDelay::AfterFailure => settings.failure_display,
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let shared = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    shared.apply(Msg::ProgressResetElapsed { op });
                });
            }
            Err(_) => {
                scribe_debug!(op = op; "No runtime for reset timer, resetting now");
                self.apply(Msg::ProgressResetElapsed { op });
            }
        }
    }

    fn refresh_document(&self) -> String {
        let content = self.host.document_content();
        self.apply(Msg::DocumentChanged(content.clone()));
        content
    }
}

impl ProgressSink for Shared {
    fn emit(&self, event: EngineEvent) {
        let msg = match event {
            EngineEvent::Started { op, mode, status } => Msg::OperationStarted { op, mode, status },
            EngineEvent::Progress {
                op,
                progress,
                status,
            } => Msg::OperationProgress {
                op,
                progress,
                status,
            },
            EngineEvent::Finished { op, outcome } => Msg::OperationFinished { op, outcome },
        };
        self.apply(msg);
    }
}

/// One editor's AI session. Cheap to share behind an `Arc`; every method
/// takes `&self`.
pub struct EditingSession {
    shared: Shared,
}

impl EditingSession {
    /// Builds a session talking HTTP to `config.endpoint`.
    pub fn new(config: SessionConfig, host: Arc<dyn EditorHost>) -> Result<Self, AiError> {
        let endpoint = ReqwestEndpoint::new(config.endpoint.clone())?;
        Ok(Self::with_endpoint(config, Arc::new(endpoint), host))
    }

    pub fn with_endpoint(
        config: SessionConfig,
        endpoint: Arc<dyn Endpoint>,
        host: Arc<dyn EditorHost>,
    ) -> Self {
        let optimizer = Arc::new(PerformanceOptimizer::new(config.optimizer));
        let orchestrator = Arc::new(RequestOrchestrator::new(
            config.orchestrator,
            endpoint,
            optimizer,
        ));
        let session = Self {
            shared: Shared {
                core: Arc::new(Mutex::new(SessionState::new())),
                orchestrator,
                host,
            },
        };
        session.shared.refresh_document();
        session
    }

    // Mode state machine.

    pub fn can_activate_mode(&self, mode: Mode) -> bool {
        self.shared.refresh_document();
        self.shared.lock_core().can_activate(mode)
    }

    /// Returns whether the transition happened.
    pub fn set_mode(&self, mode: Mode) -> bool {
        if !self.can_activate_mode(mode) {
            scribe_debug!("set_mode({}) refused", mode);
            return false;
        }
        self.shared.apply(Msg::ModeRequested(mode));
        true
    }

    pub fn reset_mode(&self) {
        self.shared.apply(Msg::ResetMode);
    }

    pub fn update_selection(&self, selection: Option<TextSelection>) {
        self.shared.apply(Msg::SelectionChanged(selection));
    }

    pub fn cancel(&self) {
        self.shared.orchestrator.cancel_current();
    }

    // Operations.

    pub async fn process_prompt(&self, prompt: &str, cursor: usize) -> Result<AiResponse, AiError> {
        let document = self.shared.refresh_document();
        let request = OperationRequest::new(OperationParams::prompt(prompt, cursor), document);
        self.execute(request).await
    }

    pub async fn process_continue(
        &self,
        cursor: usize,
        selected_text: Option<String>,
    ) -> Result<AiResponse, AiError> {
        let document = self.shared.refresh_document();
        let request =
            OperationRequest::new(OperationParams::continuation(cursor, selected_text), document);
        self.execute(request).await
    }

    pub async fn process_modify(
        &self,
        selected_text: &str,
        modification_type: ModificationType,
        custom_prompt: Option<String>,
    ) -> Result<AiResponse, AiError> {
        let document = self.shared.refresh_document();
        let params = OperationParams::modify(selected_text, modification_type, custom_prompt);
        self.execute(OperationRequest::new(params, document)).await
    }

    /// Replays the last failed operation with the current document.
    pub async fn retry_last_operation(&self) -> Result<AiResponse, AiError> {
        let document = self.shared.refresh_document();
        let result = self
            .shared
            .orchestrator
            .retry_last_operation(document, &self.shared)
            .await;
        self.after_operation(result)
    }

    async fn execute(&self, request: OperationRequest) -> Result<AiResponse, AiError> {
        let result = self.shared.orchestrator.execute(request, &self.shared).await;
        self.after_operation(result)
    }

    fn after_operation(&self, result: Result<AiResponse, AiError>) -> Result<AiResponse, AiError> {
        match &result {
            Ok(response) if response.mode == Mode::Modify => {
                self.shared.apply(Msg::ModificationGenerated {
                    op: response.operation,
                    content: response.content.clone(),
                });
            }
            Err(error) if !error.is_cancelled() => {
                self.handle_graceful_degradation();
            }
            _ => {}
        }
        result
    }

    pub fn clear_error(&self) {
        self.shared.orchestrator.clear_error();
    }

    /// Switches to the fallback mode when the recorded failure is
    /// persistent and degradation is enabled. Returns the new mode.
    pub fn handle_graceful_degradation(&self) -> Option<Mode> {
        if !self.shared.orchestrator.settings().graceful_degradation {
            return None;
        }
        let error = self.shared.orchestrator.error_state();
        if !error.should_gracefully_degrade() {
            return None;
        }
        let current = self.current_mode();
        if error.failed_mode != Some(current) {
            return None;
        }
        let fallback = error.recovery_strategy?.fallback_mode;
        if fallback == current {
            return None;
        }
        scribe_warn!("Service degraded, switching {} -> {}", current, fallback);
        self.set_mode(fallback).then_some(fallback)
    }

    // Modify workflow.

    pub fn start_modify_mode(&self) -> bool {
        self.shared.apply(Msg::StartModify);
        self.current_mode() == Mode::Modify
    }

    /// Runs the modification unless the type needs a custom prompt first.
    pub async fn select_modification_type(
        &self,
        modification_type: ModificationType,
    ) -> Result<Option<AiResponse>, AiError> {
        let pending = self
            .shared
            .apply(Msg::ModificationTypeSelected(modification_type));
        self.run_modification(pending).await
    }

    pub async fn submit_custom_prompt(&self, text: &str) -> Result<Option<AiResponse>, AiError> {
        let pending = self
            .shared
            .apply(Msg::CustomPromptSubmitted(text.to_string()));
        self.run_modification(pending).await
    }

    pub async fn regenerate_modification(&self) -> Result<Option<AiResponse>, AiError> {
        let pending = self.shared.apply(Msg::RegenerateModification);
        self.run_modification(pending).await
    }

    pub fn back_to_modification_types(&self) {
        self.shared.apply(Msg::BackToModificationTypes);
    }

    /// Hands the preview to the editor. Returns whether one was applied.
    pub fn accept_modification(&self) -> bool {
        if !self.is_previewing_modification() {
            return false;
        }
        self.shared.apply(Msg::AcceptModification);
        true
    }

    pub fn reject_modification(&self) {
        self.shared.apply(Msg::RejectModification);
    }

    async fn run_modification(
        &self,
        pending: Option<ModificationRequest>,
    ) -> Result<Option<AiResponse>, AiError> {
        let Some(pending) = pending else {
            return Ok(None);
        };
        let document = self.shared.refresh_document();
        let params = OperationParams::modify(
            pending.text,
            pending.modification_type,
            pending.custom_prompt,
        );
        let mut request = OperationRequest::new(params, document);
        if pending.regenerate {
            request = request.bypassing_cache();
        }

        let result = self.shared.orchestrator.execute(request, &self.shared).await;
        if matches!(&result, Err(error) if !error.is_cancelled()) {
            self.shared.apply(Msg::ModificationFailed);
        }
        self.after_operation(result).map(Some)
    }

    // Observables.

    pub fn current_mode(&self) -> Mode {
        self.shared.lock_core().mode()
    }

    pub fn processing_state(&self) -> ProcessingState {
        self.shared.lock_core().processing().clone()
    }

    pub fn error_state(&self) -> ErrorState {
        self.shared.orchestrator.error_state()
    }

    pub fn has_selected_text(&self) -> bool {
        self.shared.lock_core().has_selected_text()
    }

    pub fn is_selecting_modification_type(&self) -> bool {
        self.shared.lock_core().is_selecting_modification_type()
    }

    pub fn is_entering_custom_prompt(&self) -> bool {
        self.shared.lock_core().is_entering_custom_prompt()
    }

    pub fn is_previewing_modification(&self) -> bool {
        self.shared.lock_core().is_previewing_modification()
    }

    pub fn original_text_for_modification(&self) -> Option<String> {
        self.shared
            .lock_core()
            .original_text_for_modification()
            .map(str::to_string)
    }

    pub fn modification_preview_content(&self) -> Option<String> {
        self.shared
            .lock_core()
            .modification_preview_content()
            .map(str::to_string)
    }

    pub fn optimistic_update(&self) -> Option<OptimisticUpdate> {
        self.shared.orchestrator.optimistic_update()
    }

    pub fn performance_metrics(&self) -> OptimizerMetrics {
        self.shared.orchestrator.metrics()
    }

    pub fn clear_cache(&self) {
        self.shared.orchestrator.optimizer().clear_cache();
    }

    pub fn view(&self) -> SessionViewModel {
        self.shared.lock_core().view()
    }

    /// The view model, only if something changed since the last call.
    pub fn take_view_if_changed(&self) -> Option<SessionViewModel> {
        let mut core = self.shared.lock_core();
        core.consume_dirty().then(|| core.view())
    }
}
