use crate::view_model::{ModifyView, SessionViewModel};
use crate::{Mode, ModificationType, OperationId, TextSelection};

/// Progress of the operation currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessingState {
    pub is_processing: bool,
    pub current_mode: Mode,
    /// 0–100 while an operation is shown, `None` when idle.
    pub progress: Option<u8>,
    pub status_message: Option<String>,
}

impl ProcessingState {
    pub fn idle(mode: Mode) -> Self {
        Self {
            is_processing: false,
            current_mode: mode,
            progress: None,
            status_message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyPhase {
    TypeSelect,
    CustomPrompt,
    Preview,
}

/// Nested state of `Mode::Modify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyWorkflow {
    pub phase: ModifyPhase,
    pub modification_type: Option<ModificationType>,
    pub original_text: String,
    pub preview_content: Option<String>,
    pub custom_prompt: Option<String>,
}

impl ModifyWorkflow {
    pub(crate) fn snapshot(original_text: String) -> Self {
        Self {
            phase: ModifyPhase::TypeSelect,
            modification_type: None,
            original_text,
            preview_content: None,
            custom_prompt: None,
        }
    }

    pub(crate) fn back_to_type_select(&mut self) {
        self.phase = ModifyPhase::TypeSelect;
        self.modification_type = None;
        self.preview_content = None;
        self.custom_prompt = None;
    }
}

/// State of one editing session. Only `update` mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    mode: Mode,
    processing: ProcessingState,
    selection: Option<TextSelection>,
    document_has_content: bool,
    active_op: Option<OperationId>,
    modify: Option<ModifyWorkflow>,
    dirty: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn processing(&self) -> &ProcessingState {
        &self.processing
    }

    pub fn selection(&self) -> Option<&TextSelection> {
        self.selection.as_ref()
    }

    pub fn has_selected_text(&self) -> bool {
        self.selection.as_ref().is_some_and(|sel| !sel.is_empty())
    }

    pub fn has_valid_selection(&self) -> bool {
        self.selection
            .as_ref()
            .is_some_and(TextSelection::is_valid_for_modify)
    }

    pub fn document_has_content(&self) -> bool {
        self.document_has_content
    }

    /// Operation whose events are currently accepted.
    pub fn active_operation(&self) -> Option<OperationId> {
        self.active_op
    }

    /// Transition guard for `set_mode`.
    pub fn can_activate(&self, mode: Mode) -> bool {
        let idle = !self.processing.is_processing;
        match mode {
            Mode::None => true,
            Mode::Prompt => idle,
            Mode::Continue => idle && self.document_has_content,
            Mode::Modify => idle && self.has_valid_selection(),
        }
    }

    pub fn modify_workflow(&self) -> Option<&ModifyWorkflow> {
        self.modify.as_ref()
    }

    pub fn modify_phase(&self) -> Option<ModifyPhase> {
        self.modify.as_ref().map(|wf| wf.phase)
    }

    pub fn original_text_for_modification(&self) -> Option<&str> {
        self.modify.as_ref().map(|wf| wf.original_text.as_str())
    }

    pub fn modification_preview_content(&self) -> Option<&str> {
        self.modify.as_ref().and_then(|wf| wf.preview_content.as_deref())
    }

    pub fn is_selecting_modification_type(&self) -> bool {
        self.modify_phase() == Some(ModifyPhase::TypeSelect)
    }

    pub fn is_entering_custom_prompt(&self) -> bool {
        self.modify_phase() == Some(ModifyPhase::CustomPrompt)
    }

    pub fn is_previewing_modification(&self) -> bool {
        self.modify_phase() == Some(ModifyPhase::Preview)
    }

    pub fn view(&self) -> SessionViewModel {
        SessionViewModel {
            mode: self.mode,
            processing: self.processing.clone(),
            has_selected_text: self.has_selected_text(),
            modify: self.modify.as_ref().map(|wf| ModifyView {
                phase: wf.phase,
                modification_type: wf.modification_type,
                original_text: wf.original_text.clone(),
                preview_content: wf.preview_content.clone(),
                custom_prompt: wf.custom_prompt.clone(),
            }),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything observable changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Switches mode, abandoning any in-flight operation and modify workflow.
    pub(crate) fn enter_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.processing = ProcessingState::idle(mode);
        self.active_op = None;
        self.modify = match mode {
            Mode::Modify => self
                .selection
                .as_ref()
                .map(|sel| ModifyWorkflow::snapshot(sel.text.clone())),
            _ => None,
        };
        self.mark_dirty();
    }

    pub(crate) fn set_selection(&mut self, selection: Option<TextSelection>) {
        if self.selection != selection {
            self.selection = selection;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_document_has_content(&mut self, has_content: bool) {
        self.document_has_content = has_content;
    }

    pub(crate) fn is_active(&self, op: OperationId) -> bool {
        self.active_op == Some(op)
    }

    pub(crate) fn begin_operation(&mut self, op: OperationId, mode: Mode, status: String) {
        self.active_op = Some(op);
        self.processing = ProcessingState {
            is_processing: true,
            current_mode: mode,
            progress: Some(0),
            status_message: Some(status),
        };
        self.mark_dirty();
    }

    /// Raises progress; lower values from out-of-order events are ignored.
    pub(crate) fn advance_progress(&mut self, progress: u8, status: Option<String>) {
        let progress = progress.min(100);
        let current = self.processing.progress.unwrap_or(0);
        if progress > current {
            self.processing.progress = Some(progress);
            self.mark_dirty();
        }
        if status.is_some() && status != self.processing.status_message {
            self.processing.status_message = status;
            self.mark_dirty();
        }
    }

    pub(crate) fn finish_operation(&mut self, outcome: &crate::OperationOutcome) {
        self.processing.is_processing = false;
        match outcome {
            crate::OperationOutcome::Succeeded => {
                self.processing.progress = Some(100);
                self.processing.status_message = Some("Completed".to_string());
            }
            crate::OperationOutcome::Failed { message } => {
                self.processing.status_message = Some(message.clone());
            }
            crate::OperationOutcome::Cancelled => {
                self.processing.progress = None;
                self.processing.status_message = None;
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn clear_progress(&mut self) {
        self.processing.progress = None;
        self.processing.status_message = None;
        self.mark_dirty();
    }

    pub(crate) fn modify_mut(&mut self) -> Option<&mut ModifyWorkflow> {
        self.modify.as_mut()
    }

    pub(crate) fn exit_modify(&mut self) {
        self.modify = None;
        self.enter_mode(Mode::None);
    }
}
