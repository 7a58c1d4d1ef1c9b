use scribe_logging::{scribe_debug, scribe_info};

use crate::{
    Effect, Mode, ModificationType, ModifyPhase, Msg, OperationOutcome, ResetDelay, SessionState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effects = match msg {
        Msg::ModeRequested(mode) => request_mode(&mut state, mode),
        Msg::ResetMode => request_mode(&mut state, Mode::None),
        Msg::DocumentChanged(text) => {
            state.set_document_has_content(!text.trim().is_empty());
            Vec::new()
        }
        Msg::SelectionChanged(selection) => {
            state.set_selection(selection);
            if state.mode() == Mode::Modify && !state.has_valid_selection() {
                scribe_info!("Selection no longer valid, leaving modify mode");
                state.enter_mode(Mode::None);
                vec![Effect::CancelInFlight]
            } else {
                Vec::new()
            }
        }
        Msg::OperationStarted { op, mode, status } => {
            state.begin_operation(op, mode, status);
            Vec::new()
        }
        Msg::OperationProgress {
            op,
            progress,
            status,
        } => {
            if state.is_active(op) && state.processing().is_processing {
                state.advance_progress(progress, status);
            } else {
                scribe_debug!(op = op; "Ignoring progress {} of inactive operation", progress);
            }
            Vec::new()
        }
        Msg::OperationFinished { op, outcome } => {
            if !state.is_active(op) || !state.processing().is_processing {
                scribe_debug!(op = op; "Ignoring completion of inactive operation");
                return (state, Vec::new());
            }
            state.finish_operation(&outcome);
            match outcome {
                OperationOutcome::Succeeded => vec![Effect::ScheduleProgressReset {
                    op,
                    after: ResetDelay::AfterSuccess,
                }],
                OperationOutcome::Failed { .. } => vec![Effect::ScheduleProgressReset {
                    op,
                    after: ResetDelay::AfterFailure,
                }],
                OperationOutcome::Cancelled => Vec::new(),
            }
        }
        Msg::ProgressResetElapsed { op } => {
            if state.is_active(op) && !state.processing().is_processing {
                state.clear_progress();
            }
            Vec::new()
        }
        Msg::StartModify => request_mode(&mut state, Mode::Modify),
        Msg::ModificationTypeSelected(modification_type) => {
            select_modification_type(&mut state, modification_type)
        }
        Msg::CustomPromptSubmitted(text) => submit_custom_prompt(&mut state, &text),
        Msg::BackToModificationTypes => {
            let in_flight = state.processing().is_processing;
            let Some(workflow) = state.modify_mut() else {
                return (state, Vec::new());
            };
            if workflow.phase == ModifyPhase::TypeSelect && workflow.modification_type.is_none()
            {
                return (state, Vec::new());
            }
            workflow.back_to_type_select();
            state.mark_dirty();
            if in_flight {
                vec![Effect::CancelInFlight]
            } else {
                Vec::new()
            }
        }
        Msg::ModificationGenerated { op, content } => {
            if !state.is_active(op) {
                scribe_debug!(op = op; "Dropping preview of inactive operation");
                return (state, Vec::new());
            }
            if let Some(workflow) = state.modify_mut() {
                workflow.phase = ModifyPhase::Preview;
                workflow.preview_content = Some(content);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ModificationFailed => {
            if let Some(workflow) = state.modify_mut() {
                workflow.back_to_type_select();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AcceptModification => accept_modification(&mut state),
        Msg::RejectModification => {
            if !state.is_previewing_modification() {
                return (state, Vec::new());
            }
            if state.has_valid_selection() {
                if let Some(workflow) = state.modify_mut() {
                    workflow.back_to_type_select();
                }
                state.mark_dirty();
            } else {
                scribe_info!("Selection gone after rejection, leaving modify mode");
                state.exit_modify();
            }
            Vec::new()
        }
        Msg::RegenerateModification => {
            let Some(workflow) = state.modify_workflow() else {
                return (state, Vec::new());
            };
            match (workflow.phase, workflow.modification_type) {
                (ModifyPhase::Preview, Some(modification_type)) => {
                    vec![Effect::RequestModification {
                        text: workflow.original_text.clone(),
                        modification_type,
                        custom_prompt: workflow.custom_prompt.clone(),
                        regenerate: true,
                    }]
                }
                _ => Vec::new(),
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn request_mode(state: &mut SessionState, mode: Mode) -> Vec<Effect> {
    if !state.can_activate(mode) {
        scribe_info!("Refusing mode transition {} -> {}", state.mode(), mode);
        return Vec::new();
    }
    scribe_debug!("Mode transition {} -> {}", state.mode(), mode);
    state.enter_mode(mode);
    vec![Effect::CancelInFlight]
}

fn select_modification_type(
    state: &mut SessionState,
    modification_type: ModificationType,
) -> Vec<Effect> {
    let Some(workflow) = state.modify_mut() else {
        scribe_debug!("Ignoring modification type outside modify mode");
        return Vec::new();
    };
    if workflow.phase != ModifyPhase::TypeSelect {
        return Vec::new();
    }

    workflow.modification_type = Some(modification_type);
    workflow.custom_prompt = None;
    let effects = if modification_type.requires_custom_prompt() {
        workflow.phase = ModifyPhase::CustomPrompt;
        Vec::new()
    } else {
        vec![Effect::RequestModification {
            text: workflow.original_text.clone(),
            modification_type,
            custom_prompt: None,
            regenerate: false,
        }]
    };
    state.mark_dirty();
    effects
}

fn submit_custom_prompt(state: &mut SessionState, text: &str) -> Vec<Effect> {
    let Some(workflow) = state.modify_mut() else {
        return Vec::new();
    };
    if workflow.phase != ModifyPhase::CustomPrompt {
        return Vec::new();
    }
    let prompt = text.trim();
    if prompt.is_empty() {
        scribe_debug!("Ignoring empty custom prompt");
        return Vec::new();
    }

    workflow.custom_prompt = Some(prompt.to_string());
    let effects = vec![Effect::RequestModification {
        text: workflow.original_text.clone(),
        modification_type: ModificationType::Custom,
        custom_prompt: Some(prompt.to_string()),
        regenerate: false,
    }];
    state.mark_dirty();
    effects
}

fn accept_modification(state: &mut SessionState) -> Vec<Effect> {
    let Some(workflow) = state.modify_workflow() else {
        return Vec::new();
    };
    let Some(replacement) = workflow
        .preview_content
        .clone()
        .filter(|_| workflow.phase == ModifyPhase::Preview)
    else {
        return Vec::new();
    };

    let effect = Effect::ApplyModification {
        selection: state.selection().cloned(),
        original: workflow.original_text.clone(),
        replacement,
    };
    state.exit_modify();
    vec![effect]
}
