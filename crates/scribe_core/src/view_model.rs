use crate::{Mode, ModificationType, ModifyPhase, ProcessingState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyView {
    pub phase: ModifyPhase,
    pub modification_type: Option<ModificationType>,
    pub original_text: String,
    pub preview_content: Option<String>,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionViewModel {
    pub mode: Mode,
    pub processing: ProcessingState,
    pub has_selected_text: bool,
    pub modify: Option<ModifyView>,
    pub dirty: bool,
}

impl SessionViewModel {
    /// One-line status, e.g. `modify 60% Modifying text`.
    pub fn status_line(&self) -> String {
        let mut line = self.processing.current_mode.to_string();
        if let Some(progress) = self.processing.progress {
            line.push_str(&format!(" {progress}%"));
        }
        if let Some(message) = &self.processing.status_message {
            line.push(' ');
            line.push_str(message);
        }
        line
    }
}
