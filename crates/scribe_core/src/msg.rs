use crate::{Mode, ModificationType, OperationId, OperationOutcome, TextSelection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to switch to a mode.
    ModeRequested(Mode),
    /// User dismissed the current mode.
    ResetMode,
    /// Editor reported the current document text.
    DocumentChanged(String),
    /// Editor reported a new selection (or none).
    SelectionChanged(Option<TextSelection>),
    /// Orchestrator started an operation.
    OperationStarted {
        op: OperationId,
        mode: Mode,
        status: String,
    },
    /// Orchestrator reached a progress checkpoint.
    OperationProgress {
        op: OperationId,
        progress: u8,
        status: Option<String>,
    },
    /// Orchestrator finished an operation.
    OperationFinished {
        op: OperationId,
        outcome: OperationOutcome,
    },
    /// The completion display delay for `op` has elapsed.
    ProgressResetElapsed { op: OperationId },
    /// User opened the modify workflow on the current selection.
    StartModify,
    ModificationTypeSelected(ModificationType),
    CustomPromptSubmitted(String),
    BackToModificationTypes,
    /// A modify request produced preview content.
    ModificationGenerated { op: OperationId, content: String },
    /// A modify request failed (cancellations are not reported).
    ModificationFailed,
    AcceptModification,
    RejectModification,
    RegenerateModification,
    /// Fallback for placeholder wiring.
    NoOp,
}
