use crate::{ModificationType, OperationId, TextSelection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Abort whatever operation is in flight.
    CancelInFlight,
    /// Run a modify operation against the snapshotted text.
    RequestModification {
        text: String,
        modification_type: ModificationType,
        custom_prompt: Option<String>,
        regenerate: bool,
    },
    /// Replace `original` in the editor with `replacement`.
    ApplyModification {
        selection: Option<TextSelection>,
        original: String,
        replacement: String,
    },
    /// Deliver `ProgressResetElapsed { op }` after the display delay.
    ScheduleProgressReset { op: OperationId, after: ResetDelay },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDelay {
    AfterSuccess,
    AfterFailure,
}
