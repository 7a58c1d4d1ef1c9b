//! Scribe core: pure mode state machine, modify workflow and view-model helpers.
mod effect;
mod mode;
mod msg;
mod selection;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, ResetDelay};
pub use mode::{Mode, ModificationType, OperationId, OperationOutcome};
pub use msg::Msg;
pub use selection::{TextSelection, MAX_SELECTION_CHARS, MIN_SELECTION_CHARS};
pub use state::{ModifyPhase, ModifyWorkflow, ProcessingState, SessionState};
pub use update::update;
pub use view_model::{ModifyView, SessionViewModel};
