use std::sync::Once;

use pretty_assertions::assert_eq;
use scribe_core::{
    update, Effect, Mode, Msg, OperationOutcome, ProcessingState, SessionState, TextSelection,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scribe_logging::initialize_for_tests);
}

fn with_document(state: SessionState, text: &str) -> SessionState {
    update(state, Msg::DocumentChanged(text.to_string())).0
}

fn with_selection(state: SessionState, text: &str) -> SessionState {
    let selection = TextSelection::new(text, 0, text.chars().count());
    update(state, Msg::SelectionChanged(Some(selection))).0
}

fn start_operation(state: SessionState, op: u64, mode: Mode) -> SessionState {
    update(
        state,
        Msg::OperationStarted {
            op,
            mode,
            status: "Working".to_string(),
        },
    )
    .0
}

const ALL_MODES: [Mode; 4] = [Mode::None, Mode::Prompt, Mode::Continue, Mode::Modify];

#[test]
fn set_mode_lands_iff_guard_held() {
    init_logging();
    let fixtures = vec![
        SessionState::new(),
        with_document(SessionState::new(), "Some text"),
        with_selection(with_document(SessionState::new(), "the cat sat"), "the cat sat"),
        start_operation(with_document(SessionState::new(), "Some text"), 1, Mode::Prompt),
    ];

    for fixture in fixtures {
        for target in ALL_MODES {
            let before = fixture.mode();
            let allowed = fixture.can_activate(target);
            let (next, effects) = update(fixture.clone(), Msg::ModeRequested(target));
            if allowed {
                assert_eq!(next.mode(), target);
                assert_eq!(effects, vec![Effect::CancelInFlight]);
            } else {
                assert_eq!(next.mode(), before);
                assert_eq!(next, fixture);
                assert!(effects.is_empty());
            }
        }
    }
}

#[test]
fn continue_requires_document_content() {
    init_logging();
    let state = with_document(SessionState::new(), "   \n  ");
    assert!(!state.can_activate(Mode::Continue));

    let (state, effects) = update(state, Msg::ModeRequested(Mode::Prompt));
    assert_eq!(state.mode(), Mode::Prompt);
    assert_eq!(effects.len(), 1);

    let (state, effects) = update(state, Msg::ModeRequested(Mode::Continue));
    assert_eq!(state.mode(), Mode::Prompt);
    assert!(effects.is_empty());

    let state = with_document(state, "Once upon a time");
    let (state, _) = update(state, Msg::ModeRequested(Mode::Continue));
    assert_eq!(state.mode(), Mode::Continue);
}

#[test]
fn processing_blocks_everything_but_none() {
    init_logging();
    let state = with_selection(with_document(SessionState::new(), "abc def"), "abc def");
    let state = start_operation(state, 4, Mode::Prompt);

    assert!(state.can_activate(Mode::None));
    assert!(!state.can_activate(Mode::Prompt));
    assert!(!state.can_activate(Mode::Continue));
    assert!(!state.can_activate(Mode::Modify));

    let (state, effects) = update(state, Msg::ResetMode);
    assert_eq!(effects, vec![Effect::CancelInFlight]);
    assert_eq!(state.processing(), &ProcessingState::idle(Mode::None));
    assert_eq!(state.active_operation(), None);
}

#[test]
fn mode_change_resets_processing_to_target_mode() {
    init_logging();
    let state = with_document(SessionState::new(), "text");
    let state = start_operation(state, 1, Mode::Continue);
    let (state, _) = update(
        state,
        Msg::OperationFinished {
            op: 1,
            outcome: OperationOutcome::Succeeded,
        },
    );
    assert_eq!(state.processing().progress, Some(100));

    let (state, _) = update(state, Msg::ModeRequested(Mode::Prompt));
    assert_eq!(state.processing(), &ProcessingState::idle(Mode::Prompt));
}

#[test]
fn clearing_selection_in_modify_forces_none() {
    init_logging();
    let state = with_selection(SessionState::new(), "the cat sat");
    let (state, _) = update(state, Msg::StartModify);
    assert_eq!(state.mode(), Mode::Modify);
    assert!(state.is_selecting_modification_type());

    let (state, effects) = update(state, Msg::SelectionChanged(None));
    assert_eq!(state.mode(), Mode::None);
    assert_eq!(state.modify_workflow(), None);
    assert_eq!(state.original_text_for_modification(), None);
    assert_eq!(effects, vec![Effect::CancelInFlight]);
}

#[test]
fn too_short_selection_in_modify_forces_none() {
    init_logging();
    let state = with_selection(SessionState::new(), "the cat sat");
    let (state, _) = update(state, Msg::StartModify);

    let state = with_selection(state, "ab");
    assert_eq!(state.mode(), Mode::None);
    assert!(state.has_selected_text());
    assert!(!state.has_valid_selection());
}

#[test]
fn selection_change_outside_modify_keeps_mode() {
    init_logging();
    let (state, _) = update(SessionState::new(), Msg::ModeRequested(Mode::Prompt));
    let (mut state, effects) = update(state, Msg::SelectionChanged(None));

    assert_eq!(state.mode(), Mode::Prompt);
    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}
