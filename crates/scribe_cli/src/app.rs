//! Runs one CLI command against an `EditingSession`, rendering progress
//! from the session view on a fixed tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use scribe_core::{Mode, ModificationType, SessionViewModel};
use scribe_engine::{AiError, EditingSession};
use scribe_logging::{scribe_info, scribe_warn};

use crate::cli::{Cli, Command};
use crate::config::session_config;
use crate::document::FileDocument;
use crate::error::CliError;

const TICK: Duration = Duration::from_millis(75);

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = session_config(cli.config.as_deref(), cli.endpoint.as_deref())?;
    let document = Arc::new(FileDocument::load(&cli.document)?);
    let session = EditingSession::new(config, document.clone())?;
    scribe_info!("Editing {}", document.path().display());

    match cli.command {
        Command::Prompt { text, cursor } => {
            session.set_mode(Mode::Prompt);
            let cursor = cursor.unwrap_or_else(|| document.byte_len());
            let response = report(&session, session.process_prompt(&text, cursor)).await?;
            println!("{}", response.content);
        }
        Command::Continue { cursor } => {
            if !session.set_mode(Mode::Continue) {
                scribe_warn!("Continue mode unavailable for {}", document.path().display());
            }
            let cursor = cursor.unwrap_or_else(|| document.byte_len());
            let response = report(&session, session.process_continue(cursor, None)).await?;
            println!("{}", response.content);
        }
        Command::Modify {
            start,
            end,
            modification_type,
            custom_prompt,
            write,
        } => {
            modify(
                &session,
                &document,
                document.selection(start, end)?,
                modification_type,
                custom_prompt,
                write,
            )
            .await?;
        }
    }
    Ok(())
}

async fn modify(
    session: &EditingSession,
    document: &FileDocument,
    selection: scribe_core::TextSelection,
    modification_type: ModificationType,
    custom_prompt: Option<String>,
    write: bool,
) -> Result<(), CliError> {
    let custom_prompt = match (modification_type.requires_custom_prompt(), custom_prompt) {
        (true, None) => return Err(CliError::MissingCustomPrompt),
        (_, prompt) => prompt,
    };

    session.update_selection(Some(selection));
    if !session.start_modify_mode() {
        return Err(CliError::SelectionLength);
    }
    report(session, session.select_modification_type(modification_type)).await?;
    if session.is_entering_custom_prompt() {
        let prompt = custom_prompt.unwrap_or_default();
        report(session, session.submit_custom_prompt(&prompt)).await?;
    }

    let preview = session
        .modification_preview_content()
        .ok_or(CliError::NoPreview)?;
    println!("{preview}");

    if write {
        session.accept_modification();
        document.save()?;
        eprintln!("Saved {}", document.path().display());
    } else {
        session.reject_modification();
    }
    Ok(())
}

/// Drives `operation` while printing status lines, then describes any
/// failure the way the editor would surface it.
async fn report<T>(
    session: &EditingSession,
    operation: impl Future<Output = Result<T, AiError>>,
) -> Result<T, CliError> {
    let mode_before = session.current_mode();
    let result = with_progress(session, operation).await;
    if let Err(error) = &result {
        if !error.is_cancelled() {
            describe_failure(session, error, mode_before);
        }
    }
    result.map_err(CliError::from)
}

async fn with_progress<T>(session: &EditingSession, operation: impl Future<Output = T>) -> T {
    tokio::pin!(operation);
    let mut tick = tokio::time::interval(TICK);
    loop {
        tokio::select! {
            result = &mut operation => {
                render(session.take_view_if_changed());
                return result;
            }
            _ = tick.tick() => render(session.take_view_if_changed()),
        }
    }
}

fn render(view: Option<SessionViewModel>) {
    let Some(view) = view else {
        return;
    };
    if view.processing.progress.is_some() {
        eprintln!("{}", view.status_line());
    }
}

fn describe_failure(session: &EditingSession, error: &AiError, mode_before: Mode) {
    eprintln!("error: {error}");
    let state = session.error_state();
    if state.can_retry {
        eprintln!("The request may succeed if you run the command again.");
    }
    let mode_after = session.current_mode();
    if mode_after != mode_before {
        eprintln!("The AI service looks unavailable; switched from {mode_before} to {mode_after} mode.");
    }
}
