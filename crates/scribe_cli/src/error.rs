use std::io;
use std::path::PathBuf;

use scribe_engine::AiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("selection {start}..{end} is not a valid range of the document")]
    Selection { start: usize, end: usize },
    #[error("selection must be 3 to 5000 characters long")]
    SelectionLength,
    #[error("--custom-prompt is required for custom modifications")]
    MissingCustomPrompt,
    #[error("the service returned no preview")]
    NoPreview,
    #[error(transparent)]
    Ai(#[from] AiError),
}
