use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scribe_core::ModificationType;

use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "scribe", version, about = "AI-assisted editing of a text document")]
pub struct Cli {
    /// Document to read and, with `modify --write`, rewrite.
    #[arg(long, short)]
    pub document: PathBuf,
    /// RON file overriding the default session settings.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Base URL of the AI service; overrides the config file.
    #[arg(long)]
    pub endpoint: Option<String>,
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a free-form prompt with the document as context.
    Prompt {
        text: String,
        /// Byte offset of the cursor; defaults to the end of the document.
        #[arg(long)]
        cursor: Option<usize>,
    },
    /// Ask for a continuation of the document.
    Continue {
        #[arg(long)]
        cursor: Option<usize>,
    },
    /// Rewrite the byte range `start..end` of the document.
    Modify {
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
        #[arg(long = "type", value_parser = parse_modification_type)]
        modification_type: ModificationType,
        #[arg(long)]
        custom_prompt: Option<String>,
        /// Accept the preview and save the document.
        #[arg(long)]
        write: bool,
    },
}

fn parse_modification_type(raw: &str) -> Result<ModificationType, String> {
    ModificationType::parse(raw).ok_or_else(|| {
        let known: Vec<_> = ModificationType::ALL.iter().map(|ty| ty.as_str()).collect();
        format!("unknown modification type '{raw}' (expected one of {})", known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modify_arguments_parse() {
        let cli = Cli::try_parse_from([
            "scribe",
            "--document",
            "notes.txt",
            "--log",
            "both",
            "modify",
            "--start",
            "5",
            "--end",
            "16",
            "--type",
            "fix-grammar",
            "--write",
        ])
        .unwrap();
        assert_eq!(cli.log, LogDestination::Both);
        match cli.command {
            Command::Modify {
                start,
                end,
                modification_type,
                custom_prompt,
                write,
            } => {
                assert_eq!((start, end), (5, 16));
                assert_eq!(modification_type, ModificationType::FixGrammar);
                assert_eq!(custom_prompt, None);
                assert!(write);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_modification_type_is_rejected() {
        let err = Cli::try_parse_from([
            "scribe", "-d", "a.txt", "modify", "--start", "0", "--end", "3", "--type", "louder",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("unknown modification type 'louder'"));
    }
}
