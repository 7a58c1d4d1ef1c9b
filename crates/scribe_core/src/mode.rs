use std::fmt;

/// Identifier of one AI operation, allocated by the orchestrator.
pub type OperationId = u64;

/// The single active category of AI operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    None,
    Prompt,
    Continue,
    Modify,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::None => "none",
            Mode::Prompt => "prompt",
            Mode::Continue => "continue",
            Mode::Modify => "modify",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of rewrite requested for a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModificationType {
    Shorten,
    Expand,
    Improve,
    Simplify,
    Formal,
    Casual,
    FixGrammar,
    /// Free-form instruction supplied by the user.
    Custom,
}

impl ModificationType {
    pub const ALL: [ModificationType; 8] = [
        ModificationType::Shorten,
        ModificationType::Expand,
        ModificationType::Improve,
        ModificationType::Simplify,
        ModificationType::Formal,
        ModificationType::Casual,
        ModificationType::FixGrammar,
        ModificationType::Custom,
    ];

    /// Name used on the wire and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ModificationType::Shorten => "shorten",
            ModificationType::Expand => "expand",
            ModificationType::Improve => "improve",
            ModificationType::Simplify => "simplify",
            ModificationType::Formal => "formal",
            ModificationType::Casual => "casual",
            ModificationType::FixGrammar => "fix_grammar",
            ModificationType::Custom => "custom",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(&needle))
    }

    /// Instruction sent alongside the selection. `None` for `Custom`, whose
    /// instruction comes from the user.
    pub fn instruction(self) -> Option<&'static str> {
        match self {
            ModificationType::Shorten => Some("Make the text shorter while keeping its meaning."),
            ModificationType::Expand => Some("Expand the text with more detail."),
            ModificationType::Improve => Some("Improve clarity and flow."),
            ModificationType::Simplify => Some("Rewrite the text in simpler language."),
            ModificationType::Formal => Some("Rewrite the text in a formal tone."),
            ModificationType::Casual => Some("Rewrite the text in a casual tone."),
            ModificationType::FixGrammar => Some("Fix grammar and spelling mistakes."),
            ModificationType::Custom => None,
        }
    }

    pub fn requires_custom_prompt(self) -> bool {
        matches!(self, ModificationType::Custom)
    }
}

impl fmt::Display for ModificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an operation ended, as reported back to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Succeeded,
    Failed { message: String },
    Cancelled,
}
