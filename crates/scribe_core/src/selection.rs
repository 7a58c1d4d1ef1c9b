/// Shortest selection (trimmed, in chars) that can be modified.
pub const MIN_SELECTION_CHARS: usize = 3;
/// Longest selection (trimmed, in chars) that can be modified.
pub const MAX_SELECTION_CHARS: usize = 5000;

/// Text selected in the host editor. `start`/`end` are byte offsets into the
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSelection {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl TextSelection {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// True when the selection can be the target of a modification.
    pub fn is_valid_for_modify(&self) -> bool {
        let len = self.text.trim().chars().count();
        (MIN_SELECTION_CHARS..=MAX_SELECTION_CHARS).contains(&len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_uses_trimmed_char_count() {
        assert!(!TextSelection::new("  ab  ", 0, 6).is_valid_for_modify());
        assert!(TextSelection::new(" abc ", 0, 5).is_valid_for_modify());
        assert!(TextSelection::new("äöü", 0, 3).is_valid_for_modify());

        let at_limit = "x".repeat(MAX_SELECTION_CHARS);
        assert!(TextSelection::new(at_limit.clone(), 0, MAX_SELECTION_CHARS).is_valid_for_modify());
        let over = format!("{at_limit}x");
        assert!(!TextSelection::new(over, 0, MAX_SELECTION_CHARS + 1).is_valid_for_modify());
    }
}
