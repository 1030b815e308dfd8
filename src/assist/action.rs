// Edit-action vocabulary and prompt construction.
// Each action maps to exactly one prompt template; unknown action names
// fall back to the generic edit template.

use serde::{Deserialize, Serialize};

/// The closed set of edit actions offered on a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Shorten,
    Expand,
    Grammar,
    Formal,
    Casual,
    Table,
    Bullet,
    Summarize,
}

impl EditAction {
    pub const ALL: [EditAction; 8] = [
        EditAction::Shorten,
        EditAction::Expand,
        EditAction::Grammar,
        EditAction::Formal,
        EditAction::Casual,
        EditAction::Table,
        EditAction::Bullet,
        EditAction::Summarize,
    ];

    /// Stable identifier used on string boundaries (CLI, config, UIs)
    pub fn name(&self) -> &'static str {
        match self {
            EditAction::Shorten => "shorten",
            EditAction::Expand => "expand",
            EditAction::Grammar => "grammar",
            EditAction::Formal => "formal",
            EditAction::Casual => "casual",
            EditAction::Table => "table",
            EditAction::Bullet => "bullet",
            EditAction::Summarize => "summarize",
        }
    }

    /// Human-readable label for the result preview
    pub fn label(&self) -> &'static str {
        match self {
            EditAction::Shorten => "Shortened Text",
            EditAction::Expand => "Expanded Text",
            EditAction::Grammar => "Grammar Fixed",
            EditAction::Formal => "Formal Version",
            EditAction::Casual => "Casual Version",
            EditAction::Table => "Table Format",
            EditAction::Bullet => "Bullet Points",
            EditAction::Summarize => "Summary",
        }
    }

    /// Look up an action by its identifier; None for unknown names
    pub fn from_name(name: &str) -> Option<EditAction> {
        EditAction::ALL
            .iter()
            .copied()
            .find(|a| a.name() == name.trim().to_lowercase())
    }
}

/// Build the generation prompt for an edit action on the selected text.
/// `None` (an unrecognized action kind) uses the generic edit template.
pub fn edit_prompt(action: Option<EditAction>, text: &str) -> String {
    match action {
        Some(EditAction::Shorten) => format!(
            "Shorten this text while keeping the main meaning: \"{}\"",
            text
        ),
        Some(EditAction::Expand) => format!(
            "Expand this text with more details and context: \"{}\"",
            text
        ),
        Some(EditAction::Grammar) => format!(
            "Fix grammar and improve clarity of this text: \"{}\"",
            text
        ),
        Some(EditAction::Formal) => format!(
            "Make this text more formal and professional: \"{}\"",
            text
        ),
        Some(EditAction::Casual) => format!(
            "Make this text more casual and conversational: \"{}\"",
            text
        ),
        Some(EditAction::Table) => format!(
            "Convert this text into a well-formatted markdown table if possible, \
             otherwise explain why it can't be converted: \"{}\"",
            text
        ),
        Some(EditAction::Bullet) => format!("Convert this text into bullet points: \"{}\"", text),
        Some(EditAction::Summarize) => {
            format!("Summarize this text in 2-3 sentences: \"{}\"", text)
        }
        None => format!("Edit this text: \"{}\"", text),
    }
}

/// Build a prompt asking about the whole document (chat front-ends)
pub fn document_prompt(content: &str, instruction: &str) -> String {
    format!(
        "You are an AI assistant helping with document editing.\n\
         Current document content: \"{}\"\n\n\
         User instruction: \"{}\"\n\n\
         Please provide a response that either:\n\
         1. Answers the user's question about the content\n\
         2. Suggests edits to specific parts of the content\n\
         3. Provides general writing advice\n\n\
         If you're suggesting edits, be specific about what parts to change.",
        content, instruction
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_has_a_distinct_template() {
        let prompts: Vec<String> = EditAction::ALL
            .iter()
            .map(|a| edit_prompt(Some(*a), "sample"))
            .collect();

        for (i, prompt) in prompts.iter().enumerate() {
            assert!(prompt.contains("sample"));
            for other in prompts.iter().skip(i + 1) {
                assert_ne!(prompt, other);
            }
        }
    }

    #[test]
    fn unknown_action_uses_generic_template() {
        assert_eq!(EditAction::from_name("sparkle"), None);
        assert_eq!(
            edit_prompt(EditAction::from_name("sparkle"), "abc"),
            "Edit this text: \"abc\""
        );
    }

    #[test]
    fn names_round_trip() {
        for action in EditAction::ALL {
            assert_eq!(EditAction::from_name(action.name()), Some(action));
        }
        assert_eq!(EditAction::from_name(" Shorten "), Some(EditAction::Shorten));
    }
}
