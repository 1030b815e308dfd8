// Preview/Confirmation state machine.
// One preview at a time: idle -> pending -> ready -> (confirmed |
// cancelled | regenerating -> pending). The frozen selection captured at
// trigger time is what confirmation acts on, never the live selection.
// Stale generation results are discarded by serial mismatch, so a future
// resolving after cancel or regenerate cannot touch the document.

use thiserror::Error;
use tracing::{debug, warn};

use crate::assist::action::{EditAction, edit_prompt};
use crate::assist::generator::{GenerationError, TextGenerator};
use crate::reconcile::insert_markdown_content;
use crate::selection::FrozenSelection;
use crate::surface::DocumentEditor;

/// Shown in place of a suggestion when generation fails; the preview still
/// reaches the ready state so the user can cancel or regenerate.
pub const GENERATION_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Pending,
    Ready,
}

/// The observable preview: created on trigger, filled when generation
/// resolves, reset by regenerate, destroyed on confirm or cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewState {
    pub original_text: String,
    pub suggested_text: Option<String>,
    pub action: EditAction,
    pub pending: bool,
}

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("a preview is already active, requests are serialized")]
    Busy,
    #[error("no preview in a ready state")]
    NotReady,
    #[error("no suggestion available to apply")]
    NoSuggestion,
}

/// A generation request handed to the caller: run the prompt through a
/// TextGenerator, then feed the outcome back via `resolve` with the serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub serial: u64,
    pub prompt: String,
}

struct ActivePreview {
    preview: PreviewState,
    frozen: FrozenSelection,
    serial: u64,
}

/// Drives the preview lifecycle for one document surface
pub struct AssistSession {
    active: Option<ActivePreview>,
    next_serial: u64,
}

impl AssistSession {
    pub fn new() -> Self {
        AssistSession {
            active: None,
            next_serial: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.active {
            None => SessionState::Idle,
            Some(a) if a.preview.pending => SessionState::Pending,
            Some(_) => SessionState::Ready,
        }
    }

    pub fn preview(&self) -> Option<&PreviewState> {
        self.active.as_ref().map(|a| &a.preview)
    }

    /// Trigger an edit action against a frozen selection. Rejected while
    /// another preview is active: requests are serialized.
    pub fn request_edit(
        &mut self,
        frozen: FrozenSelection,
        action: EditAction,
    ) -> Result<GenerationRequest, AssistError> {
        if self.active.is_some() {
            return Err(AssistError::Busy);
        }

        let serial = self.take_serial();
        let prompt = edit_prompt(Some(action), &frozen.text);
        self.active = Some(ActivePreview {
            preview: PreviewState {
                original_text: frozen.text.clone(),
                suggested_text: None,
                action,
                pending: true,
            },
            frozen,
            serial,
        });

        Ok(GenerationRequest { serial, prompt })
    }

    /// Feed a generation outcome back in. Failures substitute the apology
    /// string so the preview still reaches ready. Outcomes whose serial no
    /// longer matches (cancelled or regenerated since) are discarded.
    pub fn resolve(&mut self, serial: u64, result: Result<String, GenerationError>) {
        let Some(active) = self.active.as_mut() else {
            debug!(serial, "discarding generation result, no active preview");
            return;
        };
        if active.serial != serial || !active.preview.pending {
            debug!(serial, "discarding stale generation result");
            return;
        }

        let suggestion = match result {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "generation failed, substituting apology text");
                GENERATION_APOLOGY.to_string()
            }
        };
        active.preview.suggested_text = Some(suggestion);
        active.preview.pending = false;
    }

    /// Apply the suggestion: reconcile it into the document over the
    /// frozen range, then return to idle. Only valid from ready with a
    /// non-empty suggestion.
    pub fn confirm<E: DocumentEditor + ?Sized>(&mut self, editor: &mut E) -> Result<(), AssistError> {
        match &self.active {
            None => return Err(AssistError::NotReady),
            Some(a) if a.preview.pending => return Err(AssistError::NotReady),
            Some(a)
                if a.preview
                    .suggested_text
                    .as_deref()
                    .is_none_or(|s| s.is_empty()) =>
            {
                return Err(AssistError::NoSuggestion);
            }
            Some(_) => {}
        }

        let active = self.active.take().expect("checked above");
        let suggestion = active.preview.suggested_text.unwrap_or_default();
        insert_markdown_content(editor, active.frozen.range, &suggestion);
        Ok(())
    }

    /// Discard the preview without touching the document
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// From ready: clear the suggestion and go back to pending with the
    /// same original text and action, under a fresh serial.
    pub fn regenerate(&mut self) -> Result<GenerationRequest, AssistError> {
        let serial = self.take_serial();
        let Some(active) = self.active.as_mut() else {
            return Err(AssistError::NotReady);
        };
        if active.preview.pending {
            return Err(AssistError::NotReady);
        }

        active.preview.suggested_text = None;
        active.preview.pending = true;
        active.serial = serial;

        Ok(GenerationRequest {
            serial,
            prompt: edit_prompt(Some(active.preview.action), &active.preview.original_text),
        })
    }

    /// Request, generate, and resolve in one call. The session tolerates
    /// the caller dropping the future or resolving after a cancel.
    pub async fn run_edit<G: TextGenerator + ?Sized>(
        &mut self,
        generator: &G,
        frozen: FrozenSelection,
        action: EditAction,
    ) -> Result<(), AssistError> {
        let request = self.request_edit(frozen, action)?;
        let result = generator.generate(&request.prompt).await;
        self.resolve(request.serial, result);
        Ok(())
    }

    /// Regenerate and run the new request to completion
    pub async fn run_regenerate<G: TextGenerator + ?Sized>(
        &mut self,
        generator: &G,
    ) -> Result<(), AssistError> {
        let request = self.regenerate()?;
        let result = generator.generate(&request.prompt).await;
        self.resolve(request.serial, result);
        Ok(())
    }

    fn take_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }
}

impl Default for AssistSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SelectionRange;

    fn frozen(text: &str) -> FrozenSelection {
        FrozenSelection {
            range: SelectionRange::new(0, text.len()),
            text: text.to_string(),
        }
    }

    #[test]
    fn request_moves_idle_to_pending() {
        let mut session = AssistSession::new();
        assert_eq!(session.state(), SessionState::Idle);

        let request = session
            .request_edit(frozen("hello"), EditAction::Shorten)
            .unwrap();
        assert_eq!(session.state(), SessionState::Pending);
        assert!(request.prompt.contains("hello"));
        assert!(request.prompt.contains("Shorten"));
    }

    #[test]
    fn requests_are_serialized() {
        let mut session = AssistSession::new();
        session
            .request_edit(frozen("hello"), EditAction::Shorten)
            .unwrap();

        let second = session.request_edit(frozen("world"), EditAction::Expand);
        assert!(matches!(second, Err(AssistError::Busy)));
    }

    #[test]
    fn resolve_moves_pending_to_ready() {
        let mut session = AssistSession::new();
        let request = session
            .request_edit(frozen("hello"), EditAction::Grammar)
            .unwrap();

        session.resolve(request.serial, Ok("Hello".to_string()));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(
            session.preview().unwrap().suggested_text.as_deref(),
            Some("Hello")
        );
    }

    #[test]
    fn generation_failure_substitutes_apology_and_reaches_ready() {
        let mut session = AssistSession::new();
        let request = session
            .request_edit(frozen("hello"), EditAction::Formal)
            .unwrap();

        session.resolve(request.serial, Err(GenerationError::Empty));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(
            session.preview().unwrap().suggested_text.as_deref(),
            Some(GENERATION_APOLOGY)
        );
    }

    #[test]
    fn stale_resolution_after_cancel_is_discarded() {
        let mut session = AssistSession::new();
        let request = session
            .request_edit(frozen("hello"), EditAction::Casual)
            .unwrap();
        session.cancel();

        session.resolve(request.serial, Ok("late".to_string()));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.preview().is_none());
    }

    #[test]
    fn regenerate_keeps_original_and_discards_old_serial() {
        let mut session = AssistSession::new();
        let first = session
            .request_edit(frozen("hello"), EditAction::Summarize)
            .unwrap();
        session.resolve(first.serial, Ok("v1".to_string()));

        let second = session.regenerate().unwrap();
        assert_ne!(first.serial, second.serial);
        assert_eq!(session.state(), SessionState::Pending);
        assert_eq!(session.preview().unwrap().original_text, "hello");
        assert!(session.preview().unwrap().suggested_text.is_none());

        // The old request resolving late must not land
        session.resolve(first.serial, Ok("stale".to_string()));
        assert_eq!(session.state(), SessionState::Pending);

        session.resolve(second.serial, Ok("v2".to_string()));
        assert_eq!(
            session.preview().unwrap().suggested_text.as_deref(),
            Some("v2")
        );
    }

    #[test]
    fn regenerate_is_invalid_while_pending_or_idle() {
        let mut session = AssistSession::new();
        assert!(matches!(session.regenerate(), Err(AssistError::NotReady)));

        session
            .request_edit(frozen("hello"), EditAction::Bullet)
            .unwrap();
        assert!(matches!(session.regenerate(), Err(AssistError::NotReady)));
    }

    #[test]
    fn confirm_requires_ready_with_suggestion() {
        use crate::richtext::structured_editor::StructuredEditor;

        let mut editor = StructuredEditor::new();
        editor.insert_text("hello", false).unwrap();

        let mut session = AssistSession::new();
        assert!(matches!(
            session.confirm(&mut editor),
            Err(AssistError::NotReady)
        ));

        let request = session
            .request_edit(frozen("hello"), EditAction::Shorten)
            .unwrap();
        assert!(matches!(
            session.confirm(&mut editor),
            Err(AssistError::NotReady)
        ));

        session.resolve(request.serial, Ok(String::new()));
        assert!(matches!(
            session.confirm(&mut editor),
            Err(AssistError::NoSuggestion)
        ));
    }

    #[test]
    fn confirm_applies_and_returns_to_idle() {
        use crate::richtext::structured_editor::StructuredEditor;

        let mut editor = StructuredEditor::new();
        editor.insert_text("hello world", false).unwrap();

        let mut session = AssistSession::new();
        let request = session
            .request_edit(
                FrozenSelection {
                    range: SelectionRange::new(0, 5),
                    text: "hello".to_string(),
                },
                EditAction::Formal,
            )
            .unwrap();
        session.resolve(request.serial, Ok("Greetings".to_string()));

        session.confirm(&mut editor).unwrap();
        assert_eq!(editor.text(), "Greetings world");
        assert_eq!(session.state(), SessionState::Idle);
    }
}
