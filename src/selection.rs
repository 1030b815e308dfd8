// Selection Tracker
// Keeps a settled view of the current non-empty selection and hands out
// frozen snapshots when an assist action is triggered. Transient
// empty-selection events (as fired during click sequences or when a modal
// grabs focus) only clear the published selection after a settle window
// with no further change: the clear is a cancellable deadline committed in
// an explicit poll step, not a delayed callback.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

use crate::richtext::structured_document::clamp_to_char_boundary;
use crate::surface::SelectionRange;

/// Raised when an action is triggered without an active selection;
/// surfaced by disabling the action affordance, never as a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no active selection to act on")]
pub struct SelectionEmptyError;

/// The published non-empty selection and its anchoring text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSelection {
    pub text: String,
    pub range: SelectionRange,
}

impl ActiveSelection {
    /// Grapheme-safe truncation of the selected text for display
    pub fn preview(&self, max_graphemes: usize) -> String {
        let mut out: String = self
            .text
            .graphemes(true)
            .take(max_graphemes)
            .collect();
        if self.text.graphemes(true).count() > max_graphemes {
            out.push_str("...");
        }
        out
    }
}

/// A selection snapshot captured once per action request. Stays valid no
/// matter what the live selection does afterwards; consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenSelection {
    pub range: SelectionRange,
    pub text: String,
}

pub struct SelectionTracker {
    settle_window: Duration,
    active: Option<ActiveSelection>,
    clear_requested_at: Option<Instant>,
}

impl SelectionTracker {
    pub fn new(settle_window: Duration) -> Self {
        SelectionTracker {
            settle_window,
            active: None,
            clear_requested_at: None,
        }
    }

    /// The currently published selection, if any
    pub fn active(&self) -> Option<&ActiveSelection> {
        self.active.as_ref()
    }

    /// Feed a selection-state change from the document surface.
    /// Non-empty selections publish immediately and cancel any pending
    /// clear; empty ones only schedule a clear.
    pub fn on_selection_change(&mut self, range: SelectionRange, document_text: &str) {
        let text = selection_text(range, document_text);
        let trimmed = text.trim();

        if range.is_empty() || trimmed.is_empty() {
            if self.active.is_some() && self.clear_requested_at.is_none() {
                self.clear_requested_at = Some(Instant::now());
            }
            return;
        }

        self.clear_requested_at = None;
        self.active = Some(ActiveSelection {
            text: trimmed.to_string(),
            range,
        });
    }

    /// Commit a scheduled clear if the settle window has elapsed at `now`
    /// with no further non-empty change. Returns true if it cleared.
    pub fn apply_pending(&mut self, now: Instant) -> bool {
        if let Some(requested) = self.clear_requested_at
            && now.duration_since(requested) >= self.settle_window
        {
            self.clear_requested_at = None;
            self.active = None;
            return true;
        }
        false
    }

    /// Convenience poll using the current time
    pub fn tick(&mut self) -> bool {
        self.apply_pending(Instant::now())
    }

    /// Snapshot the selection in effect right now. The returned copy is
    /// what the reconciler will act on later, regardless of how the live
    /// selection changes in the meantime.
    pub fn freeze(&self) -> Result<FrozenSelection, SelectionEmptyError> {
        match &self.active {
            Some(active) => Ok(FrozenSelection {
                range: active.range,
                text: active.text.clone(),
            }),
            None => Err(SelectionEmptyError),
        }
    }
}

fn selection_text(range: SelectionRange, document_text: &str) -> String {
    let start = clamp_to_char_boundary(document_text, range.start);
    let end = clamp_to_char_boundary(document_text, range.end.min(document_text.len()));
    if start >= end {
        return String::new();
    }
    document_text[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "The quick brown fox";

    fn tracker() -> SelectionTracker {
        SelectionTracker::new(Duration::from_millis(150))
    }

    #[test]
    fn non_empty_selection_publishes_immediately() {
        let mut t = tracker();
        t.on_selection_change(SelectionRange::new(4, 9), TEXT);

        let active = t.active().expect("selection should be active");
        assert_eq!(active.text, "quick");
        assert_eq!(active.range, SelectionRange::new(4, 9));
    }

    #[test]
    fn empty_selection_clears_only_after_settle_window() {
        let mut t = tracker();
        t.on_selection_change(SelectionRange::new(4, 9), TEXT);
        t.on_selection_change(SelectionRange::caret(4), TEXT);

        // Still active before the window elapses
        assert!(t.active().is_some());
        let requested = t.clear_requested_at.unwrap();
        assert!(!t.apply_pending(requested + Duration::from_millis(10)));
        assert!(t.active().is_some());

        // Cleared once the window elapses
        assert!(t.apply_pending(requested + Duration::from_millis(200)));
        assert!(t.active().is_none());
    }

    #[test]
    fn new_selection_cancels_pending_clear() {
        let mut t = tracker();
        t.on_selection_change(SelectionRange::new(4, 9), TEXT);
        t.on_selection_change(SelectionRange::caret(4), TEXT);
        let requested = t.clear_requested_at.unwrap();

        t.on_selection_change(SelectionRange::new(10, 15), TEXT);
        assert!(!t.apply_pending(requested + Duration::from_secs(1)));
        assert_eq!(t.active().unwrap().text, "brown");
    }

    #[test]
    fn whitespace_only_selection_counts_as_empty() {
        let mut t = tracker();
        t.on_selection_change(SelectionRange::new(3, 4), TEXT);
        assert!(t.active().is_none());
        assert!(t.freeze().is_err());
    }

    #[test]
    fn frozen_selection_survives_live_changes() {
        let mut t = tracker();
        t.on_selection_change(SelectionRange::new(4, 9), TEXT);
        let frozen = t.freeze().unwrap();

        // Live selection collapses (modal grabbed focus) and settles
        t.on_selection_change(SelectionRange::caret(0), TEXT);
        let requested = t.clear_requested_at.unwrap();
        t.apply_pending(requested + Duration::from_secs(1));

        assert!(t.active().is_none());
        assert_eq!(frozen.range, SelectionRange::new(4, 9));
        assert_eq!(frozen.text, "quick");
    }

    #[test]
    fn freeze_with_no_selection_is_rejected() {
        let t = tracker();
        assert_eq!(t.freeze(), Err(SelectionEmptyError));
    }

    #[test]
    fn preview_truncates_on_grapheme_boundaries() {
        let active = ActiveSelection {
            text: "héllo wörld".to_string(),
            range: SelectionRange::new(0, 13),
        };
        assert_eq!(active.preview(5), "héllo...");
        assert_eq!(active.preview(40), "héllo wörld");
    }
}
