// The editing-surface seam: the reconciler and the assist session only ever
// talk to the document through this trait, so any host editor can back them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::richtext::structured_document::Block;

/// A selection in flat document-model offsets (bytes of the plain-text
/// form). Zero-width means "no selection".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    /// Build a range, normalizing so that `start <= end` always holds
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            SelectionRange { start: a, end: b }
        } else {
            SelectionRange { start: b, end: a }
        }
    }

    pub fn caret(at: usize) -> Self {
        SelectionRange { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Errors from document-surface operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("position outside document bounds")]
    InvalidPosition,
    #[error("block index outside document bounds")]
    InvalidBlockIndex,
    #[error("operation requires a non-empty document")]
    EmptyDocument,
}

/// Result of an editing operation
pub type EditResult = Result<(), EditError>;

/// The document-surface capability consumed by the reconciler.
///
/// Implementations maintain an insertion cursor: `delete_range` leaves it at
/// the start of the deleted range and every insert advances it past the
/// inserted content, so sequential inserts land in document order.
pub trait DocumentEditor {
    /// Current selection; zero-width when nothing is selected
    fn selection(&self) -> SelectionRange;

    /// Plain text of the given flat range
    fn text_in(&self, range: SelectionRange) -> String;

    /// Delete the given range and leave the cursor at its start
    fn delete_range(&mut self, range: SelectionRange) -> EditResult;

    /// Insert a structured block (table, heading, list item, ...) at the
    /// cursor, splitting the current block when the cursor is mid-text
    fn insert_node(&mut self, block: Block) -> EditResult;

    /// Insert literal text at the cursor. With `hard_breaks`, newlines
    /// become explicit hard line breaks instead of being kept in the run.
    fn insert_text(&mut self, text: &str, hard_breaks: bool) -> EditResult;

    /// Document-model coordinates (column, line) for a flat offset. Used
    /// only by presentational layers to anchor toolbars, never by the
    /// reconciler.
    fn coords_for_offset(&self, offset: usize) -> (f64, f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_normalized() {
        let range = SelectionRange::new(10, 4);
        assert_eq!(range.start, 4);
        assert_eq!(range.end, 10);
        assert_eq!(range.len(), 6);
    }

    #[test]
    fn caret_is_empty() {
        assert!(SelectionRange::caret(7).is_empty());
        assert!(!SelectionRange::new(0, 1).is_empty());
    }
}
