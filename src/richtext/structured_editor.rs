// Structured Editor
// The reference in-memory DocumentEditor: a cursor plus selection over a
// StructuredDocument, with the insertion semantics the reconciler relies on.

use super::structured_document::*;
use crate::surface::{DocumentEditor, EditError, EditResult, SelectionRange};

pub struct StructuredEditor {
    document: StructuredDocument,
    cursor: DocumentPosition,
    selection: Option<(DocumentPosition, DocumentPosition)>, // (start, end)
}

impl StructuredEditor {
    /// Create a new editor with an empty document
    pub fn new() -> Self {
        StructuredEditor {
            document: StructuredDocument::new(),
            cursor: DocumentPosition::start(),
            selection: None,
        }
    }

    /// Create an editor with an existing document
    pub fn with_document(document: StructuredDocument) -> Self {
        StructuredEditor {
            document,
            cursor: DocumentPosition::start(),
            selection: None,
        }
    }

    pub fn document(&self) -> &StructuredDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut StructuredDocument {
        &mut self.document
    }

    pub fn cursor(&self) -> DocumentPosition {
        self.cursor
    }

    /// Set cursor position (clamped to valid range); clears the selection
    pub fn set_cursor(&mut self, pos: DocumentPosition) {
        self.cursor = self.document.clamp_position(pos);
        self.selection = None;
    }

    /// Flat offset of the cursor
    pub fn cursor_offset(&self) -> usize {
        self.document.offset_of(self.cursor)
    }

    /// Set the selection from a flat range; the cursor moves to its end
    pub fn set_selection_range(&mut self, range: SelectionRange) {
        let start = self.document.position_at(range.start);
        let end = self.document.position_at(range.end);
        self.selection = Some((start, end));
        self.cursor = end;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Full plain-text form of the document
    pub fn text(&self) -> String {
        self.document.to_plain_text()
    }

    pub fn char_len(&self) -> usize {
        self.document.char_len()
    }

    /// Insert a block at the cursor and leave the cursor at its end.
    /// Splitting rules: at offset 0 the block lands before the current
    /// block, at the end after it, mid-text the current block is split.
    /// Table blocks are never split; insertion lands next to them.
    fn insert_block_at_cursor(&mut self, block: Block) -> EditResult {
        if self.document.is_empty() {
            let len = block.text_len();
            self.document.add_block(block);
            self.cursor = DocumentPosition::new(0, len);
            return Ok(());
        }

        let at = self.document.clamp_position(self.cursor);
        let current = at.block_index;
        if current >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }

        let new_len = block.text_len();
        let current_len = self.document.blocks()[current].text_len();
        let current_is_table = self.document.blocks()[current].is_table();

        let insert_at = if at.offset == 0 {
            current
        } else if at.offset >= current_len || current_is_table {
            current + 1
        } else {
            // Split the current block; the right half becomes a paragraph
            let right = self.document.blocks_mut()[current].split_content_at(at.offset);
            let mut tail = Block::paragraph(0);
            tail.content = right;
            self.document.insert_block(current + 1, tail);
            current + 1
        };

        self.document.insert_block(insert_at, block);
        self.cursor = DocumentPosition::new(insert_at, new_len);
        self.selection = None;
        Ok(())
    }
}

impl Default for StructuredEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentEditor for StructuredEditor {
    fn selection(&self) -> SelectionRange {
        match self.selection {
            Some((start, end)) => SelectionRange::new(
                self.document.offset_of(start),
                self.document.offset_of(end),
            ),
            None => SelectionRange::caret(self.cursor_offset()),
        }
    }

    fn text_in(&self, range: SelectionRange) -> String {
        self.document.text_in(range.start, range.end)
    }

    fn delete_range(&mut self, range: SelectionRange) -> EditResult {
        if self.document.is_empty() {
            return Err(EditError::EmptyDocument);
        }
        let start = self.document.position_at(range.start);
        let end = self.document.position_at(range.end);
        self.document.delete_range(start, end);
        self.cursor = self.document.clamp_position(start);
        self.selection = None;
        Ok(())
    }

    fn insert_node(&mut self, block: Block) -> EditResult {
        self.insert_block_at_cursor(block)
    }

    fn insert_text(&mut self, text: &str, hard_breaks: bool) -> EditResult {
        if text.is_empty() {
            return Ok(());
        }

        if self.document.is_empty() {
            self.document.add_block(Block::paragraph(0));
            self.cursor = DocumentPosition::start();
        }

        // Text never goes inside a table; open a paragraph next to it
        let at = self.document.clamp_position(self.cursor);
        if self.document.blocks()[at.block_index].is_table() {
            self.insert_block_at_cursor(Block::paragraph(0))?;
        }

        let at = self.document.clamp_position(self.cursor);
        let items: Vec<InlineContent> = if hard_breaks && text.contains('\n') {
            let mut items = Vec::new();
            for (i, part) in text.split('\n').enumerate() {
                if i > 0 {
                    items.push(InlineContent::HardBreak);
                }
                if !part.is_empty() {
                    items.push(InlineContent::Text(TextRun::plain(part)));
                }
            }
            items
        } else {
            vec![InlineContent::Text(TextRun::plain(text))]
        };

        let inserted_len: usize = items.iter().map(|i| i.text_len()).sum();
        self.document.blocks_mut()[at.block_index].splice_content_at(at.offset, items);
        self.cursor = DocumentPosition::new(at.block_index, at.offset + inserted_len);
        self.selection = None;
        Ok(())
    }

    fn coords_for_offset(&self, offset: usize) -> (f64, f64) {
        let text = self.document.to_plain_text();
        let offset = clamp_to_char_boundary(&text, offset);
        let before = &text[..offset];
        let line = before.matches('\n').count();
        let column = before
            .rsplit_once('\n')
            .map(|(_, tail)| tail.len())
            .unwrap_or(offset);
        (column as f64, line as f64)
    }
}
