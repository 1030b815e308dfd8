// Structured Document Model
// A document representation completely independent of markdown syntax.
// Markdown is only used as an interchange format at the edges.

use std::cmp::min;
use std::fmt;

/// Unique identifier for document elements
pub type ElementId = usize;

/// Text styling (semantic, not syntactic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub strikethrough: bool,
}

impl TextStyle {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        TextStyle {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        TextStyle {
            italic: true,
            ..Default::default()
        }
    }

    pub fn code() -> Self {
        TextStyle {
            code: true,
            ..Default::default()
        }
    }
}

/// A run of styled text (a contiguous piece of text with uniform styling)
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        TextRun {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::plain())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split this text run at the given byte offset.
    /// Returns (left_run, right_run).
    pub fn split_at(&self, offset: usize) -> (TextRun, TextRun) {
        let at = clamp_to_char_boundary(&self.text, offset);
        let (left, right) = self.text.split_at(at);
        (
            TextRun::new(left, self.style),
            TextRun::new(right, self.style),
        )
    }
}

/// Link destination
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub destination: String,
    pub title: Option<String>,
}

/// Inline content (can appear within a block or a table cell)
#[derive(Debug, Clone, PartialEq)]
pub enum InlineContent {
    Text(TextRun),
    Link {
        link: Link,
        content: Vec<InlineContent>,
    },
    LineBreak, // Soft break (becomes space on wrap)
    HardBreak, // Hard break (explicit newline)
}

impl InlineContent {
    /// Get the plain text length of this inline content
    pub fn text_len(&self) -> usize {
        match self {
            InlineContent::Text(run) => run.len(),
            InlineContent::Link { content, .. } => content.iter().map(|c| c.text_len()).sum(),
            InlineContent::LineBreak => 1,
            InlineContent::HardBreak => 1,
        }
    }

    /// Flatten to plain text
    pub fn to_plain_text(&self) -> String {
        match self {
            InlineContent::Text(run) => run.text.clone(),
            InlineContent::Link { content, .. } => {
                content.iter().map(|c| c.to_plain_text()).collect()
            }
            InlineContent::LineBreak => " ".to_string(),
            InlineContent::HardBreak => "\n".to_string(),
        }
    }
}

/// Inline-formatted content of a single table cell
pub type CellContent = Vec<InlineContent>;

/// Flatten a sequence of inline content to plain text
pub fn inline_to_plain_text(content: &[InlineContent]) -> String {
    content.iter().map(|c| c.to_plain_text()).collect()
}

/// A parsed table: one header row plus zero or more data rows.
/// Cells carry inline formatting but no block structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableData {
    pub header: Vec<CellContent>,
    pub rows: Vec<Vec<CellContent>>,
}

impl TableData {
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Plain text of each header cell, in order
    pub fn header_texts(&self) -> Vec<String> {
        self.header.iter().map(|c| inline_to_plain_text(c)).collect()
    }

    /// Plain text of each data row, in order
    pub fn row_texts(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| inline_to_plain_text(c)).collect())
            .collect()
    }

    /// Deterministic plain-text form: rows on lines, cells tab-separated
    pub fn to_plain_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push(
            self.header
                .iter()
                .map(|c| inline_to_plain_text(c))
                .collect::<Vec<_>>()
                .join("\t"),
        );
        for row in &self.rows {
            lines.push(
                row.iter()
                    .map(|c| inline_to_plain_text(c))
                    .collect::<Vec<_>>()
                    .join("\t"),
            );
        }
        lines.join("\n")
    }

    pub fn text_len(&self) -> usize {
        self.to_plain_text().len()
    }
}

/// Block-level content types
#[derive(Debug, Clone, PartialEq)]
pub enum BlockType {
    Paragraph,
    Heading {
        level: u8,
    }, // 1-6
    CodeBlock {
        language: Option<String>,
    },
    BlockQuote,
    ListItem {
        ordered: bool,
        number: Option<u64>,
    },
    Table(TableData),
}

/// A block of content
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: ElementId,
    pub block_type: BlockType,
    pub content: Vec<InlineContent>,
}

impl Block {
    pub fn new(id: ElementId, block_type: BlockType) -> Self {
        Block {
            id,
            block_type,
            content: Vec::new(),
        }
    }

    pub fn paragraph(id: ElementId) -> Self {
        Self::new(id, BlockType::Paragraph)
    }

    pub fn heading(id: ElementId, level: u8) -> Self {
        Self::new(
            id,
            BlockType::Heading {
                level: level.clamp(1, 6),
            },
        )
    }

    pub fn table(id: ElementId, data: TableData) -> Self {
        Self::new(id, BlockType::Table(data))
    }

    pub fn with_text(mut self, text: impl Into<String>, style: TextStyle) -> Self {
        self.content
            .push(InlineContent::Text(TextRun::new(text, style)));
        self
    }

    pub fn with_plain_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(InlineContent::Text(TextRun::plain(text)));
        self
    }

    pub fn is_table(&self) -> bool {
        matches!(self.block_type, BlockType::Table(_))
    }

    /// Get the total text length of this block
    pub fn text_len(&self) -> usize {
        match &self.block_type {
            BlockType::Table(data) => data.text_len(),
            _ => self.content.iter().map(|c| c.text_len()).sum(),
        }
    }

    /// Get plain text content
    pub fn to_plain_text(&self) -> String {
        match &self.block_type {
            BlockType::Table(data) => data.to_plain_text(),
            _ => self.content.iter().map(|c| c.to_plain_text()).collect(),
        }
    }

    /// Check if this block is empty (no content)
    pub fn is_empty(&self) -> bool {
        if let BlockType::Table(data) = &self.block_type {
            return data.header.is_empty() && data.rows.is_empty();
        }
        self.content.is_empty()
            || self.content.iter().all(|c| match c {
                InlineContent::Text(run) => run.text.trim().is_empty(),
                _ => false,
            })
    }

    /// Delete text in [start..end) within this block's flattened content.
    /// Table blocks are atomic: partial deletions are no-ops.
    pub fn delete_text_range(&mut self, start: usize, end: usize) {
        if start >= end || self.is_table() {
            return;
        }

        let len = self.text_len();
        let start = min(start, len);
        let end = min(end, len);
        let mut content = std::mem::take(&mut self.content);
        delete_in_inline(&mut content, start, end);
        self.content = content;
    }

    /// Split this block's content at a flattened text offset, returning the
    /// right part. The left part remains in self. Table blocks are atomic
    /// and return nothing.
    pub fn split_content_at(&mut self, offset: usize) -> Vec<InlineContent> {
        if self.is_table() {
            return Vec::new();
        }
        let offset = min(offset, self.text_len());
        let (left, right) = split_inline(&self.content, offset);
        self.content = left;
        right
    }

    /// Splice inline content into this block at a flattened text offset
    pub fn splice_content_at(&mut self, offset: usize, items: Vec<InlineContent>) {
        if self.is_table() {
            return;
        }
        let right = self.split_content_at(offset);
        self.content.extend(items);
        self.content.extend(right);
    }

    /// Insert plain text at a flattened text offset
    pub fn insert_plain_text(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        self.splice_content_at(offset, vec![InlineContent::Text(TextRun::plain(text))]);
    }
}

fn delete_in_inline(content: &mut Vec<InlineContent>, start: usize, end: usize) {
    let mut new_content: Vec<InlineContent> = Vec::new();
    let mut pos = 0usize;

    for mut item in content.drain(..) {
        let len = item.text_len();

        // Entirely outside the deletion range
        if pos + len <= start || pos >= end {
            new_content.push(item);
            pos += len;
            continue;
        }

        match &mut item {
            InlineContent::Text(run) => {
                let local_start = start.saturating_sub(pos);
                let local_end = min(len, end.saturating_sub(pos));
                let (left, rest) = run.split_at(local_start);
                let (_, right) = rest.split_at(local_end - local_start);
                if !left.is_empty() {
                    new_content.push(InlineContent::Text(left));
                }
                if !right.is_empty() {
                    new_content.push(InlineContent::Text(right));
                }
            }
            InlineContent::Link {
                link,
                content: inner,
            } => {
                let local_start = start.saturating_sub(pos);
                let local_end = min(len, end.saturating_sub(pos));
                delete_in_inline(inner, local_start, local_end);
                if inner.iter().map(|c| c.text_len()).sum::<usize>() > 0 {
                    new_content.push(InlineContent::Link {
                        link: link.clone(),
                        content: inner.clone(),
                    });
                }
            }
            InlineContent::LineBreak | InlineContent::HardBreak => {
                // Single-character item that overlaps the range: deleted
            }
        }

        pos += len;
    }

    *content = new_content;
}

fn split_inline(content: &[InlineContent], offset: usize) -> (Vec<InlineContent>, Vec<InlineContent>) {
    let mut left: Vec<InlineContent> = Vec::new();
    let mut right: Vec<InlineContent> = Vec::new();
    let mut pos = 0usize;
    let mut done = false;

    for item in content {
        if done {
            right.push(item.clone());
            continue;
        }
        let len = item.text_len();
        if pos + len <= offset {
            left.push(item.clone());
            pos += len;
            if pos == offset {
                done = true;
            }
            continue;
        }
        // Offset falls within this item
        match item {
            InlineContent::Text(run) => {
                let (l, r) = run.split_at(offset - pos);
                if !l.is_empty() {
                    left.push(InlineContent::Text(l));
                }
                if !r.is_empty() {
                    right.push(InlineContent::Text(r));
                }
            }
            InlineContent::Link {
                link,
                content: inner,
            } => {
                let (l_inner, r_inner) = split_inline(inner, offset - pos);
                if !l_inner.is_empty() {
                    left.push(InlineContent::Link {
                        link: link.clone(),
                        content: l_inner,
                    });
                }
                if !r_inner.is_empty() {
                    right.push(InlineContent::Link {
                        link: link.clone(),
                        content: r_inner,
                    });
                }
            }
            InlineContent::LineBreak | InlineContent::HardBreak => {
                // offset - pos is 0 here, so the break belongs to the right
                right.push(item.clone());
            }
        }
        done = true;
    }

    (left, right)
}

/// Clamp a byte index down to the nearest char boundary in `s`
pub fn clamp_to_char_boundary(s: &str, mut idx: usize) -> usize {
    idx = min(idx, s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Position within a document: a logical cursor position in the structured
/// content, not a pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentPosition {
    pub block_index: usize,
    pub offset: usize, // Byte offset within the block's flattened text
}

impl DocumentPosition {
    pub fn new(block_index: usize, offset: usize) -> Self {
        DocumentPosition {
            block_index,
            offset,
        }
    }

    pub fn start() -> Self {
        DocumentPosition::new(0, 0)
    }
}

/// The structured document
#[derive(Debug, Clone)]
pub struct StructuredDocument {
    blocks: Vec<Block>,
    next_id: ElementId,
}

impl StructuredDocument {
    pub fn new() -> Self {
        StructuredDocument {
            blocks: Vec::new(),
            next_id: 1,
        }
    }

    /// Get a unique element ID
    fn next_id(&mut self) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    /// Add a block at the end
    pub fn add_block(&mut self, mut block: Block) {
        if block.id == 0 {
            block.id = self.next_id();
        }
        self.blocks.push(block);
    }

    /// Insert a block at a specific position
    pub fn insert_block(&mut self, index: usize, mut block: Block) {
        if block.id == 0 {
            block.id = self.next_id();
        }
        let index = min(index, self.blocks.len());
        self.blocks.insert(index, block);
    }

    /// Remove a block
    pub fn remove_block(&mut self, index: usize) -> Option<Block> {
        if index < self.blocks.len() {
            Some(self.blocks.remove(index))
        } else {
            None
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Create a simple document with one paragraph
    pub fn with_paragraph(text: impl Into<String>) -> Self {
        let mut doc = Self::new();
        let id = doc.next_id();
        let block = Block::paragraph(id).with_plain_text(text);
        doc.add_block(block);
        doc
    }

    /// Validate and clamp a position to document bounds
    pub fn clamp_position(&self, pos: DocumentPosition) -> DocumentPosition {
        if self.blocks.is_empty() {
            return DocumentPosition::start();
        }

        let block_index = pos.block_index.min(self.blocks.len() - 1);
        let block = &self.blocks[block_index];
        let offset = pos.offset.min(block.text_len());

        DocumentPosition::new(block_index, offset)
    }

    /// Total length of the flat plain-text form (blocks joined by '\n')
    pub fn char_len(&self) -> usize {
        let content: usize = self.blocks.iter().map(|b| b.text_len()).sum();
        content + self.blocks.len().saturating_sub(1)
    }

    /// Map a flat plain-text offset to a document position
    pub fn position_at(&self, offset: usize) -> DocumentPosition {
        let mut pos = 0usize;
        for (i, block) in self.blocks.iter().enumerate() {
            let len = block.text_len();
            if offset <= pos + len {
                return DocumentPosition::new(i, offset - pos);
            }
            pos += len + 1; // separator
        }
        match self.blocks.last() {
            Some(last) => DocumentPosition::new(self.blocks.len() - 1, last.text_len()),
            None => DocumentPosition::start(),
        }
    }

    /// Map a document position to a flat plain-text offset
    pub fn offset_of(&self, pos: DocumentPosition) -> usize {
        let pos = self.clamp_position(pos);
        let before: usize = self.blocks[..pos.block_index]
            .iter()
            .map(|b| b.text_len() + 1)
            .sum();
        before + pos.offset
    }

    /// Convert to the flat plain-text form
    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.to_plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Extract the plain text in the flat byte range [start..end)
    pub fn text_in(&self, start: usize, end: usize) -> String {
        let text = self.to_plain_text();
        let start = clamp_to_char_boundary(&text, start);
        let end = clamp_to_char_boundary(&text, min(end, text.len()));
        if start >= end {
            return String::new();
        }
        text[start..end].to_string()
    }

    /// Delete content in [start..end) across blocks. If the range spans
    /// multiple blocks, the tail of the end block merges into the start
    /// block and fully covered blocks in between are removed. Table blocks
    /// are atomic: a partially covered table survives untouched, a fully
    /// covered one is removed whole.
    pub fn delete_range(&mut self, start: DocumentPosition, end: DocumentPosition) {
        if self.blocks.is_empty() {
            return;
        }
        let mut a = self.clamp_position(start);
        let mut b = self.clamp_position(end);
        if (b.block_index, b.offset) < (a.block_index, a.offset) {
            std::mem::swap(&mut a, &mut b);
        }

        if a.block_index == b.block_index {
            let len = self.blocks[a.block_index].text_len();
            if self.blocks[a.block_index].is_table() && a.offset == 0 && b.offset >= len {
                self.blocks.remove(a.block_index);
                self.ensure_non_empty();
            } else {
                self.blocks[a.block_index].delete_text_range(a.offset, b.offset);
            }
            return;
        }

        // Tail that survives from the end block
        let end_len = self.blocks[b.block_index].text_len();
        let end_full = b.offset >= end_len;
        let end_partial_table = !end_full && self.blocks[b.block_index].is_table();
        let tail: Vec<InlineContent> = if end_full || end_partial_table {
            Vec::new()
        } else {
            self.blocks[b.block_index].split_content_at(b.offset)
        };

        // Start block: fully covered tables are removed, everything else is
        // trimmed in place.
        let remove_start = self.blocks[a.block_index].is_table() && a.offset == 0;
        if !remove_start {
            let len = self.blocks[a.block_index].text_len();
            self.blocks[a.block_index].delete_text_range(a.offset, len);
        }

        let remove_from = if remove_start {
            a.block_index
        } else {
            a.block_index + 1
        };
        let remove_to = if end_partial_table {
            b.block_index
        } else {
            b.block_index + 1
        };
        self.blocks.drain(remove_from..remove_to);

        if !tail.is_empty() {
            if remove_start || self.blocks[a.block_index].is_table() {
                let mut para = Block::paragraph(0);
                para.content = tail;
                self.insert_block(remove_from, para);
            } else {
                self.blocks[a.block_index].content.extend(tail);
            }
        }

        self.ensure_non_empty();
    }

    fn ensure_non_empty(&mut self) {
        if self.blocks.is_empty() {
            let id = self.next_id();
            self.blocks.push(Block::paragraph(id));
        }
    }
}

impl Default for StructuredDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StructuredDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "StructuredDocument ({} blocks):", self.blocks.len())?;
        for (i, block) in self.blocks.iter().enumerate() {
            write!(f, "  [{}] ", i)?;
            match &block.block_type {
                BlockType::Paragraph => write!(f, "Paragraph")?,
                BlockType::Heading { level } => write!(f, "Heading(h{})", level)?,
                BlockType::CodeBlock { language } => write!(f, "CodeBlock({:?})", language)?,
                BlockType::BlockQuote => write!(f, "BlockQuote")?,
                BlockType::ListItem { ordered, number } => write!(
                    f,
                    "ListItem({}{})",
                    if *ordered { "ordered" } else { "unordered" },
                    match number {
                        Some(n) => format!(", #{}", n),
                        None => String::new(),
                    }
                )?,
                BlockType::Table(data) => write!(
                    f,
                    "Table({} cols, {} rows)",
                    data.column_count(),
                    data.rows.len()
                )?,
            }
            writeln!(f, ": {:?}", block.to_plain_text())?;
        }
        Ok(())
    }
}
