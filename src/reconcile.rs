// Markdown Reconciler
// Turns free-form generator output into document-surface mutations:
// decompose the text into an ordered run of typed segments (table /
// markdown / plain), delete the frozen target range exactly once, then
// stream the segments into the document in their original order.
//
// Segmentation happens synchronously and up front, producing a flat
// ordered list before any document mutation begins, so insertion order
// never depends on scheduling.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::richtext::markdown_converter::markdown_to_blocks;
use crate::richtext::structured_document::{
    Block, CellContent, InlineContent, TableData, TextRun, TextStyle,
};
use crate::surface::{DocumentEditor, EditError, SelectionRange};

/// A contiguous, typed chunk of generator output awaiting insertion
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// A pipe table, parsed into header and data rows
    Table(TableData),
    /// Non-table text containing markdown syntax
    Markdown(String),
    /// Text with no recognized markdown tokens
    Plain(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Table,
    Markdown,
    Plain,
}

/// A segment's byte span in the original input. The spans produced for one
/// input tile it completely: no gaps, no overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSpan {
    pub kind: SegmentKind,
    pub range: Range<usize>,
}

/// Errors inside the reconciler. Never escapes `insert_markdown_content`;
/// every failure degrades to a literal-text insertion instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("markdown produced no structured content")]
    EmptyTranslation,
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// True if the text contains any recognized markdown token
pub fn contains_markdown(text: &str) -> bool {
    const TOKENS: [&str; 6] = ["**", "*", "#", "`", "- ", "> "];
    TOKENS.iter().any(|t| text.contains(t))
}

/// Decompose input into typed byte spans covering the whole input in order
pub fn segment_spans(input: &str) -> Vec<SegmentSpan> {
    let spans = line_spans(input);
    let lines: Vec<&str> = spans
        .iter()
        .map(|r| input[r.clone()].trim_end_matches(['\n', '\r']))
        .collect();

    let mut out: Vec<SegmentSpan> = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut i = 0;

    while i < lines.len() {
        if let Some(end) = table_region_end(&lines, i) {
            if let Some(rs) = run_start.take() {
                out.push(text_span(input, &spans, rs, i));
            }
            out.push(SegmentSpan {
                kind: SegmentKind::Table,
                range: spans[i].start..spans[end - 1].end,
            });
            i = end;
        } else {
            if run_start.is_none() {
                run_start = Some(i);
            }
            i += 1;
        }
    }

    if let Some(rs) = run_start.take() {
        out.push(text_span(input, &spans, rs, lines.len()));
    }

    out
}

/// Decompose input into an ordered list of typed segments
pub fn segment_markdown(input: &str) -> Vec<Segment> {
    segment_spans(input)
        .into_iter()
        .map(|span| {
            let raw = input[span.range].to_string();
            match span.kind {
                SegmentKind::Table => Segment::Table(parse_table(&raw)),
                SegmentKind::Markdown => Segment::Markdown(raw),
                SegmentKind::Plain => Segment::Plain(raw),
            }
        })
        .collect()
}

/// Reconcile generator output into the document: delete the frozen range
/// exactly once, then insert every segment in order at the moving cursor.
/// Never fails; parse or insertion errors degrade tier by tier (structured
/// content, then literal text with hard breaks, then raw text).
pub fn insert_markdown_content<E: DocumentEditor + ?Sized>(
    editor: &mut E,
    range: SelectionRange,
    input: &str,
) {
    let segments = segment_markdown(input);

    if let Err(err) = editor.delete_range(range) {
        warn!(%err, "could not delete target range, inserting at cursor");
    }

    let count = segments.len();
    for (index, segment) in segments.into_iter().enumerate() {
        match segment {
            Segment::Table(data) => {
                let plain = data.to_plain_text();
                if let Err(err) = editor.insert_node(Block::table(0, data)) {
                    warn!(%err, "table insertion failed, inserting literal text");
                    insert_literal(editor, &plain);
                }
                // Spacer paragraph so the table does not merge with what follows
                if index + 1 < count
                    && let Err(err) = editor.insert_node(Block::paragraph(0))
                {
                    warn!(%err, "could not insert spacer after table");
                }
            }
            Segment::Markdown(raw) => {
                if let Err(err) = insert_markdown_segment(editor, &raw) {
                    warn!(%err, "markdown translation failed, inserting literal text");
                    insert_literal(editor, raw.trim_matches('\n'));
                }
            }
            Segment::Plain(raw) => insert_literal(editor, raw.trim_matches('\n')),
        }
    }
}

/// Translate one markdown segment to blocks and insert them in order
fn insert_markdown_segment<E: DocumentEditor + ?Sized>(
    editor: &mut E,
    raw: &str,
) -> Result<(), ReconcileError> {
    if raw.trim().is_empty() {
        return Ok(());
    }
    let blocks = markdown_to_blocks(raw);
    if blocks.is_empty() {
        return Err(ReconcileError::EmptyTranslation);
    }
    for block in blocks {
        editor.insert_node(block)?;
    }
    Ok(())
}

/// Literal-text tiers: hard-break conversion first, raw text as last resort
fn insert_literal<E: DocumentEditor + ?Sized>(editor: &mut E, raw: &str) {
    if raw.trim().is_empty() {
        return;
    }
    if editor.insert_text(raw, true).is_err()
        && let Err(err) = editor.insert_text(raw, false)
    {
        warn!(%err, "literal insertion failed, segment dropped");
    }
}

/// Byte span of every line, including its terminator
fn line_spans(input: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, b) in input.bytes().enumerate() {
        if b == b'\n' {
            spans.push(start..i + 1);
            start = i + 1;
        }
    }
    if start < input.len() {
        spans.push(start..input.len());
    }
    spans
}

fn text_span(input: &str, spans: &[Range<usize>], from_line: usize, to_line: usize) -> SegmentSpan {
    let range = spans[from_line].start..spans[to_line - 1].end;
    let kind = if contains_markdown(&input[range.clone()]) {
        SegmentKind::Markdown
    } else {
        SegmentKind::Plain
    };
    SegmentSpan { kind, range }
}

/// If a table starts at line `i`, return the line index one past its end:
/// a header line containing `|`, a separator line, then one or more data
/// lines containing `|`.
fn table_region_end(lines: &[&str], i: usize) -> Option<usize> {
    let header = lines.get(i)?;
    if !header.contains('|') || is_table_separator(header) {
        return None;
    }
    if !is_table_separator(lines.get(i + 1)?) {
        return None;
    }
    if !lines.get(i + 2)?.contains('|') {
        return None;
    }

    let mut end = i + 3;
    while end < lines.len() && lines[end].contains('|') && !is_table_separator(lines[end]) {
        end += 1;
    }
    Some(end)
}

/// A line composed only of `-`, `:`, `|` and whitespace, with at least one `-`
fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '-' | ':' | '|') || c.is_whitespace())
}

/// Parse the lines of a detected table region into table data. Data rows
/// are normalized to the header width: missing trailing cells become
/// empty, extra fields are discarded.
fn parse_table(raw: &str) -> TableData {
    let mut lines = raw
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());

    let header_fields = match lines.next() {
        Some(line) => split_table_row(line),
        None => Vec::new(),
    };
    let width = header_fields.len();

    let mut data = TableData {
        header: header_fields.iter().map(|f| parse_cell_inline(f)).collect(),
        rows: Vec::new(),
    };

    for line in lines {
        if is_table_separator(line) {
            continue;
        }
        let mut fields = split_table_row(line);
        fields.truncate(width);
        while fields.len() < width {
            fields.push(String::new());
        }
        data.rows
            .push(fields.iter().map(|f| parse_cell_inline(f)).collect());
    }

    data
}

/// Split a table line on `|`, trimming fields and discarding the empty
/// leading/trailing fields produced by edge pipes
fn split_table_row(line: &str) -> Vec<String> {
    let mut fields: Vec<String> = line.split('|').map(|f| f.trim().to_string()).collect();
    if fields.first().is_some_and(|f| f.is_empty()) {
        fields.remove(0);
    }
    if fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Resolve inline emphasis in a cell with a fixed, non-recursive
/// substitution: bold, then italic, then inline code, one pass each.
/// Nested or overlapping emphasis is not expected to round-trip.
fn parse_cell_inline(text: &str) -> CellContent {
    let passes: [(&Regex, TextStyle); 3] = [
        (bold_pattern(), TextStyle::bold()),
        (italic_pattern(), TextStyle::italic()),
        (code_pattern(), TextStyle::code()),
    ];

    let mut runs: Vec<TextRun> = vec![TextRun::plain(text)];
    for (pattern, style) in passes {
        runs = runs
            .into_iter()
            .flat_map(|run| {
                if run.style != TextStyle::plain() {
                    vec![run]
                } else {
                    split_styled(&run.text, pattern, style)
                }
            })
            .collect();
    }

    runs.into_iter()
        .filter(|r| !r.is_empty())
        .map(InlineContent::Text)
        .collect()
}

fn split_styled(text: &str, pattern: &Regex, style: TextStyle) -> Vec<TextRun> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let whole = caps.get(0).expect("match always has a whole group");
        let inner = caps.get(1).expect("patterns all have one capture group");
        if whole.start() > last {
            out.push(TextRun::plain(&text[last..whole.start()]));
        }
        out.push(TextRun::new(inner.as_str(), style));
        last = whole.end();
    }
    if last < text.len() {
        out.push(TextRun::plain(&text[last..]));
    }
    out
}

fn bold_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid pattern"))
}

fn italic_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+)\*").expect("valid pattern"))
}

fn code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("valid pattern"))
}
