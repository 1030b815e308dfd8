// End-to-end properties of the assist engine: selection freezing, the
// preview state machine, and markdown reconciliation against the in-memory
// document surface, driven by a scripted fake generator.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use redraft::assist::action::EditAction;
use redraft::assist::generator::{GenerationError, TextGenerator};
use redraft::assist::session::{AssistSession, GENERATION_APOLOGY, SessionState};
use redraft::reconcile::insert_markdown_content;
use redraft::richtext::structured_document::BlockType;
use redraft::richtext::structured_editor::StructuredEditor;
use redraft::selection::SelectionTracker;
use redraft::surface::{DocumentEditor, SelectionRange};

/// Replies with a pre-scripted sequence of generation outcomes
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        ScriptedGenerator {
            replies: Mutex::new(replies.into()),
        }
    }

    fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.replies
            .lock()
            .expect("no poisoned lock in tests")
            .pop_front()
            .unwrap_or(Err(GenerationError::Empty))
    }
}

fn editor_with(text: &str) -> StructuredEditor {
    let mut editor = StructuredEditor::new();
    editor.insert_text(text, false).expect("seed text inserts");
    editor
}

fn freeze(editor: &StructuredEditor, start: usize, end: usize) -> redraft::FrozenSelection {
    let mut tracker = SelectionTracker::new(Duration::from_millis(150));
    tracker.on_selection_change(SelectionRange::new(start, end), &editor.text());
    tracker.freeze().expect("selection is non-empty")
}

#[tokio::test]
async fn cancel_is_a_textual_noop() {
    let mut editor = editor_with("The quick brown fox");
    let before = editor.text();

    let frozen = freeze(&editor, 4, 9);
    let generator = ScriptedGenerator::replying("swift");

    let mut session = AssistSession::new();
    session
        .run_edit(&generator, frozen, EditAction::Shorten)
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    session.cancel();
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(editor.text(), before);
}

#[tokio::test]
async fn confirmed_edit_replaces_the_frozen_range_exactly_once() {
    let mut editor = editor_with("Hello old world");
    let frozen = freeze(&editor, 6, 9);
    assert_eq!(frozen.text, "old");

    let generator = ScriptedGenerator::replying("new");
    let mut session = AssistSession::new();
    session
        .run_edit(&generator, frozen, EditAction::Grammar)
        .await
        .unwrap();

    session.confirm(&mut editor).unwrap();
    assert_eq!(editor.text(), "Hello new world");

    // A second confirm has nothing to act on: no duplicate insertion
    assert!(session.confirm(&mut editor).is_err());
    assert_eq!(editor.text(), "Hello new world");
}

#[tokio::test]
async fn frozen_range_wins_over_live_selection_changes() {
    let mut editor = editor_with("Hello old world");
    let frozen = freeze(&editor, 6, 9);

    let generator = ScriptedGenerator::replying("new");
    let mut session = AssistSession::new();
    session
        .run_edit(&generator, frozen, EditAction::Grammar)
        .await
        .unwrap();

    // The live selection moves while the preview is open
    editor.set_selection_range(SelectionRange::new(0, 5));

    session.confirm(&mut editor).unwrap();
    assert_eq!(editor.text(), "Hello new world");
}

#[tokio::test]
async fn table_suggestion_round_trips_into_a_table_node() {
    let mut editor = editor_with("some data");
    let frozen = freeze(&editor, 0, 9);

    let generator = ScriptedGenerator::replying("| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |");
    let mut session = AssistSession::new();
    session
        .run_edit(&generator, frozen, EditAction::Table)
        .await
        .unwrap();
    session.confirm(&mut editor).unwrap();

    let tables: Vec<_> = editor
        .document()
        .blocks()
        .iter()
        .filter_map(|b| match &b.block_type {
            BlockType::Table(data) => Some(data.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].header_texts(), vec!["A", "B"]);
    assert_eq!(tables[0].row_texts(), vec![vec!["1", "2"], vec!["3", "4"]]);
}

#[tokio::test]
async fn mixed_content_keeps_document_order() {
    let mut editor = editor_with("placeholder");
    let frozen = freeze(&editor, 0, 11);

    let generator =
        ScriptedGenerator::replying("Intro\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\nOutro");
    let mut session = AssistSession::new();
    session
        .run_edit(&generator, frozen, EditAction::Expand)
        .await
        .unwrap();
    session.confirm(&mut editor).unwrap();

    let blocks = editor.document().blocks();
    let intro = blocks
        .iter()
        .position(|b| b.to_plain_text().contains("Intro"))
        .expect("intro block exists");
    let table = blocks
        .iter()
        .position(|b| b.is_table())
        .expect("table block exists");
    let outro = blocks
        .iter()
        .position(|b| b.to_plain_text().contains("Outro"))
        .expect("outro block exists");

    assert!(intro < table, "intro must precede the table");
    assert!(table < outro, "table must precede the outro");
}

#[tokio::test]
async fn two_tables_insert_independently() {
    let table = "| A | B |\n|---|---|\n| 1 | 2 |";
    let reply = format!("first\n\n{}\n\nbetween\n\n{}\n\nlast", table, table);

    let mut editor = editor_with("x");
    let frozen = freeze(&editor, 0, 1);
    let generator = ScriptedGenerator::replying(&reply);

    let mut session = AssistSession::new();
    session
        .run_edit(&generator, frozen, EditAction::Expand)
        .await
        .unwrap();
    session.confirm(&mut editor).unwrap();

    let table_count = editor
        .document()
        .blocks()
        .iter()
        .filter(|b| b.is_table())
        .count();
    assert_eq!(table_count, 2);
    assert!(editor.text().contains("between"));
}

#[tokio::test]
async fn generation_failure_reaches_ready_with_apology() {
    let mut editor = editor_with("Hello world");
    let before = editor.text();
    let frozen = freeze(&editor, 0, 5);

    let generator = ScriptedGenerator::new(vec![Err(GenerationError::Empty)]);
    let mut session = AssistSession::new();
    session
        .run_edit(&generator, frozen, EditAction::Formal)
        .await
        .unwrap();

    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(
        session.preview().unwrap().suggested_text.as_deref(),
        Some(GENERATION_APOLOGY)
    );

    // The user can regenerate from here and get a good result
    let retry = ScriptedGenerator::replying("Greetings");
    session.run_regenerate(&retry).await.unwrap();
    session.confirm(&mut editor).unwrap();
    assert_eq!(editor.text(), "Greetings world");
    assert_ne!(editor.text(), before);
}

#[tokio::test]
async fn malformed_suggestions_always_insert_something() {
    let inputs = [
        "```rust\nfn broken( {",
        "| a | b\n|---\n| c",
        "***",
        "plain text\nwith lines",
    ];

    for input in inputs {
        let mut editor = editor_with("seed text");
        let frozen = freeze(&editor, 0, 9);
        let generator = ScriptedGenerator::replying(input);

        let mut session = AssistSession::new();
        session
            .run_edit(&generator, frozen, EditAction::Expand)
            .await
            .unwrap();
        session.confirm(&mut editor).unwrap();

        assert!(
            !editor.text().trim().is_empty(),
            "nothing inserted for {:?}",
            input
        );
    }
}

#[test]
fn reconciler_direct_insertion_replaces_range() {
    let mut editor = editor_with("aaa bbb ccc");
    insert_markdown_content(&mut editor, SelectionRange::new(4, 7), "# B\n\n- one\n- two");

    let blocks = editor.document().blocks();
    assert!(
        blocks
            .iter()
            .any(|b| matches!(b.block_type, BlockType::Heading { level: 1 }))
    );
    assert!(
        blocks
            .iter()
            .any(|b| matches!(b.block_type, BlockType::ListItem { .. }))
    );
    let text = editor.text();
    assert!(text.contains("aaa"));
    assert!(text.contains("ccc"));
    assert!(!text.contains("bbb"));
}

#[test]
fn settled_empty_selection_blocks_new_requests() {
    let editor = editor_with("Hello world");
    let mut tracker = SelectionTracker::new(Duration::from_millis(50));

    tracker.on_selection_change(SelectionRange::new(0, 5), &editor.text());
    tracker.on_selection_change(SelectionRange::caret(5), &editor.text());

    // Within the settle window the selection still freezes
    assert!(tracker.freeze().is_ok());

    std::thread::sleep(Duration::from_millis(60));
    tracker.tick();
    assert!(tracker.freeze().is_err());
}
