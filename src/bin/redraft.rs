use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use redraft::assist::generator::LlmClient;
use redraft::assist::session::AssistSession;
use redraft::config::AssistConfig;
use redraft::reconcile::{Segment, segment_markdown};
use redraft::richtext::markdown_converter::{document_to_markdown, markdown_to_document};
use redraft::richtext::structured_editor::StructuredEditor;
use redraft::EditAction;
use redraft::richtext::structured_document::clamp_to_char_boundary;
use redraft::selection::SelectionTracker;
use redraft::surface::SelectionRange;

#[derive(Parser, Debug)]
#[command(name = "redraft")]
#[command(about = "AI-assisted editing for markdown documents", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show how a file decomposes into insertion segments
    Segments {
        /// Markdown or plain-text file to inspect
        file: PathBuf,
    },
    /// Parse markdown into the structured document model and print it
    Render {
        /// Markdown file to parse
        file: PathBuf,
    },
    /// Run an edit action on a byte range of the document
    Edit {
        /// Markdown file to edit
        file: PathBuf,
        /// Action to run (shorten, expand, grammar, formal, casual,
        /// table, bullet, summarize)
        #[arg(long)]
        action: String,
        /// Start of the selection, as a byte offset into the plain text
        #[arg(long)]
        from: usize,
        /// End of the selection, as a byte offset into the plain text
        #[arg(long)]
        to: usize,
        /// Apply the suggestion and write the file back
        #[arg(long)]
        apply: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Segments { file } => {
            let content = fs::read_to_string(&file)?;
            print_segments(&content);
        }
        Commands::Render { file } => {
            let content = fs::read_to_string(&file)?;
            print!("{}", markdown_to_document(&content));
        }
        Commands::Edit {
            file,
            action,
            from,
            to,
            apply,
        } => {
            run_edit(&file, &action, from, to, apply).await?;
        }
    }

    Ok(())
}

fn print_segments(content: &str) {
    for (i, segment) in segment_markdown(content).iter().enumerate() {
        match segment {
            Segment::Table(data) => {
                println!(
                    "[{}] table: {} columns ({}), {} rows",
                    i,
                    data.column_count(),
                    data.header_texts().join(", "),
                    data.rows.len()
                );
            }
            Segment::Markdown(raw) => {
                println!("[{}] markdown: {:?}", i, preview_line(raw));
            }
            Segment::Plain(raw) => {
                println!("[{}] plain: {:?}", i, preview_line(raw));
            }
        }
    }
}

fn preview_line(raw: &str) -> String {
    let line = raw.trim().lines().next().unwrap_or("");
    if line.len() > 60 {
        format!("{}...", &line[..clamp_to_char_boundary(line, 60)])
    } else {
        line.to_string()
    }
}

async fn run_edit(
    file: &PathBuf,
    action_name: &str,
    from: usize,
    to: usize,
    apply: bool,
) -> Result<(), Box<dyn Error>> {
    let action = EditAction::from_name(action_name).ok_or_else(|| {
        let names: Vec<&str> = EditAction::ALL.iter().map(|a| a.name()).collect();
        format!(
            "unknown action '{}', expected one of: {}",
            action_name,
            names.join(", ")
        )
    })?;

    let config = AssistConfig::load()?;
    if config.api_key.is_empty() {
        return Err("no API key configured; set REDRAFT_API_KEY or add api_key to the config file".into());
    }

    let content = fs::read_to_string(file)?;
    let mut editor = StructuredEditor::with_document(markdown_to_document(&content));
    let text = editor.text();

    let range = SelectionRange::new(from.min(text.len()), to.min(text.len()));
    let mut tracker = SelectionTracker::new(config.settle_window());
    tracker.on_selection_change(range, &text);
    let frozen = tracker.freeze()?;

    println!("Selected: {:?}", tracker.active().map(|a| a.preview(40)).unwrap_or_default());

    let generator = LlmClient::new(&config)?;
    let mut session = AssistSession::new();
    session.run_edit(&generator, frozen, action).await?;

    let preview = session.preview().expect("preview exists after run_edit");
    println!("\n== {} ==", action.label());
    println!("--- original ---\n{}", preview.original_text);
    println!(
        "--- suggested ---\n{}",
        preview.suggested_text.as_deref().unwrap_or("")
    );

    if apply {
        session.confirm(&mut editor)?;
        fs::write(file, document_to_markdown(editor.document()))?;
        println!("\nApplied to {}", file.display());
    } else {
        session.cancel();
        println!("\nDry run; pass --apply to write the change back");
    }

    Ok(())
}
