// Markdown Converter
// Converts between StructuredDocument and markdown text.
// Markdown is the interchange format for generator output and files.

use super::markdown_ast::{ASTNode, Document as ASTDocument, NodeType};
use super::markdown_parser::parse_markdown;
use super::structured_document::*;

/// Convert markdown text to a StructuredDocument (always at least one block)
pub fn markdown_to_document(markdown: &str) -> StructuredDocument {
    let mut doc = StructuredDocument::new();
    for block in markdown_to_blocks(markdown) {
        doc.add_block(block);
    }
    if doc.is_empty() {
        doc.add_block(Block::paragraph(0));
    }
    doc
}

/// Convert markdown text to an ordered sequence of blocks.
/// Returns an empty vector when nothing block-like could be parsed.
pub fn markdown_to_blocks(markdown: &str) -> Vec<Block> {
    let ast_doc = parse_markdown(markdown);
    ast_to_blocks(&ast_doc)
}

/// Convert a StructuredDocument to markdown text
pub fn document_to_markdown(doc: &StructuredDocument) -> String {
    let mut output = String::new();

    for (i, block) in doc.blocks().iter().enumerate() {
        if i > 0 {
            output.push_str("\n\n");
        }

        match &block.block_type {
            BlockType::Paragraph => {
                output.push_str(&inline_content_to_markdown(&block.content));
            }
            BlockType::Heading { level } => {
                output.push_str(&"#".repeat(*level as usize));
                output.push(' ');
                output.push_str(&inline_content_to_markdown(&block.content));
            }
            BlockType::CodeBlock { language } => {
                output.push_str("```");
                if let Some(lang) = language {
                    output.push_str(lang);
                }
                output.push('\n');
                output.push_str(&block.to_plain_text());
                output.push_str("\n```");
            }
            BlockType::BlockQuote => {
                output.push_str("> ");
                output.push_str(&inline_content_to_markdown(&block.content));
            }
            BlockType::ListItem { ordered, number } => {
                if *ordered {
                    match number {
                        Some(n) => output.push_str(&format!("{}. ", n)),
                        None => output.push_str("1. "),
                    }
                } else {
                    output.push_str("- ");
                }
                output.push_str(&inline_content_to_markdown(&block.content));
            }
            BlockType::Table(data) => {
                output.push_str(&table_to_markdown(data));
            }
        }
    }

    output
}

/// Serialize a table as a GitHub-style pipe table
fn table_to_markdown(data: &TableData) -> String {
    let mut lines: Vec<String> = Vec::new();

    let header: Vec<String> = data
        .header
        .iter()
        .map(|c| inline_content_to_markdown(c))
        .collect();
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!(
        "| {} |",
        vec!["---"; data.header.len().max(1)].join(" | ")
    ));

    for row in &data.rows {
        let cells: Vec<String> = row.iter().map(|c| inline_content_to_markdown(c)).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.join("\n")
}

/// Convert inline content to markdown
fn inline_content_to_markdown(content: &[InlineContent]) -> String {
    let mut output = String::new();

    for item in content {
        match item {
            InlineContent::Text(run) => {
                let text = &run.text;

                // Code spans override the other styles
                let styled = if run.style.code {
                    format!("`{}`", text)
                } else {
                    let mut result = text.clone();

                    if run.style.strikethrough {
                        result = format!("~~{}~~", result);
                    }

                    if run.style.bold && run.style.italic {
                        result = format!("***{}***", result);
                    } else if run.style.bold {
                        result = format!("**{}**", result);
                    } else if run.style.italic {
                        result = format!("*{}*", result);
                    }

                    result
                };
                output.push_str(&styled);
            }
            InlineContent::Link { link, content } => {
                output.push('[');
                output.push_str(&inline_content_to_markdown(content));
                output.push_str("](");
                output.push_str(&link.destination);
                if let Some(title) = &link.title {
                    output.push_str(" \"");
                    output.push_str(title);
                    output.push('"');
                }
                output.push(')');
            }
            InlineContent::LineBreak => {
                output.push(' ');
            }
            InlineContent::HardBreak => {
                output.push_str("  \n");
            }
        }
    }

    output
}

/// Convert an AST to an ordered block sequence
fn ast_to_blocks(ast_doc: &ASTDocument) -> Vec<Block> {
    let mut blocks = Vec::new();

    for child in &ast_doc.root.children {
        ast_node_to_blocks(child, &mut blocks);
    }

    blocks
}

/// Convert an AST node to one or more blocks (lists expand to one block per item)
fn ast_node_to_blocks(node: &ASTNode, blocks: &mut Vec<Block>) {
    match &node.node_type {
        NodeType::List { ordered, start } => {
            for (idx, child) in node.children.iter().enumerate() {
                if let NodeType::ListItem = child.node_type {
                    let number = if *ordered {
                        Some(start + idx as u64)
                    } else {
                        None
                    };

                    let mut block = Block::new(
                        0,
                        BlockType::ListItem {
                            ordered: *ordered,
                            number,
                        },
                    );
                    block.content = ast_node_to_inline_content(child);
                    blocks.push(block);
                }
            }
        }
        NodeType::Table => {
            blocks.push(Block::table(0, ast_table_to_data(node)));
        }
        _ => {
            if let Some(block) = ast_node_to_block(node) {
                blocks.push(block);
            }
        }
    }
}

/// Build table data from a Table AST node
fn ast_table_to_data(node: &ASTNode) -> TableData {
    let mut data = TableData::default();

    for child in &node.children {
        match &child.node_type {
            NodeType::TableHead => {
                data.header = collect_row_cells(child);
            }
            NodeType::TableRow => {
                data.rows.push(collect_row_cells(child));
            }
            _ => {}
        }
    }

    data
}

/// Collect the cells of a table head or row node
fn collect_row_cells(node: &ASTNode) -> Vec<CellContent> {
    let mut cells = Vec::new();
    for child in &node.children {
        match &child.node_type {
            NodeType::TableCell => cells.push(ast_node_to_inline_content(child)),
            // Some producers nest cells one level deeper
            NodeType::TableRow => cells.extend(collect_row_cells(child)),
            _ => {}
        }
    }
    cells
}

/// Convert a non-list, non-table AST node to a Block
fn ast_node_to_block(node: &ASTNode) -> Option<Block> {
    let id = 0; // Assigned by the document

    match &node.node_type {
        NodeType::Paragraph => {
            let mut block = Block::paragraph(id);
            block.content = ast_node_to_inline_content(node);
            Some(block)
        }
        NodeType::Heading { level } => {
            let mut block = Block::heading(id, *level);
            block.content = ast_node_to_inline_content(node);
            Some(block)
        }
        NodeType::CodeBlock { language } => {
            let mut block = Block::new(
                id,
                BlockType::CodeBlock {
                    language: language.clone(),
                },
            );
            let text = node.flatten_text();
            // Fenced content keeps a trailing newline from the parser
            let text = text.strip_suffix('\n').unwrap_or(&text).to_string();
            block.content = vec![InlineContent::Text(TextRun::plain(text))];
            Some(block)
        }
        NodeType::BlockQuote => {
            let mut block = Block::new(id, BlockType::BlockQuote);
            block.content = ast_node_to_inline_content(node);
            Some(block)
        }
        NodeType::ListItem => {
            let mut block = Block::new(
                id,
                BlockType::ListItem {
                    ordered: false,
                    number: None,
                },
            );
            block.content = ast_node_to_inline_content(node);
            Some(block)
        }
        _ => None,
    }
}

/// Convert AST node children to inline content
fn ast_node_to_inline_content(node: &ASTNode) -> Vec<InlineContent> {
    let mut content = Vec::new();

    for child in &node.children {
        match &child.node_type {
            NodeType::Text {
                content: text,
                style,
            } => {
                content.push(InlineContent::Text(TextRun::new(text, *style)));
            }
            NodeType::Code { content: text } => {
                content.push(InlineContent::Text(TextRun::new(text, TextStyle::code())));
            }
            NodeType::Link { destination, title } => {
                let link = Link {
                    destination: destination.clone(),
                    title: title.clone(),
                };
                let link_content = ast_node_to_inline_content(child);
                content.push(InlineContent::Link {
                    link,
                    content: link_content,
                });
            }
            NodeType::SoftBreak => {
                content.push(InlineContent::LineBreak);
            }
            NodeType::HardBreak => {
                content.push(InlineContent::HardBreak);
            }
            _ => {
                // Recursively process container nodes
                if child.node_type.can_have_children() {
                    content.extend(ast_node_to_inline_content(child));
                }
            }
        }
    }

    content
}
