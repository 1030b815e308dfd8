// Markdown Parser - converts pulldown-cmark events into our AST
use super::markdown_ast::*;
use super::structured_document::TextStyle;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// Parse markdown text into an AST
pub fn parse_markdown(text: &str) -> Document {
    let mut doc = Document::new();
    doc.source = text.to_string();

    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(text, options).into_offset_iter();

    // Stack of open container nodes
    let mut node_stack: Vec<ASTNode> = Vec::new();

    // Stack of the current text style (for nested emphasis/strong)
    let mut style_stack: Vec<TextStyle> = vec![TextStyle::default()];

    for (event, range) in parser {
        match event {
            Event::Start(tag) => {
                match &tag {
                    Tag::Emphasis => {
                        let mut new_style = style_stack.last().copied().unwrap_or_default();
                        new_style.italic = true;
                        style_stack.push(new_style);
                    }
                    Tag::Strong => {
                        let mut new_style = style_stack.last().copied().unwrap_or_default();
                        new_style.bold = true;
                        style_stack.push(new_style);
                    }
                    Tag::Strikethrough => {
                        let mut new_style = style_stack.last().copied().unwrap_or_default();
                        new_style.strikethrough = true;
                        style_stack.push(new_style);
                    }
                    _ => {}
                }

                let node = create_node_from_tag(&mut doc, tag, range.start, range.end);
                node_stack.push(node);
            }

            Event::End(tag_end) => {
                match &tag_end {
                    TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                        if style_stack.len() > 1 {
                            style_stack.pop();
                        }
                    }
                    _ => {}
                }

                if let Some(completed) = node_stack.pop() {
                    if verify_tag_match(&completed.node_type, &tag_end) {
                        let mut node = completed;
                        node.char_end = range.end;

                        if let Some(parent) = node_stack.last_mut() {
                            parent.add_child(node);
                        } else {
                            doc.root.add_child(node);
                        }
                    } else {
                        // Tag mismatch - put it back (shouldn't happen with valid markdown)
                        node_stack.push(completed);
                    }
                }
            }

            Event::Text(text_content) => {
                let style = style_stack.last().copied().unwrap_or_default();
                let node = ASTNode::new(
                    doc.next_id(),
                    NodeType::Text {
                        content: text_content.to_string(),
                        style,
                    },
                    range.start,
                    range.end,
                );
                if let Some(parent) = node_stack.last_mut() {
                    parent.add_child(node);
                } else {
                    doc.root.add_child(node);
                }
            }

            Event::Code(code_content) => {
                let node = ASTNode::new(
                    doc.next_id(),
                    NodeType::Code {
                        content: code_content.to_string(),
                    },
                    range.start,
                    range.end,
                );
                if let Some(parent) = node_stack.last_mut() {
                    parent.add_child(node);
                } else {
                    doc.root.add_child(node);
                }
            }

            Event::SoftBreak => {
                let node = ASTNode::new(doc.next_id(), NodeType::SoftBreak, range.start, range.end);
                if let Some(parent) = node_stack.last_mut() {
                    parent.add_child(node);
                } else {
                    doc.root.add_child(node);
                }
            }

            Event::HardBreak => {
                let node = ASTNode::new(doc.next_id(), NodeType::HardBreak, range.start, range.end);
                if let Some(parent) = node_stack.last_mut() {
                    parent.add_child(node);
                } else {
                    doc.root.add_child(node);
                }
            }

            Event::Rule => {
                let node = ASTNode::new(
                    doc.next_id(),
                    NodeType::ThematicBreak,
                    range.start,
                    range.end,
                );
                if let Some(parent) = node_stack.last_mut() {
                    parent.add_child(node);
                } else {
                    doc.root.add_child(node);
                }
            }

            _ => {
                // Ignore other events (HTML, footnotes, task list markers, ...)
            }
        }
    }

    doc.root.char_end = text.len();

    doc
}

/// Create an AST node from a pulldown-cmark Tag
fn create_node_from_tag(doc: &mut Document, tag: Tag, start: usize, end: usize) -> ASTNode {
    let node_type = match tag {
        Tag::Paragraph => NodeType::Paragraph,

        Tag::Heading { level, .. } => NodeType::Heading { level: level as u8 },

        Tag::BlockQuote(_) => NodeType::BlockQuote,

        Tag::CodeBlock(kind) => {
            let language = match kind {
                pulldown_cmark::CodeBlockKind::Indented => None,
                pulldown_cmark::CodeBlockKind::Fenced(info) => {
                    info.split_whitespace().next().map(String::from)
                }
            };

            NodeType::CodeBlock { language }
        }

        Tag::List(start_number) => NodeType::List {
            ordered: start_number.is_some(),
            start: start_number.unwrap_or(1),
        },

        Tag::Item => NodeType::ListItem,

        Tag::Link {
            dest_url, title, ..
        } => NodeType::Link {
            destination: dest_url.to_string(),
            title: if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            },
        },

        Tag::Image {
            dest_url, title, ..
        } => NodeType::Image {
            destination: dest_url.to_string(),
            title: if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            },
        },

        Tag::Table(_) => NodeType::Table,
        Tag::TableHead => NodeType::TableHead,
        Tag::TableRow => NodeType::TableRow,
        Tag::TableCell => NodeType::TableCell,

        // Emphasis/strong/strikethrough are tracked via the style stack;
        // the container node itself is a plain passthrough.
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough => NodeType::Paragraph,

        _ => NodeType::Paragraph,
    };

    ASTNode::new(doc.next_id(), node_type, start, end)
}

/// Verify that a tag end matches the node type
fn verify_tag_match(node_type: &NodeType, tag_end: &TagEnd) -> bool {
    match (node_type, tag_end) {
        (NodeType::Paragraph, TagEnd::Paragraph) => true,
        (NodeType::Heading { .. }, TagEnd::Heading(_)) => true,
        (NodeType::BlockQuote, TagEnd::BlockQuote(_)) => true,
        (NodeType::CodeBlock { .. }, TagEnd::CodeBlock) => true,
        (NodeType::List { .. }, TagEnd::List(_)) => true,
        (NodeType::ListItem, TagEnd::Item) => true,
        (NodeType::Link { .. }, TagEnd::Link) => true,
        (NodeType::Image { .. }, TagEnd::Image) => true,
        (NodeType::Table, TagEnd::Table) => true,
        (NodeType::TableHead, TagEnd::TableHead) => true,
        (NodeType::TableRow, TagEnd::TableRow) => true,
        (NodeType::TableCell, TagEnd::TableCell) => true,
        // Emphasis containers use Paragraph as a passthrough type
        (NodeType::Paragraph, TagEnd::Strong) => true,
        (NodeType::Paragraph, TagEnd::Emphasis) => true,
        (NodeType::Paragraph, TagEnd::Strikethrough) => true,
        // Raw HTML blocks also pass through as paragraphs
        (NodeType::Paragraph, TagEnd::HtmlBlock) => true,
        _ => false,
    }
}
