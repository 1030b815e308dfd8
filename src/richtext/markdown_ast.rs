// Markdown Abstract Syntax Tree
// Represents the parsed structure of a markdown fragment

use super::structured_document::TextStyle;

/// Unique identifier for AST nodes
pub type NodeId = usize;

/// Types of markdown nodes
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// Root document node
    Document,

    /// Block-level elements
    Paragraph,
    Heading {
        level: u8,
    }, // 1-6
    CodeBlock {
        language: Option<String>,
    },
    BlockQuote,
    List {
        ordered: bool,
        start: u64,
    },
    ListItem,
    ThematicBreak,
    Table,
    TableHead,
    TableRow,
    TableCell,

    /// Inline elements
    Text {
        content: String,
        style: TextStyle,
    },
    SoftBreak,
    HardBreak,
    Link {
        destination: String,
        title: Option<String>,
    },
    Image {
        destination: String,
        title: Option<String>,
    },
    Code {
        content: String,
    },
}

impl NodeType {
    /// Returns true if this node type is a block-level element
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeType::Document
                | NodeType::Paragraph
                | NodeType::Heading { .. }
                | NodeType::CodeBlock { .. }
                | NodeType::BlockQuote
                | NodeType::List { .. }
                | NodeType::ListItem
                | NodeType::ThematicBreak
                | NodeType::Table
                | NodeType::TableHead
                | NodeType::TableRow
        )
    }

    /// Returns true if this node can have children
    pub fn can_have_children(&self) -> bool {
        !matches!(
            self,
            NodeType::Text { .. }
                | NodeType::SoftBreak
                | NodeType::HardBreak
                | NodeType::Code { .. }
                | NodeType::ThematicBreak
        )
    }
}

/// An AST node representing an element in the parsed tree
#[derive(Debug, Clone)]
pub struct ASTNode {
    pub id: NodeId,
    pub node_type: NodeType,

    /// Byte position range in the source text
    pub char_start: usize,
    pub char_end: usize,

    pub children: Vec<ASTNode>,
}

impl ASTNode {
    pub fn new(id: NodeId, node_type: NodeType, char_start: usize, char_end: usize) -> Self {
        ASTNode {
            id,
            node_type,
            char_start,
            char_end,
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: ASTNode) {
        self.children.push(child);
    }

    /// Get all text content recursively (flattened)
    pub fn flatten_text(&self) -> String {
        let mut result = String::new();
        self.flatten_text_recursive(&mut result);
        result
    }

    fn flatten_text_recursive(&self, buffer: &mut String) {
        match &self.node_type {
            NodeType::Text { content, .. } => {
                buffer.push_str(content);
            }
            NodeType::Code { content } => {
                buffer.push_str(content);
            }
            NodeType::SoftBreak => {
                buffer.push(' ');
            }
            NodeType::HardBreak => {
                buffer.push('\n');
            }
            _ => {
                for child in &self.children {
                    child.flatten_text_recursive(buffer);
                }
            }
        }
    }
}

/// The complete parsed tree for one markdown fragment
pub struct Document {
    pub root: ASTNode,
    pub source: String,
    next_id: NodeId,
}

impl Document {
    pub fn new() -> Self {
        let root = ASTNode::new(0, NodeType::Document, 0, 0);

        Document {
            root,
            source: String::new(),
            next_id: 1,
        }
    }

    /// Get the next available node ID
    pub fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Get the plain text representation
    pub fn to_text(&self) -> String {
        self.root.flatten_text()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
