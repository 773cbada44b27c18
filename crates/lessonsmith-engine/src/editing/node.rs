use thiserror::Error;

/// Node type discriminant used by schema rules and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading,
    List,
    ListItem,
    CodeBlock,
    Text,
}

impl NodeKind {
    /// Whether children of this kind may appear directly under `self`.
    ///
    /// These rules are the whole schema:
    /// - the document holds block nodes
    /// - lists hold list items, list items hold block nodes
    /// - text blocks (paragraph, heading, code block) hold text leaves
    /// - text leaves hold nothing
    pub fn allows_child(self, child: NodeKind) -> bool {
        match self {
            NodeKind::Document => matches!(
                child,
                NodeKind::Paragraph | NodeKind::Heading | NodeKind::List | NodeKind::CodeBlock
            ),
            NodeKind::List => child == NodeKind::ListItem,
            NodeKind::ListItem => matches!(
                child,
                NodeKind::Paragraph | NodeKind::List | NodeKind::CodeBlock
            ),
            NodeKind::Paragraph | NodeKind::Heading | NodeKind::CodeBlock => {
                child == NodeKind::Text
            }
            NodeKind::Text => false,
        }
    }

    /// Text blocks are the nodes whose content is a run of text leaves.
    pub fn is_textblock(self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading | NodeKind::CodeBlock
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::Document => "document",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::List => "list",
            NodeKind::ListItem => "list item",
            NodeKind::CodeBlock => "code block",
            NodeKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// A transaction or decoded tree would violate the document schema.
///
/// Every variant is a fail-closed condition: the mutation engine rejects the
/// whole transaction and the prior document state stays current.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("{child} is not allowed inside {parent}")]
    IllegalChild { parent: NodeKind, child: NodeKind },
    #[error("{kind} must contain at least one child")]
    MissingContent { kind: NodeKind },
    #[error("heading level {level} is outside 1..=6")]
    BadHeadingLevel { level: u8 },
    #[error("position {pos} is out of bounds for a document of size {size}")]
    OutOfBounds { pos: usize, size: usize },
    #[error("invalid range {from}..{to}")]
    InvalidRange { from: usize, to: usize },
    #[error("position {pos} is not on a character boundary")]
    NotCharBoundary { pos: usize },
    #[error("range {from}..{to} splits a node boundary it does not contain")]
    SplitsNodeBoundary { from: usize, to: usize },
}

/// A node in the lesson document tree.
///
/// The tree is plain data: block structure down to text leaves, with the
/// schema in [`NodeKind::allows_child`] deciding what may nest where. The
/// concatenated leaf text in document order is the document's plain text.
///
/// ## Position addressing
///
/// Positions are byte-granular units over the tree. Every character of a text
/// leaf occupies one unit, and every non-root node contributes a single
/// trailing boundary unit after its content. The root contributes no boundary
/// of its own, so the first character of the first leaf sits at position 0.
/// Leaves in different blocks are therefore separated by boundary units, which
/// is why positions are not plain concatenated-text offsets once a document
/// has more than one block.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Document { children: Vec<Node> },
    Paragraph { children: Vec<Node> },
    Heading { level: u8, children: Vec<Node> },
    List { ordered: bool, children: Vec<Node> },
    ListItem { children: Vec<Node> },
    CodeBlock { lang: Option<String>, children: Vec<Node> },
    Text { text: String },
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document { .. } => NodeKind::Document,
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Heading { .. } => NodeKind::Heading,
            Node::List { .. } => NodeKind::List,
            Node::ListItem { .. } => NodeKind::ListItem,
            Node::CodeBlock { .. } => NodeKind::CodeBlock,
            Node::Text { .. } => NodeKind::Text,
        }
    }

    /// Text leaf carrying literal character content.
    pub fn text(text: impl Into<String>) -> Node {
        Node::Text { text: text.into() }
    }

    /// Paragraph wrapping a single text leaf, or an empty paragraph for "".
    pub fn paragraph(text: &str) -> Node {
        let children = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(text)]
        };
        Node::Paragraph { children }
    }

    pub fn heading(level: u8, text: &str) -> Node {
        Node::Heading {
            level,
            children: vec![Node::text(text)],
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::CodeBlock { children, .. } => children,
            Node::Text { .. } => &[],
        }
    }

    /// Mutable child list; `None` for text leaves, which have no children.
    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children }
            | Node::Paragraph { children }
            | Node::Heading { children, .. }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::CodeBlock { children, .. } => Some(children),
            Node::Text { .. } => None,
        }
    }

    /// Total position units this node occupies in its parent's content.
    pub fn size(&self) -> usize {
        match self {
            Node::Text { text } => text.len(),
            Node::Document { children } => children.iter().map(Node::size).sum(),
            _ => self.content_size() + 1,
        }
    }

    /// Position units occupied by this node's content, without the trailing
    /// boundary unit.
    pub fn content_size(&self) -> usize {
        self.children().iter().map(Node::size).sum()
    }

    /// Check this subtree against the schema.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        match self {
            Node::Heading { level, .. } if !(1..=6).contains(level) => {
                return Err(SchemaViolation::BadHeadingLevel { level: *level });
            }
            Node::Document { children } | Node::ListItem { children } if children.is_empty() => {
                return Err(SchemaViolation::MissingContent { kind: self.kind() });
            }
            Node::List { children, .. } if children.is_empty() => {
                return Err(SchemaViolation::MissingContent { kind: NodeKind::List });
            }
            _ => {}
        }
        for child in self.children() {
            if !self.kind().allows_child(child.kind()) {
                return Err(SchemaViolation::IllegalChild {
                    parent: self.kind(),
                    child: child.kind(),
                });
            }
            child.validate()?;
        }
        Ok(())
    }

    /// Collect text leaves in document order with their absolute start
    /// positions.
    pub(crate) fn collect_leaves<'a>(&'a self, pos: &mut usize, out: &mut Vec<(usize, &'a str)>) {
        match self {
            Node::Text { text } => {
                out.push((*pos, text));
                *pos += text.len();
            }
            _ => {
                for child in self.children() {
                    child.collect_leaves(pos, out);
                }
                if !matches!(self, Node::Document { .. }) {
                    *pos += 1; // trailing boundary unit
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(children: Vec<Node>) -> Node {
        Node::Document { children }
    }

    // ============ Schema tests ============

    #[test]
    fn test_schema_accepts_basic_lesson_shape() {
        let root = doc(vec![
            Node::heading(1, "Title"),
            Node::paragraph("Body text."),
            Node::List {
                ordered: false,
                children: vec![Node::ListItem {
                    children: vec![Node::paragraph("item")],
                }],
            },
        ]);
        assert_eq!(root.validate(), Ok(()));
    }

    #[test]
    fn test_schema_rejects_heading_inside_paragraph() {
        let root = doc(vec![Node::Paragraph {
            children: vec![Node::heading(2, "nested")],
        }]);
        assert_eq!(
            root.validate(),
            Err(SchemaViolation::IllegalChild {
                parent: NodeKind::Paragraph,
                child: NodeKind::Heading,
            })
        );
    }

    #[test]
    fn test_schema_rejects_bad_heading_level() {
        let root = doc(vec![Node::heading(7, "too deep")]);
        assert_eq!(
            root.validate(),
            Err(SchemaViolation::BadHeadingLevel { level: 7 })
        );
    }

    #[test]
    fn test_schema_rejects_empty_list() {
        let root = doc(vec![Node::List {
            ordered: true,
            children: vec![],
        }]);
        assert_eq!(
            root.validate(),
            Err(SchemaViolation::MissingContent {
                kind: NodeKind::List
            })
        );
    }

    #[test]
    fn test_schema_rejects_empty_document() {
        let root = doc(vec![]);
        assert_eq!(
            root.validate(),
            Err(SchemaViolation::MissingContent {
                kind: NodeKind::Document
            })
        );
    }

    #[test]
    fn test_empty_paragraph_is_legal() {
        let root = doc(vec![Node::paragraph("")]);
        assert_eq!(root.validate(), Ok(()));
    }

    // ============ Position sizing tests ============

    #[test]
    fn test_text_leaf_size_is_byte_length() {
        assert_eq!(Node::text("hello").size(), 5);
        assert_eq!(Node::text("").size(), 0);
        // Multibyte characters are measured in bytes, like every position unit.
        assert_eq!(Node::text("héllo").size(), 6);
    }

    #[test]
    fn test_block_size_adds_one_boundary_unit() {
        assert_eq!(Node::paragraph("hello").size(), 6);
        assert_eq!(Node::paragraph("").size(), 1);
        assert_eq!(Node::heading(1, "Title").size(), 6);
    }

    #[test]
    fn test_document_size_has_no_own_boundary() {
        let root = doc(vec![Node::heading(1, "Title"), Node::paragraph("Hello")]);
        // 5 chars + boundary, then 5 chars + boundary.
        assert_eq!(root.size(), 12);
    }

    #[test]
    fn test_nested_list_sizing() {
        let root = doc(vec![Node::List {
            ordered: false,
            children: vec![Node::ListItem {
                children: vec![Node::paragraph("ab")],
            }],
        }]);
        // text 2 + paragraph boundary 1 + item boundary 1 + list boundary 1
        assert_eq!(root.size(), 5);
    }

    // ============ Leaf collection tests ============

    #[test]
    fn test_leaves_carry_boundary_separated_positions() {
        let root = doc(vec![Node::heading(1, "Title"), Node::paragraph("Hello")]);
        let mut pos = 0;
        let mut leaves = Vec::new();
        root.collect_leaves(&mut pos, &mut leaves);
        // "Hello" starts at 6, not at the concatenated-text offset 5: the
        // heading's boundary unit sits between the two leaves.
        assert_eq!(leaves, vec![(0, "Title"), (6, "Hello")]);
        assert_eq!(pos, root.size());
    }
}
