//! Bidirectional conversion between serialized lesson markdown and the
//! document tree.
//!
//! `decode` is total: any input string, including the empty string, produces a
//! valid document (at minimum a single empty paragraph, so a cursor always has
//! somewhere to attach). It runs on initial load and on every streamed
//! replacement chunk, so it stays a single pass over the event stream with no
//! intermediate allocation beyond the tree itself.
//!
//! `encode` never fails. Nodes the encoder does not expect at a given spot are
//! rendered best-effort from their text content and logged, never propagated
//! as an error.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::editing::document::DocumentState;
use crate::editing::node::{Node, NodeKind};

/// Decode serialized markdown into a document state.
pub fn decode(serialized: &str) -> DocumentState {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(serialized, Options::empty()) {
        builder.event(event);
    }
    DocumentState::from_root(builder.finish())
}

/// Encode a document state back to serialized markdown.
pub fn encode(state: &DocumentState) -> String {
    let mut out = String::new();
    for child in state.root().children() {
        encode_block(child, "", &mut out);
    }
    out.truncate(out.trim_end().len());
    out
}

/// Incremental tree builder over the markdown event stream.
///
/// Inline formatting the model does not represent (emphasis, links, inline
/// code spans) is flattened to its text content. Text arriving outside a text
/// block opens an implicit paragraph, which covers tight list items and any
/// structure the parser emits without an explicit paragraph wrapper.
struct TreeBuilder {
    stack: Vec<Frame>,
}

struct Frame {
    node: Node,
    /// Implicitly opened paragraph, closed by the next block event.
    auto: bool,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame {
                node: Node::Document {
                    children: Vec::new(),
                },
                auto: false,
            }],
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.text(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.text("\n"),
            // Thematic breaks and other constructs without a model
            // counterpart decode to nothing.
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open(Node::Paragraph {
                children: Vec::new(),
            }),
            Tag::Heading { level, .. } => self.open(Node::Heading {
                level: level as u8,
                children: Vec::new(),
            }),
            Tag::List(start) => self.open(Node::List {
                ordered: start.is_some(),
                children: Vec::new(),
            }),
            Tag::Item => self.open(Node::ListItem {
                children: Vec::new(),
            }),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        let lang = info.split_whitespace().next().unwrap_or("");
                        (!lang.is_empty()).then(|| lang.to_string())
                    }
                    CodeBlockKind::Indented => None,
                };
                self.open(Node::CodeBlock {
                    lang,
                    children: Vec::new(),
                });
            }
            // Block quotes are flattened: their inner blocks land in the
            // surrounding container. Inline formatting tags are skipped and
            // their text content arrives as plain text events.
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        let kind = match tag {
            TagEnd::Paragraph => NodeKind::Paragraph,
            TagEnd::Heading(_) => NodeKind::Heading,
            TagEnd::List(_) => NodeKind::List,
            TagEnd::Item => NodeKind::ListItem,
            TagEnd::CodeBlock => NodeKind::CodeBlock,
            _ => return,
        };
        if self.top().auto && kind != NodeKind::Paragraph {
            self.close_top();
        }
        if self.top().node.kind() == kind {
            self.close_top();
        }
        // A mismatched end event is dropped; decode stays total.
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.top().node.kind().is_textblock() {
            self.stack.push(Frame {
                node: Node::Paragraph {
                    children: Vec::new(),
                },
                auto: true,
            });
        }
        let children = self
            .top_mut()
            .node
            .children_mut()
            .expect("text blocks have a child list");
        if let Some(Node::Text { text: last }) = children.last_mut() {
            last.push_str(text);
        } else {
            children.push(Node::text(text));
        }
    }

    fn open(&mut self, node: Node) {
        if self.top().auto {
            self.close_top();
        }
        self.stack.push(Frame { node, auto: false });
    }

    fn close_top(&mut self) {
        debug_assert!(self.stack.len() > 1);
        let Frame { mut node, .. } = self.stack.pop().expect("document frame stays on the stack");
        if let Node::ListItem { children } = &mut node
            && children.is_empty()
        {
            // "- " with no content still needs a cursor target.
            children.push(Node::paragraph(""));
        }
        if let Node::List { children, .. } = &node
            && children.is_empty()
        {
            return; // a list that lost all items is normalized away
        }
        let parent = self.top_mut();
        if parent.node.kind().allows_child(node.kind()) {
            parent
                .node
                .children_mut()
                .expect("containers have a child list")
                .push(node);
        } else {
            log::warn!(
                "dropping decoded {} not allowed inside {}",
                node.kind(),
                parent.node.kind()
            );
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.close_top();
        }
        let mut root = self.stack.pop().expect("document frame").node;
        let children = root.children_mut().expect("document has a child list");
        if children.is_empty() {
            children.push(Node::paragraph(""));
        }
        root
    }

    fn top(&self) -> &Frame {
        self.stack.last().expect("stack is never empty")
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().expect("stack is never empty")
    }
}

fn encode_block(node: &Node, indent: &str, out: &mut String) {
    match node {
        Node::Paragraph { .. } => {
            out.push_str(indent);
            out.push_str(&inline_text(node));
            out.push_str("\n\n");
        }
        Node::Heading { level, .. } => {
            out.push_str(indent);
            for _ in 0..*level {
                out.push('#');
            }
            out.push(' ');
            out.push_str(&inline_text(node));
            out.push_str("\n\n");
        }
        Node::CodeBlock { lang, .. } => {
            out.push_str(indent);
            out.push_str("```");
            if let Some(lang) = lang {
                out.push_str(lang);
            }
            out.push('\n');
            for line in inline_text(node).lines() {
                out.push_str(indent);
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(indent);
            out.push_str("```\n\n");
        }
        Node::List {
            ordered, children, ..
        } => {
            encode_list(*ordered, children, indent, out);
            out.push('\n');
        }
        other => {
            // Malformed placement; render whatever text it carries rather
            // than failing the whole document.
            log::warn!("encoding fallback for {} at block position", other.kind());
            let text = subtree_text(other);
            if !text.is_empty() {
                out.push_str(indent);
                out.push_str(&text);
                out.push_str("\n\n");
            }
        }
    }
}

fn encode_list(ordered: bool, items: &[Node], indent: &str, out: &mut String) {
    for (index, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}. ", index + 1)
        } else {
            "- ".to_string()
        };
        let child_indent = format!("{}{}", indent, " ".repeat(marker.len()));
        let Node::ListItem { children } = item else {
            log::warn!("encoding fallback for {} inside list", item.kind());
            out.push_str(indent);
            out.push_str(&marker);
            out.push_str(&subtree_text(item));
            out.push('\n');
            continue;
        };
        for (block_index, block) in children.iter().enumerate() {
            match block {
                Node::Paragraph { .. } if block_index == 0 => {
                    out.push_str(indent);
                    out.push_str(&marker);
                    out.push_str(&inline_text(block));
                    out.push('\n');
                    // A following sibling text block needs a blank line to
                    // stay a separate block instead of a lazy continuation.
                    if children
                        .get(block_index + 1)
                        .is_some_and(|next| next.kind().is_textblock())
                    {
                        out.push('\n');
                    }
                }
                Node::List {
                    ordered, children, ..
                } => {
                    encode_list(*ordered, children, &child_indent, out);
                }
                _ => {
                    if block_index == 0 {
                        out.push_str(indent);
                        out.push_str(&marker);
                        out.push('\n');
                    }
                    encode_block(block, &child_indent, out);
                }
            }
        }
    }
}

/// Concatenated text of a text block's leaves.
fn inline_text(node: &Node) -> String {
    let mut text = String::new();
    for child in node.children() {
        match child {
            Node::Text { text: t } => text.push_str(t),
            other => {
                log::warn!("encoding fallback for {} inside {}", other.kind(), node.kind());
                text.push_str(&subtree_text(other));
            }
        }
    }
    text
}

/// All leaf text under a node, used by encode fallbacks.
fn subtree_text(node: &Node) -> String {
    match node {
        Node::Text { text } => text.clone(),
        _ => node.children().iter().map(subtree_text).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // ============ Decode tests ============

    #[test]
    fn test_decode_empty_string_yields_one_empty_paragraph() {
        let state = decode("");
        assert_eq!(
            state.root(),
            &Node::Document {
                children: vec![Node::paragraph("")],
            }
        );
        assert_eq!(state.size(), 1);
    }

    #[test]
    fn test_decode_heading_and_paragraph() {
        let state = decode("# Markets\n\nPrices move.");
        assert_eq!(
            state.root(),
            &Node::Document {
                children: vec![Node::heading(1, "Markets"), Node::paragraph("Prices move.")],
            }
        );
    }

    #[test]
    fn test_decode_flattens_inline_formatting() {
        let state = decode("Some *emphasized* and `coded` text");
        assert_eq!(state.plain_text(), "Some emphasized and coded text");
    }

    #[test]
    fn test_decode_tight_list_items_get_paragraphs() {
        let state = decode("- alpha\n- beta");
        assert_eq!(
            state.root(),
            &Node::Document {
                children: vec![Node::List {
                    ordered: false,
                    children: vec![
                        Node::ListItem {
                            children: vec![Node::paragraph("alpha")],
                        },
                        Node::ListItem {
                            children: vec![Node::paragraph("beta")],
                        },
                    ],
                }],
            }
        );
    }

    #[test]
    fn test_decode_ordered_list() {
        let state = decode("1. first\n2. second");
        let Node::Document { children } = state.root() else {
            unreachable!()
        };
        assert_eq!(children.len(), 1);
        assert!(matches!(children[0], Node::List { ordered: true, .. }));
    }

    #[test]
    fn test_decode_fenced_code_block_keeps_language_and_newlines() {
        let state = decode("```rust\nfn main() {}\n```");
        assert_eq!(
            state.root(),
            &Node::Document {
                children: vec![Node::CodeBlock {
                    lang: Some("rust".to_string()),
                    children: vec![Node::text("fn main() {}\n")],
                }],
            }
        );
    }

    #[test]
    fn test_decode_block_quote_flattens_to_paragraph() {
        let state = decode("> quoted line");
        assert_eq!(
            state.root(),
            &Node::Document {
                children: vec![Node::paragraph("quoted line")],
            }
        );
    }

    #[test]
    fn test_decode_soft_break_becomes_space() {
        let state = decode("line one\nline two");
        assert_eq!(state.plain_text(), "line one line two");
    }

    #[test]
    fn test_decode_validates() {
        for content in ["", "# H\n\ntext", "- a\n  - b\n- c", "```\nx\n```", "> q"] {
            decode(content)
                .root()
                .validate()
                .unwrap_or_else(|violation| panic!("decode({content:?}) invalid: {violation}"));
        }
    }

    // ============ Encode tests ============

    #[test]
    fn test_encode_heading_and_paragraph() {
        let state = decode("## Fees\n\nNo hidden fees.");
        assert_eq!(encode(&state), "## Fees\n\nNo hidden fees.");
    }

    #[test]
    fn test_encode_never_panics_on_malformed_tree() {
        // A text leaf at block position is outside the schema; encode renders
        // its content best-effort instead of failing.
        let state = DocumentState::from_root(Node::Document {
            children: vec![Node::text("loose text")],
        });
        assert_eq!(encode(&state), "loose text");
    }

    #[test]
    fn test_encode_empty_document() {
        let state = decode("");
        assert_eq!(encode(&state), "");
    }

    // ============ Round-trip tests ============

    #[rstest]
    #[case::plain_paragraph("Just a sentence.")]
    #[case::heading_levels("# One\n\n###### Six")]
    #[case::bullet_list("- alpha\n- beta\n- gamma")]
    #[case::ordered_list("1. first\n2. second")]
    #[case::nested_list("- outer\n  - inner\n- last")]
    #[case::code_block("```python\nprint('hi')\n```")]
    #[case::mixed("# Intro\n\nWelcome along.\n\n- point one\n- point two")]
    #[case::loose_item("- para one\n\n  para two")]
    fn test_round_trip_is_stable(#[case] content: &str) {
        let first = decode(content);
        let second = decode(&encode(&first));
        assert_eq!(second, first, "round-trip changed structure for {content:?}");
    }

    #[rstest]
    #[case("plain text")]
    #[case("# Title\n\nBody")]
    #[case("")]
    fn test_round_trip_preserves_visible_text(#[case] content: &str) {
        let state = decode(content);
        let reencoded = decode(&encode(&state));
        assert_eq!(reencoded.plain_text(), state.plain_text());
    }
}
