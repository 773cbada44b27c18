//! Applies transactions to document states.
//!
//! `apply` is the only way a document state changes shape. It works on a
//! scratch copy of the tree, validates the result against the schema, and
//! either returns a brand new state plus a position map or rejects the whole
//! transaction with the source state untouched. No partial mutation is ever
//! observable.

use crate::editing::document::DocumentState;
use crate::editing::node::{Node, NodeKind, SchemaViolation};
use crate::editing::transaction::{Op, Transaction};

/// Position translation for a single primitive operation: everything in
/// `start..start + old_len` was replaced by `new_len` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepMap {
    start: usize,
    old_len: usize,
    new_len: usize,
}

impl StepMap {
    fn map(&self, pos: usize) -> Option<usize> {
        if pos < self.start {
            Some(pos)
        } else if pos < self.start + self.old_len {
            None
        } else {
            Some(pos - self.old_len + self.new_len)
        }
    }
}

/// Translates positions valid in a prior document state into the state
/// produced by one transaction.
///
/// Positions after an insertion point shift forward by the inserted length;
/// positions inside a deleted range map to `None`; positions past a deletion
/// shift backward by the deleted length. Maps are recomputed per transaction
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionMap {
    steps: Vec<StepMap>,
}

impl PositionMap {
    pub(crate) fn identity() -> Self {
        Self::default()
    }

    pub fn map(&self, old_pos: usize) -> Option<usize> {
        let mut pos = old_pos;
        for step in &self.steps {
            pos = step.map(pos)?;
        }
        Some(pos)
    }
}

/// Apply a transaction to a state, yielding the new state and the position
/// map across it. The input state is untouched either way.
pub fn apply(
    state: &DocumentState,
    tx: &Transaction,
) -> Result<(DocumentState, PositionMap), SchemaViolation> {
    let mut root = state.root().clone();
    let mut steps = Vec::with_capacity(tx.ops().len());

    for op in tx.ops() {
        let size = root.size();
        let step = match op {
            Op::InsertText { at, text } => {
                check_pos(*at, size)?;
                insert_text(&mut root, *at, text)?;
                StepMap {
                    start: *at,
                    old_len: 0,
                    new_len: text.len(),
                }
            }
            Op::InsertNode { at, node } => {
                check_pos(*at, size)?;
                node.validate()?;
                insert_node(&mut root, *at, node.clone())?;
                StepMap {
                    start: *at,
                    old_len: 0,
                    new_len: node.size(),
                }
            }
            Op::DeleteRange { from, to } => {
                check_range(*from, *to, size)?;
                delete_range(&mut root, *from, *to)?;
                StepMap {
                    start: *from,
                    old_len: to - from,
                    new_len: 0,
                }
            }
            Op::ReplaceRange { from, to, text } => {
                check_range(*from, *to, size)?;
                delete_range(&mut root, *from, *to)?;
                insert_text(&mut root, *from, text)?;
                StepMap {
                    start: *from,
                    old_len: to - from,
                    new_len: text.len(),
                }
            }
        };
        steps.push(step);
    }

    prune_empty(root.children_mut().expect("root has a child list"));
    if root.children().is_empty() {
        // Deleting the last block leaves an empty paragraph; the tree is
        // never empty so a cursor always has somewhere to attach.
        root.children_mut()
            .expect("root has a child list")
            .push(Node::paragraph(""));
    }
    root.validate()?;

    Ok((DocumentState::from_root(root), PositionMap { steps }))
}

fn check_pos(pos: usize, size: usize) -> Result<(), SchemaViolation> {
    if pos > size {
        return Err(SchemaViolation::OutOfBounds { pos, size });
    }
    Ok(())
}

fn check_range(from: usize, to: usize, size: usize) -> Result<(), SchemaViolation> {
    if from > to {
        return Err(SchemaViolation::InvalidRange { from, to });
    }
    if to > size {
        return Err(SchemaViolation::OutOfBounds { pos: to, size });
    }
    Ok(())
}

fn insert_text(root: &mut Node, at: usize, text: &str) -> Result<(), SchemaViolation> {
    let children = root.children_mut().expect("root has a child list");
    insert_text_in(children, at, text, NodeKind::Document)
}

/// Walk a container's content to the text position `at` and splice the text
/// there. Positions on a container gap (no surrounding text block) fail
/// closed.
fn insert_text_in(
    children: &mut Vec<Node>,
    mut at: usize,
    text: &str,
    parent: NodeKind,
) -> Result<(), SchemaViolation> {
    for child in children.iter_mut() {
        let size = child.size();
        if at < size {
            return match child {
                Node::Text { text: leaf } => {
                    if !leaf.is_char_boundary(at) {
                        return Err(SchemaViolation::NotCharBoundary { pos: at });
                    }
                    leaf.insert_str(at, text);
                    Ok(())
                }
                _ => {
                    let kind = child.kind();
                    let inner = child.children_mut().expect("containers have a child list");
                    insert_text_in(inner, at, text, kind)
                }
            };
        }
        at -= size;
    }

    // End of this container's content.
    if parent.is_textblock() {
        if let Some(Node::Text { text: leaf }) = children.last_mut() {
            leaf.push_str(text);
        } else {
            children.push(Node::text(text));
        }
        Ok(())
    } else {
        Err(SchemaViolation::IllegalChild {
            parent,
            child: NodeKind::Text,
        })
    }
}

fn insert_node(root: &mut Node, at: usize, node: Node) -> Result<(), SchemaViolation> {
    let children = root.children_mut().expect("root has a child list");
    insert_node_in(children, at, node, NodeKind::Document)
}

/// Insert a whole node at a gap between children. Positions inside a text
/// leaf cannot take a node; positions inside another container recurse.
fn insert_node_in(
    children: &mut Vec<Node>,
    mut at: usize,
    node: Node,
    parent: NodeKind,
) -> Result<(), SchemaViolation> {
    for index in 0..children.len() {
        if at == 0 {
            return insert_node_at(children, index, node, parent);
        }
        let size = children[index].size();
        if at < size {
            return match &mut children[index] {
                Node::Text { .. } => Err(SchemaViolation::IllegalChild {
                    parent: NodeKind::Text,
                    child: node.kind(),
                }),
                child => {
                    let kind = child.kind();
                    let inner = child.children_mut().expect("containers have a child list");
                    insert_node_in(inner, at, node, kind)
                }
            };
        }
        at -= size;
    }
    debug_assert_eq!(at, 0, "bounds were checked before walking");
    let end = children.len();
    insert_node_at(children, end, node, parent)
}

fn insert_node_at(
    children: &mut Vec<Node>,
    index: usize,
    node: Node,
    parent: NodeKind,
) -> Result<(), SchemaViolation> {
    if !parent.allows_child(node.kind()) {
        return Err(SchemaViolation::IllegalChild {
            parent,
            child: node.kind(),
        });
    }
    children.insert(index, node);
    Ok(())
}

fn delete_range(root: &mut Node, from: usize, to: usize) -> Result<(), SchemaViolation> {
    let children = root.children_mut().expect("root has a child list");
    delete_in(children, from, to)
}

/// Remove the units in `from..to` from a container's content: whole children
/// fully inside the range are dropped, text leaves are spliced, and partially
/// covered containers recurse. A range that covers a node's trailing boundary
/// without covering the whole node would have to merge structure, which the
/// engine does not do; it fails closed instead.
fn delete_in(children: &mut Vec<Node>, from: usize, to: usize) -> Result<(), SchemaViolation> {
    let mut offset = 0;
    let mut index = 0;
    while index < children.len() {
        let size = children[index].size();
        let start = offset;
        let end = offset + size;
        offset = end;

        if to <= start || from >= end {
            index += 1;
            continue;
        }
        if from <= start && to >= end {
            children.remove(index);
            continue;
        }

        let local_from = from.saturating_sub(start);
        let local_to = (to - start).min(size);
        match &mut children[index] {
            Node::Text { text } => {
                if !text.is_char_boundary(local_from) || !text.is_char_boundary(local_to) {
                    return Err(SchemaViolation::NotCharBoundary { pos: from.max(start) });
                }
                text.replace_range(local_from..local_to, "");
            }
            child => {
                let content = size - 1;
                if local_to > content && local_from > 0 {
                    return Err(SchemaViolation::SplitsNodeBoundary { from, to });
                }
                let inner = child.children_mut().expect("containers have a child list");
                delete_in(inner, local_from, local_to.min(content))?;
            }
        }
        index += 1;
    }
    Ok(())
}

/// Drop empty text leaves and containers orphaned by a deletion. Pruning a
/// container removes its boundary unit beyond the deleted span, so the
/// position map is best-effort for edits that orphan containers.
fn prune_empty(children: &mut Vec<Node>) {
    for child in children.iter_mut() {
        if let Some(inner) = child.children_mut() {
            prune_empty(inner);
        }
    }
    children.retain(|child| match child {
        Node::Text { text } => !text.is_empty(),
        Node::List { children, .. } | Node::ListItem { children } => !children.is_empty(),
        _ => true,
    });
}
