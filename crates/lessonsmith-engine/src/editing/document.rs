use crate::editing::node::Node;

/// Immutable snapshot of the lesson document tree.
///
/// A `DocumentState` is only ever produced by decoding serialized content or
/// by applying a transaction to a prior state. It is never mutated in place,
/// so any position computed against a state stays meaningful for that state
/// even after newer states exist; a [`PositionMap`](crate::editing::PositionMap)
/// translates positions forward across each transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentState {
    root: Node,
    size: usize,
}

impl DocumentState {
    /// Wrap a validated root node. Callers are the codec and the mutation
    /// engine; both guarantee schema validity before construction.
    pub(crate) fn from_root(root: Node) -> Self {
        debug_assert!(matches!(root, Node::Document { .. }));
        let size = root.size();
        Self { root, size }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Total addressable position space of this state.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Text leaves in document order, each with its absolute start position.
    pub fn leaves(&self) -> Vec<(usize, &str)> {
        let mut pos = 0;
        let mut out = Vec::new();
        self.root.collect_leaves(&mut pos, &mut out);
        out
    }

    /// Concatenated leaf text in document order.
    pub fn plain_text(&self) -> String {
        self.leaves().iter().map(|(_, text)| *text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_state_caches_size() {
        let root = Node::Document {
            children: vec![Node::heading(2, "Fees"), Node::paragraph("None.")],
        };
        let state = DocumentState::from_root(root);
        assert_eq!(state.size(), 11);
        assert_eq!(state.size(), state.root().size());
    }

    #[test]
    fn test_plain_text_concatenates_leaves_in_order() {
        let root = Node::Document {
            children: vec![Node::heading(1, "Intro"), Node::paragraph("Welcome")],
        };
        let state = DocumentState::from_root(root);
        assert_eq!(state.plain_text(), "IntroWelcome");
        assert_eq!(state.leaves(), vec![(0, "Intro"), (6, "Welcome")]);
    }

    #[test]
    fn test_empty_paragraph_state() {
        let root = Node::Document {
            children: vec![Node::paragraph("")],
        };
        let state = DocumentState::from_root(root);
        assert_eq!(state.size(), 1);
        assert_eq!(state.plain_text(), "");
        assert!(state.leaves().is_empty());
    }
}
