use crate::editing::node::Node;

/// Primitive edit operation.
///
/// Positions address the document the operation applies to; within a
/// transaction each operation addresses the document produced by the one
/// before it.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    InsertText { at: usize, text: String },
    InsertNode { at: usize, node: Node },
    DeleteRange { from: usize, to: usize },
    ReplaceRange { from: usize, to: usize, text: String },
}

/// An atomic, schema-validated set of edit operations.
///
/// A transaction is computed against exactly one source document state and
/// applies all-or-nothing: if any operation is illegal the whole transaction
/// is rejected and the source state stays current.
///
/// `suppress_persist` marks changes that originate from external full-content
/// replacement rather than direct user editing; the session skips the
/// persistence callback for those.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transaction {
    ops: Vec<Op>,
    suppress_persist: bool,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(mut self, at: usize, text: impl Into<String>) -> Self {
        self.ops.push(Op::InsertText {
            at,
            text: text.into(),
        });
        self
    }

    pub fn insert_node(mut self, at: usize, node: Node) -> Self {
        self.ops.push(Op::InsertNode { at, node });
        self
    }

    pub fn delete_range(mut self, from: usize, to: usize) -> Self {
        self.ops.push(Op::DeleteRange { from, to });
        self
    }

    pub fn replace_range(mut self, from: usize, to: usize, text: impl Into<String>) -> Self {
        self.ops.push(Op::ReplaceRange {
            from,
            to,
            text: text.into(),
        });
        self
    }

    pub fn suppress_persist(mut self) -> Self {
        self.suppress_persist = true;
        self
    }

    pub fn suppresses_persist(&self) -> bool {
        self.suppress_persist
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_accumulates_ops_in_order() {
        let tx = Transaction::new()
            .insert_text(0, "abc")
            .delete_range(1, 2)
            .replace_range(0, 1, "x");
        assert_eq!(tx.ops().len(), 3);
        assert!(matches!(tx.ops()[0], Op::InsertText { at: 0, .. }));
        assert!(matches!(tx.ops()[2], Op::ReplaceRange { from: 0, to: 1, .. }));
        assert!(!tx.suppresses_persist());
    }

    #[test]
    fn test_suppress_persist_flag() {
        let tx = Transaction::new().insert_text(0, "x").suppress_persist();
        assert!(tx.suppresses_persist());
    }

    #[test]
    fn test_new_transaction_is_empty() {
        assert!(Transaction::new().is_empty());
    }
}
