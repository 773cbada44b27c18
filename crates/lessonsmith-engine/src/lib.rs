//! Core processing engine for the lessonsmith lesson editor.
//!
//! Everything lives under [`editing`]: the document model, the markdown
//! codec, the mutation engine, the editor session, and the suggestion
//! projector. The crate has no I/O surface of its own; it is embedded by a
//! host that supplies content, a persistence sink, and suggestion records.

pub mod editing;

pub use editing::{
    AnchoredSuggestion, ContentStatus, DocumentState, EditorSession, Node, NodeKind, Op, Patch,
    PositionMap, SaveSink, SchemaViolation, SuggestionRecord, SyncKey, Transaction,
};
