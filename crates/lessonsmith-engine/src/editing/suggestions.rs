//! Projects AI-produced text suggestions onto the current document.
//!
//! Suggestions arrive from the generation service with no knowledge of the
//! live document's addressing; each record names the exact fragment it wants
//! to replace. Projection re-locates that fragment by substring search over
//! the text leaves, so anchors survive document mutation without a shared id
//! space. A record whose fragment is gone simply projects to nothing; that is
//! the normal outcome after the user edits the text a suggestion was written
//! against, never an error.

use serde::{Deserialize, Serialize};

use crate::editing::document::DocumentState;

/// Externally supplied candidate replacement, identified by its exact
/// original fragment. Read-only input; arrives as camelCase JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRecord {
    pub id: String,
    pub original_text: String,
    pub suggested_text: String,
}

/// A suggestion resolved to a concrete position range in one document state.
///
/// Derived data: recomputed whenever the state or the record list changes and
/// never stored independently of the state it was computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredSuggestion {
    pub id: String,
    pub original_text: String,
    pub suggested_text: String,
    pub range: std::ops::Range<usize>,
}

/// Anchor each record at the first occurrence of its fragment.
///
/// Leaves are scanned in document order and a fragment must fall inside a
/// single leaf; a fragment split across adjacent leaves is intentionally not
/// matched, because leaf positions are separated by node boundary units and a
/// match over concatenated text would misattribute positions. Unmatched
/// records, and records with an empty fragment, are dropped silently.
pub fn project(state: &DocumentState, records: &[SuggestionRecord]) -> Vec<AnchoredSuggestion> {
    let leaves = state.leaves();
    records
        .iter()
        .filter(|record| !record.original_text.is_empty())
        .filter_map(|record| {
            leaves.iter().find_map(|(leaf_start, text)| {
                text.find(&record.original_text).map(|index| {
                    let start = leaf_start + index;
                    AnchoredSuggestion {
                        id: record.id.clone(),
                        original_text: record.original_text.clone(),
                        suggested_text: record.suggested_text.clone(),
                        range: start..start + record.original_text.len(),
                    }
                })
            })
        })
        .collect()
}
