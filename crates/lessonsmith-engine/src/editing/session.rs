//! The stateful owner of "what is the document right now".
//!
//! A session bridges three independent update channels without letting them
//! race or double-fire persistence:
//!
//! 1. interactive user edits, which run through the mutation engine and then
//!    the persistence sink;
//! 2. external full-content replacement (a streaming generation pass or a
//!    corrective load), which re-decodes and swaps the whole document with
//!    persistence suppressed;
//! 3. suggestion projection, which only reads the current state.
//!
//! All mutation is synchronous: a transaction is computed against the
//! session's current state at the moment of application and the swap
//! completes before the next input event is handled, so no caller can apply
//! against a stale capture. The persistence sink is fire-and-forget and
//! debounces internally; the session never stacks its own debounce on top.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::editing::codec;
use crate::editing::document::DocumentState;
use crate::editing::engine::{self, PositionMap};
use crate::editing::node::SchemaViolation;
use crate::editing::suggestions::{self, AnchoredSuggestion, SuggestionRecord};
use crate::editing::transaction::Transaction;

/// Whether externally supplied content is still being generated.
///
/// Streaming content replaces the document eagerly on every update; settled
/// content replaces only when it actually differs, so a redundant update does
/// not clobber in-flight cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Streaming,
    Idle,
}

/// Persistence gateway entry point.
///
/// The sink owns storage, retries, and debouncing. The session's only
/// obligations are to call it on every accepted user transaction and to keep
/// calling it after a failure; it never awaits the result.
pub trait SaveSink {
    fn save(&mut self, content: &str, is_debounced: bool);

    /// Drop any pending debounced write. Called on dispose so a late flush
    /// cannot land on a destroyed target.
    fn cancel_pending(&mut self) {}
}

/// Result of a session mutation: the new document version and the position
/// map across the applied transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub version: u64,
    pub map: PositionMap,
}

/// Identity-sensitive inputs for resynchronization decisions.
///
/// Embedding layers re-run for all sorts of reasons that have nothing to do
/// with the document. A full resync is justified only when one of these
/// fields changed; comparing keys makes every other re-run inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncKey {
    pub version: u64,
    pub status: ContentStatus,
    pub suggestions_token: u64,
}

impl SyncKey {
    pub fn needs_resync(&self, previous: &SyncKey) -> bool {
        self != previous
    }
}

/// A live editor instance owning the current [`DocumentState`].
///
/// The state is owned exclusively by the session; projection and other reads
/// borrow it, nothing else holds a mutable reference to the live tree.
pub struct EditorSession<S: SaveSink> {
    id: Uuid,
    state: DocumentState,
    /// Serialized form of `state`, kept for cheap settled-replacement
    /// idempotence checks.
    serialized: String,
    version: u64,
    status: ContentStatus,
    disposed: bool,
    sink: S,
}

impl<S: SaveSink> EditorSession<S> {
    /// Decode the authoritative content and take ownership of it.
    pub fn open(content: &str, sink: S) -> Self {
        let id = Uuid::new_v4();
        log::debug!("editor session {id} opened with {} bytes", content.len());
        Self {
            id,
            state: codec::decode(content),
            serialized: content.to_string(),
            version: 0,
            status: ContentStatus::Idle,
            disposed: false,
            sink,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Serialized form of the current state.
    pub fn content(&self) -> &str {
        &self.serialized
    }

    /// Document version index, incremented on every accepted mutation or
    /// replacement.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn status(&self) -> ContentStatus {
        self.status
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Apply a user transaction against the current state.
    ///
    /// On success the new state is swapped in, the version bumped, and the
    /// serialized content pushed to the sink as a debounced save, unless the
    /// transaction suppresses persistence. A schema violation leaves the
    /// session untouched; a disposed session no-ops.
    pub fn apply(&mut self, tx: &Transaction) -> Result<Patch, SchemaViolation> {
        if self.disposed {
            return Ok(Patch {
                version: self.version,
                map: PositionMap::identity(),
            });
        }
        let (new_state, map) = engine::apply(&self.state, tx)?;
        self.state = new_state;
        self.version += 1;
        self.serialized = codec::encode(&self.state);
        if !tx.suppresses_persist() {
            self.sink.save(&self.serialized, true);
        }
        Ok(Patch {
            version: self.version,
            map,
        })
    }

    /// Swap in externally supplied authoritative content.
    ///
    /// Never a user edit and never persisted: the external source owns
    /// storage of this content. Streaming updates replace eagerly; settled
    /// updates replace only when the content differs from the current
    /// serialized form. Returns whether a replacement happened.
    pub fn replace_content(&mut self, content: &str, status: ContentStatus) -> bool {
        if self.disposed {
            return false;
        }
        self.status = status;
        if status == ContentStatus::Idle && content == self.serialized {
            return false;
        }
        self.state = codec::decode(content);
        self.serialized = content.to_string();
        self.version += 1;
        true
    }

    /// Project suggestion records against the current state. Read-only.
    pub fn project(&self, records: &[SuggestionRecord]) -> Vec<AnchoredSuggestion> {
        suggestions::project(&self.state, records)
    }

    /// Resync key for the current session state. `suggestions_token` is the
    /// caller's identity token for its suggestion list.
    pub fn sync_key(&self, suggestions_token: u64) -> SyncKey {
        SyncKey {
            version: self.version,
            status: self.status,
            suggestions_token,
        }
    }

    /// Release the session: cancel any pending debounced save and turn every
    /// later update call into a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.sink.cancel_pending();
        log::debug!(
            "editor session {} disposed at version {}",
            self.id,
            self.version
        );
    }
}
