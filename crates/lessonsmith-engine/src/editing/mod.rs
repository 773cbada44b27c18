/*!
 * # Lesson editing core
 *
 * The live, mutable lesson document and everything that keeps it consistent
 * while three independent sources push changes at it.
 *
 * ## Architecture
 *
 * ### 1. Immutable states, one owner
 * The document is a typed tree ([`Node`]) wrapped in an immutable
 * [`DocumentState`] snapshot. The [`EditorSession`] is the single owner of
 * the current state; every other component either produces a new state or
 * reads the current one. Old states stay valid for any position computed
 * against them.
 *
 * ### 2. Transaction-based editing
 * All user edits are [`Transaction`]s of primitive operations. The mutation
 * engine applies a transaction atomically against the schema and returns the
 * new state together with a [`PositionMap`] that translates positions from
 * the old state into the new one. Illegal edits fail closed with a
 * [`SchemaViolation`]; a partial mutation is never observable.
 *
 * ### 3. One serialized form, three channels
 * Markdown is the serialized document form: the codec decodes it on load and
 * on every external full-content replacement (streaming generation or a
 * corrective overwrite), and encodes the current state for the persistence
 * sink after each accepted user edit. External replacements always suppress
 * persistence; the external source owns storage of its own content.
 *
 * ### 4. Content-addressed suggestion overlay
 * AI-produced [`SuggestionRecord`]s name the exact fragment they apply to.
 * Projection re-locates each fragment in the current state by scanning text
 * leaves and yields [`AnchoredSuggestion`]s with concrete position ranges;
 * fragments that no longer exist project to nothing. Projection is pure and
 * cheap enough to re-run wholesale whenever the document or the record list
 * changes, which keeps stale anchors from ever being rendered against a newer
 * state.
 *
 * ## Module structure
 *
 * - **`node`**: document tree, schema rules, position sizing
 * - **`document`**: immutable `DocumentState` snapshots
 * - **`codec`**: markdown decode/encode
 * - **`transaction`**: edit operations and transaction metadata
 * - **`engine`**: atomic transaction application and position mapping
 * - **`session`**: the stateful owner bridging edits, replacement, and saves
 * - **`suggestions`**: projection of suggestion records onto the document
 */

pub mod codec;
pub mod document;
pub mod engine;
pub mod node;
pub mod session;
pub mod suggestions;
pub mod transaction;

pub use codec::{decode, encode};
pub use document::DocumentState;
pub use engine::{PositionMap, apply};
pub use node::{Node, NodeKind, SchemaViolation};
pub use session::{ContentStatus, EditorSession, Patch, SaveSink, SyncKey};
pub use suggestions::{AnchoredSuggestion, SuggestionRecord, project};
pub use transaction::{Op, Transaction};
