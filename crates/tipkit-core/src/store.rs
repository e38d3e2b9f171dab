//! The `EventStore` trait — durable persistence for occurrences and
//! completions.
//!
//! The trait is implemented by storage backends (e.g. `tipkit-store-sqlite`).
//! The engine depends on this abstraction, not on any concrete backend.

use std::future::Future;

use futures::stream::BoxStream;

use crate::event::{EventValue, TriggerOccurrenceEvent};

/// Live snapshots of every recorded occurrence, across all trigger ids,
/// ordered by timestamp.
pub type OccurrenceStream = BoxStream<'static, Vec<TriggerOccurrenceEvent>>;

/// Live snapshots of the names of every completed tip.
pub type CompletionStream = BoxStream<'static, Vec<String>>;

/// Abstraction over a tipkit event store backend.
///
/// Two independent namespaces are kept: occurrences, keyed by trigger id, and
/// completions, keyed by tip name. Every mutation of a key is a single atomic
/// read-modify-write; concurrent writers never lose updates.
///
/// All methods return `Send` futures so the store can be shared with spawned
/// tasks.
pub trait EventStore: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Occurrences ───────────────────────────────────────────────────────

  /// Append a new occurrence under `trigger_id`, stamped with the current
  /// time by the store, and return it.
  fn record_occurrence(
    &self,
    trigger_id: String,
    value: EventValue,
  ) -> impl Future<Output = Result<TriggerOccurrenceEvent, Self::Error>> + Send + '_;

  /// A stream whose first item is the current persisted state and which
  /// yields again after every committed change.
  ///
  /// Records that fail to decode are dropped; an empty store yields an empty
  /// list rather than nothing.
  fn occurrences(&self) -> OccurrenceStream;

  /// Delete every occurrence of every trigger.
  fn remove_all_occurrences(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete the occurrences recorded under the given trigger ids only.
  fn remove_occurrences_of(
    &self,
    trigger_ids: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Completions ───────────────────────────────────────────────────────

  /// Record that the tip named `name` has been seen.
  fn complete(
    &self,
    name: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// `true` iff a completion record exists for `name`.
  fn is_complete(
    &self,
    name: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// A stream of completed tip names: the current set first, then a new set
  /// after every committed change.
  fn completions(&self) -> CompletionStream;

  /// Delete every completion record, starting a new epoch.
  fn clear_completions(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete the completion records of the named tips only.
  fn clear_completion(
    &self,
    names: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
