//! [`Trigger`] — a named observation point over the event store.

use std::sync::Arc;

use futures::{
  StreamExt as _,
  stream::{self, BoxStream},
};
use tipkit_core::{
  event::{EventValue, TriggerOccurrenceEvent},
  store::EventStore,
};
use tokio::task::JoinHandle;

/// A read/write handle for the occurrences recorded under one id.
///
/// A trigger owns nothing but its id; the events live in the store.
pub struct Trigger<S> {
  id:    String,
  store: Arc<S>,
}

impl<S> Clone for Trigger<S> {
  fn clone(&self) -> Self {
    Self { id: self.id.clone(), store: Arc::clone(&self.store) }
  }
}

impl<S> std::fmt::Debug for Trigger<S> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Trigger").field("id", &self.id).finish()
  }
}

impl<S: EventStore> Trigger<S> {
  pub fn new(id: impl Into<String>, store: Arc<S>) -> Self {
    Self { id: id.into(), store }
  }

  pub fn id(&self) -> &str { &self.id }

  /// Record an occurrence without waiting for it to be persisted.
  ///
  /// Must be called from within a tokio runtime. The returned handle may be
  /// dropped; failures are logged.
  pub fn record(&self, value: impl Into<EventValue>) -> JoinHandle<()> {
    let trigger = self.clone();
    let value = value.into();
    tokio::spawn(async move {
      if let Err(e) = trigger.record_now(value).await {
        tracing::warn!(trigger_id = %trigger.id, error = %e, "failed to record occurrence");
      }
    })
  }

  /// Record an occurrence and wait until it is durable.
  pub async fn record_now(
    &self,
    value: impl Into<EventValue>,
  ) -> Result<TriggerOccurrenceEvent, S::Error> {
    self.store.record_occurrence(self.id.clone(), value.into()).await
  }

  /// Live list of this trigger's events, oldest first.
  ///
  /// Yields the current list straight away and again after every change to
  /// the store. If the store's stream ends without producing anything, a
  /// single empty list is yielded so that a waiting reader never hangs.
  pub fn events(&self) -> BoxStream<'static, Vec<TriggerOccurrenceEvent>> {
    let id = self.id.clone();
    let own = self
      .store
      .occurrences()
      .map(move |all| all.into_iter().filter(|e| e.id == id).collect::<Vec<_>>())
      .boxed();
    or_empty(own)
  }

  /// The first value of [`Self::events`].
  pub async fn latest_events(&self) -> Vec<TriggerOccurrenceEvent> {
    self.events().next().await.unwrap_or_default()
  }
}

/// Pass `inner` through, but yield `T::default()` once if it finishes without
/// having yielded anything.
fn or_empty<T>(inner: BoxStream<'static, T>) -> BoxStream<'static, T>
where
  T: Default + Send + 'static,
{
  stream::unfold((Some(inner), false), |(inner, emitted)| async move {
    let mut inner = inner?;
    match inner.next().await {
      Some(item) => Some((item, (Some(inner), true))),
      None if !emitted => Some((T::default(), (None, true))),
      None => None,
    }
  })
  .boxed()
}

#[cfg(test)]
mod tests {
  use futures::StreamExt as _;

  use super::or_empty;

  #[tokio::test]
  async fn silent_stream_yields_one_empty_value() {
    let items: Vec<Vec<u8>> = or_empty(futures::stream::empty().boxed()).collect().await;
    assert_eq!(items, vec![Vec::<u8>::new()]);
  }

  #[tokio::test]
  async fn non_empty_stream_passes_through() {
    let items: Vec<Vec<u8>> =
      or_empty(futures::stream::iter([vec![1], vec![2, 3]]).boxed()).collect().await;
    assert_eq!(items, vec![vec![1], vec![2, 3]]);
  }
}
