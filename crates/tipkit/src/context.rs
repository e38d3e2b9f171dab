//! [`TipContext`] — the store and flow registry every tip is built against.

use std::sync::Arc;

use tipkit_core::store::EventStore;

use crate::{flow::FlowRegistry, tip::TipBuilder, trigger::Trigger};

/// Created once at application start and handed to every tip declaration.
/// Cloning is cheap.
pub struct TipContext<S> {
  store: Arc<S>,
  flows: Arc<FlowRegistry<S>>,
}

impl<S> Clone for TipContext<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      flows: Arc::clone(&self.flows),
    }
  }
}

impl<S: EventStore> TipContext<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, flows: Arc::new(FlowRegistry::new()) }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn flows(&self) -> &Arc<FlowRegistry<S>> { &self.flows }

  /// A trigger recording into this context's store.
  pub fn trigger(&self, id: impl Into<String>) -> Trigger<S> {
    Trigger::new(id, Arc::clone(&self.store))
  }

  /// Start declaring a tip with the given stable name.
  pub fn tip(&self, name: impl Into<String>) -> TipBuilder<S> {
    TipBuilder::new(self.clone(), name.into())
  }
}
