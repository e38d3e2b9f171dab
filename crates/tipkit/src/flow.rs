//! [`FlowRegistry`] — ordered association of tips to named flows.
//!
//! The registry only remembers which tip sits at which position. It never
//! blocks advancement itself; gating on a predecessor is the business of each
//! tip's criteria (see [`Tip::predecessor_seen`]).

use std::{
  collections::HashMap,
  sync::{PoisonError, RwLock},
};

use crate::tip::{Tip, WeakTip};

/// Flow id → position-indexed slots. A slot is `None` until a tip is
/// associated with that position.
pub struct FlowRegistry<S> {
  flows: RwLock<HashMap<String, Vec<Option<WeakTip<S>>>>>,
}

impl<S> Default for FlowRegistry<S> {
  fn default() -> Self { Self { flows: RwLock::new(HashMap::new()) } }
}

impl<S> FlowRegistry<S> {
  pub fn new() -> Self { Self::default() }

  /// Put `tip` at `position` in `flow_id`, replacing whatever was there.
  ///
  /// Positions past the end extend the flow; skipped positions stay unset
  /// until they are associated themselves.
  pub fn associate(&self, tip: &Tip<S>, position: usize, flow_id: &str) {
    let mut flows = self.flows.write().unwrap_or_else(PoisonError::into_inner);
    let slots = flows.entry(flow_id.to_owned()).or_default();

    if position >= slots.len() {
      slots.resize_with(position + 1, || None);
    }
    slots[position] = Some(tip.downgrade());

    tracing::debug!(tip = %tip.name(), flow_id, position, "associated tip with flow");
  }

  /// The tips of `flow_id` in position order. Unset positions, and tips that
  /// have since been dropped, are `None`. An unknown flow is empty.
  pub fn lookup(&self, flow_id: &str) -> Vec<Option<Tip<S>>> {
    let flows = self.flows.read().unwrap_or_else(PoisonError::into_inner);
    flows
      .get(flow_id)
      .map(|slots| {
        slots
          .iter()
          .map(|slot| slot.as_ref().and_then(WeakTip::upgrade))
          .collect()
      })
      .unwrap_or_default()
  }

  /// Ids of every flow with at least one association.
  pub fn flow_ids(&self) -> Vec<String> {
    let flows = self.flows.read().unwrap_or_else(PoisonError::into_inner);
    let mut ids: Vec<_> = flows.keys().cloned().collect();
    ids.sort();
    ids
  }
}
