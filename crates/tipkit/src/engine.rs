//! [`TipsEngine`] — the coordination surface: the application's declared
//! tips, epoch resets, and flow registration.

use std::sync::{Arc, PoisonError, RwLock};

use tipkit_core::store::EventStore;
use tokio::task::JoinHandle;

use crate::{context::TipContext, tip::Tip};

/// The host application's declared set of tips.
pub trait TipSet<S> {
  fn tips(&self) -> Vec<Tip<S>>;
}

pub struct TipsEngine<S> {
  ctx:  TipContext<S>,
  tips: RwLock<Vec<Tip<S>>>,
}

impl<S: EventStore> TipsEngine<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { ctx: TipContext::new(store), tips: RwLock::new(Vec::new()) }
  }

  /// The context tips should be declared against.
  pub fn context(&self) -> &TipContext<S> { &self.ctx }

  /// Install the application's tips, replacing any previous set.
  pub fn configure(&self, set: &impl TipSet<S>) {
    let tips = set.tips();
    tracing::debug!(count = tips.len(), "configured tips");
    *self.tips.write().unwrap_or_else(PoisonError::into_inner) = tips;
  }

  pub fn tips(&self) -> Vec<Tip<S>> {
    self.tips.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn tip(&self, name: &str) -> Option<Tip<S>> {
    self
      .tips
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .find(|t| t.name() == name)
      .cloned()
  }

  /// Start a new epoch: forget every completion and every occurrence.
  ///
  /// Runs in the background; await the handle to know it has finished.
  pub fn invalidate_all_tips(&self) -> JoinHandle<()> {
    let store = Arc::clone(self.ctx.store());
    tokio::spawn(async move {
      if let Err(e) = store.clear_completions().await {
        tracing::warn!(error = %e, "failed to clear completions");
      }
      if let Err(e) = store.remove_all_occurrences().await {
        tracing::warn!(error = %e, "failed to remove occurrences");
      }
      tracing::info!("invalidated all tips");
    })
  }

  /// Reset only the given tips: their completions and the occurrences of
  /// their triggers.
  pub fn invalidate_tips(&self, tips: &[Tip<S>]) -> JoinHandle<()> {
    let store = Arc::clone(self.ctx.store());
    let names: Vec<String> = tips.iter().map(|t| t.name().to_owned()).collect();
    let trigger_ids: Vec<String> = tips
      .iter()
      .flat_map(|t| t.triggers().iter().map(|tr| tr.id().to_owned()))
      .collect();

    tokio::spawn(async move {
      tracing::debug!(tips = ?names, "invalidating tips");
      if let Err(e) = store.clear_completion(names).await {
        tracing::warn!(error = %e, "failed to clear completions");
      }
      if let Err(e) = store.remove_occurrences_of(trigger_ids).await {
        tracing::warn!(error = %e, "failed to remove occurrences");
      }
    })
  }
}
