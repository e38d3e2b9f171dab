//! [`PresentationBridge`] — the single "currently displayed tip" slot shared
//! with the rendering layer, and the path by which dismissals and action
//! clicks come back into the engine.

use std::sync::Arc;

use tipkit_core::{action::TipAction, store::EventStore};
use tokio::sync::watch;

use crate::presentation::TipPresentation;

/// Receives a clicked action after the tip has been dismissed.
pub trait TipActionNavigation: Send + Sync {
  fn on_action_clicked(&self, action: TipAction);
}

/// Navigation that ignores every action.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNavigation;

impl TipActionNavigation for NoOpNavigation {
  fn on_action_clicked(&self, _action: TipAction) {}
}

/// At most one presentation is active at a time. Showing another replaces
/// it; nothing is queued.
pub struct PresentationBridge<S> {
  active:    watch::Sender<Option<TipPresentation<S>>>,
  navigator: Arc<dyn TipActionNavigation>,
}

impl<S: EventStore> PresentationBridge<S> {
  pub fn new(navigator: Arc<dyn TipActionNavigation>) -> Self {
    Self { active: watch::channel(None).0, navigator }
  }

  /// Make `presentation` the active one.
  pub fn show(&self, presentation: impl Into<TipPresentation<S>>) {
    let presentation = presentation.into();
    tracing::debug!(tip = %presentation.tip().name(), "presenting tip");
    if let Some(previous) = self.active.send_replace(Some(presentation)) {
      tracing::debug!(tip = %previous.tip().name(), "replaced active tip");
    }
  }

  /// Clear the slot and mark whatever was showing as seen.
  pub async fn dismiss(&self) {
    if let Some(previous) = self.active.send_replace(None) {
      tracing::debug!(tip = %previous.tip().name(), "dismissing tip");
      previous.tip().dismiss().await;
    }
  }

  /// Dismiss the active tip, then forward `action` to navigation.
  pub async fn on_action_clicked(&self, action: TipAction) {
    self.dismiss().await;
    tracing::debug!(tip = %action.tip_id, action = %action.action_id, "tip action clicked");
    self.navigator.on_action_clicked(action);
  }

  pub fn active(&self) -> Option<TipPresentation<S>> { self.active.borrow().clone() }

  pub fn is_tip_showing(&self) -> bool { self.active.borrow().is_some() }

  /// Follow the slot from the rendering layer.
  pub fn subscribe(&self) -> watch::Receiver<Option<TipPresentation<S>>> {
    self.active.subscribe()
  }
}
