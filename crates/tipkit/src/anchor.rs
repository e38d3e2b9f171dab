//! Anchor observation: the per-anchor task that watches a tip and presents
//! it when it becomes eligible.
//!
//! The task lives exactly as long as its [`AnchorSubscription`]; tearing the
//! anchor down drops the subscription, which aborts the task, so no
//! evaluation or presentation happens afterwards.

use std::sync::Arc;

use futures::StreamExt as _;
use tipkit_core::store::EventStore;
use tokio::task::JoinHandle;

use crate::{bridge::PresentationBridge, presentation::TipPresentation, tip::Tip};

/// Handle to a running anchor observation. Dropping it cancels the task.
#[derive(Debug)]
pub struct AnchorSubscription {
  handle: JoinHandle<()>,
}

impl AnchorSubscription {
  /// Stop observing. Equivalent to dropping the subscription.
  pub fn cancel(self) {}

  /// Whether the observation task has stopped on its own or been cancelled.
  pub fn is_finished(&self) -> bool { self.handle.is_finished() }
}

impl Drop for AnchorSubscription {
  fn drop(&mut self) { self.handle.abort(); }
}

/// Watch `tip` for as long as the returned subscription is held.
///
/// Eligibility is checked once straight away, then again whenever the tip's
/// combined trigger events change (unless it has already been seen) and
/// whenever its flow advances. `present` builds the presentation and the
/// bridge shows it each time the result turns `true`; repeated `true`s are
/// suppressed.
///
/// Trigger changes arriving while the tip is seen are ignored, so the last
/// result stays `true` after a dismissal. A tip outside any flow that is
/// reset while still eligible is therefore not shown again until the anchor
/// is remounted.
///
/// Must be called from within a tokio runtime.
pub fn observe_anchor<S, F>(
  tip: Tip<S>,
  bridge: Arc<PresentationBridge<S>>,
  present: F,
) -> AnchorSubscription
where
  S: EventStore,
  F: Fn(&Tip<S>) -> TipPresentation<S> + Send + Sync + 'static,
{
  let handle = tokio::spawn(async move {
    let mut events = tip.observe();
    let mut continuation = tip.flow_continuation();
    let mut last: Option<bool> = None;

    // Checked on mount so tips without triggers are not left waiting.
    let mut recheck = true;
    loop {
      if recheck {
        let eligible = tip.show().await;
        if last.replace(eligible) != Some(eligible) {
          tracing::debug!(tip = %tip.name(), eligible, "eligibility changed");
          if eligible {
            bridge.show(present(&tip));
          }
        }
      }

      recheck = tokio::select! {
        Some(_) = events.next() => !tip.has_been_seen().await,
        Some(()) = continuation.next() => true,
        else => break,
      };
    }

    tracing::debug!(tip = %tip.name(), "anchor observation finished");
  });

  AnchorSubscription { handle }
}
