//! The sample's declared tips.

use tipkit::{EventStore, Tip, TipContext, TipSet, criterion};

pub const CLICKS: &str = "clicks";
pub const TOGGLE: &str = "toggle";

/// Clicks needed before the first tip is eligible.
const CLICK_THRESHOLD: usize = 5;

pub struct SampleTips<S> {
  /// Shown once the user has clicked enough and the toggle is on.
  pub anchor:  Tip<S>,
  /// Follows `anchor` in the flow.
  pub anchor2: Tip<S>,
  /// Follows `anchor2`; rendered inline.
  pub anchor3: Tip<S>,
}

impl<S: EventStore> SampleTips<S> {
  pub fn declare(ctx: &TipContext<S>, flow_id: &str) -> Self {
    let anchor = ctx
      .tip("anchortip")
      .trigger(CLICKS)
      .trigger(TOGGLE)
      .flow(flow_id, 0)
      .asset("info")
      .title("Remember")
      .message("With great power, comes great responsibility")
      .action("learn-more", "Learn More")
      .criteria(|tip: Tip<S>| async move {
        let clicks = tip.latest_events_of(CLICKS).await.len();
        let toggled_on = tip
          .latest_events_of(TOGGLE)
          .await
          .last()
          .and_then(|e| e.value.as_bool())
          .unwrap_or(false);
        vec![
          criterion(move || clicks >= CLICK_THRESHOLD),
          criterion(move || toggled_on),
        ]
      })
      .build();

    let anchor2 = after_predecessor(ctx, "anchor2tip", flow_id, 1)
      .asset("arrow-forward")
      .title("Flows")
      .message("Chain tips together in a flow")
      .build();

    let anchor3 = after_predecessor(ctx, "anchor3tip", flow_id, 2)
      .asset("favorite")
      .title("Inline")
      .message("We can even render them inline on screen content.")
      .build();

    Self { anchor, anchor2, anchor3 }
  }
}

fn after_predecessor<S: EventStore>(
  ctx: &TipContext<S>,
  name: &str,
  flow_id: &str,
  position: usize,
) -> tipkit::TipBuilder<S> {
  ctx
    .tip(name)
    .flow(flow_id, position)
    .criteria(|tip: Tip<S>| async move {
      let seen = tip.predecessor_seen().await;
      vec![criterion(move || seen)]
    })
}

impl<S: EventStore> TipSet<S> for SampleTips<S> {
  fn tips(&self) -> Vec<Tip<S>> {
    vec![self.anchor.clone(), self.anchor2.clone(), self.anchor3.clone()]
  }
}
