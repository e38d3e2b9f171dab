//! Engine tests against an in-memory SQLite store.

use std::{
  sync::{Arc, Mutex},
  time::Duration,
};

use futures::StreamExt as _;
use tipkit_core::action::TipAction;
use tipkit_store_sqlite::SqliteStore;

use crate::{
  EventValue, InlinePresentation, PopupPresentation, PresentationBridge, Tip,
  TipActionNavigation, TipContext, TipSet, TipsEngine, criterion, observe_anchor,
};

async fn engine() -> TipsEngine<SqliteStore> {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  TipsEngine::new(Arc::new(store))
}

/// Gate a tip on its predecessor in the flow.
fn after_predecessor(
  ctx: &TipContext<SqliteStore>,
  name: &str,
  flow: &str,
  position: usize,
) -> Tip<SqliteStore> {
  ctx
    .tip(name)
    .flow(flow, position)
    .criteria(|tip| async move {
      let seen = tip.predecessor_seen().await;
      vec![criterion(move || seen)]
    })
    .build()
}

#[derive(Default)]
struct RecordingNavigation {
  clicked: Mutex<Vec<TipAction>>,
}

impl TipActionNavigation for RecordingNavigation {
  fn on_action_clicked(&self, action: TipAction) {
    self.clicked.lock().unwrap().push(action);
  }
}

async fn wait_for<T>(fut: impl std::future::Future<Output = T>) -> T {
  tokio::time::timeout(Duration::from_secs(5), fut)
    .await
    .expect("timed out")
}

// ─── Trigger ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn trigger_without_events_yields_empty_list() {
  let engine = engine().await;
  let trigger = engine.context().trigger("never");

  assert!(wait_for(trigger.latest_events()).await.is_empty());
}

#[tokio::test]
async fn trigger_sees_only_its_own_events() {
  let engine = engine().await;
  let clicks = engine.context().trigger("clicks");
  let toggle = engine.context().trigger("toggle");

  for _ in 0..3 {
    clicks.record_now(()).await.unwrap();
  }
  toggle.record_now(true).await.unwrap();

  let events = clicks.latest_events().await;
  assert_eq!(events.len(), 3);
  assert!(events.iter().all(|e| e.id == "clicks"));
  assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn fire_and_forget_record_lands_eventually() {
  let engine = engine().await;
  let clicks = engine.context().trigger("clicks");

  let mut live = clicks.events();
  assert!(live.next().await.unwrap().is_empty());

  let _ = clicks.record(7_i32);
  let events = wait_for(live.next()).await.unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].value, EventValue::Int(7));
}

// ─── Tip ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn default_criteria_show_until_dismissed() {
  let engine = engine().await;
  let tip = engine.context().tip("welcome").build();

  assert!(tip.show().await);
  assert!(tip.show().await);

  tip.dismiss().await;
  for _ in 0..3 {
    assert!(!tip.show().await);
  }
  assert!(tip.has_been_seen().await);
}

#[tokio::test]
async fn failing_criterion_blocks_show() {
  let engine = engine().await;
  let tip = engine
    .context()
    .tip("never")
    .criteria(|_| async { vec![criterion(|| true), criterion(|| false)] })
    .build();

  assert!(!tip.show().await);
}

#[tokio::test]
async fn invalidate_all_restores_pre_dismissal_state() {
  let engine = engine().await;
  let tip = engine.context().tip("welcome").trigger("clicks").build();
  tip.triggers()[0].record_now(()).await.unwrap();

  tip.dismiss().await;
  assert!(!tip.show().await);

  engine.invalidate_all_tips().await.unwrap();

  assert!(tip.show().await);
  assert!(tip.latest_events_of("clicks").await.is_empty());
}

#[tokio::test]
async fn invalidate_tips_is_selective() {
  let engine = engine().await;
  let ctx = engine.context();
  let a = ctx.tip("a").trigger("a-clicks").build();
  let b = ctx.tip("b").trigger("b-clicks").build();

  a.triggers()[0].record_now(()).await.unwrap();
  b.triggers()[0].record_now(()).await.unwrap();
  a.dismiss().await;
  b.dismiss().await;

  engine.invalidate_tips(&[a.clone()]).await.unwrap();

  assert!(a.show().await);
  assert!(a.latest_events_of("a-clicks").await.is_empty());
  assert!(!b.show().await);
  assert_eq!(b.latest_events_of("b-clicks").await.len(), 1);
}

#[tokio::test]
async fn observe_combines_latest_of_every_trigger() {
  let engine = engine().await;
  let tip = engine
    .context()
    .tip("combined")
    .trigger("clicks")
    .trigger("toggle")
    .build();

  let mut observed = tip.observe();
  // Each trigger yields its (empty) current list once before anything else.
  let first = wait_for(observed.next()).await.unwrap();
  assert!(first.is_empty());

  tip.trigger("clicks").unwrap().record_now(()).await.unwrap();
  tip.trigger("toggle").unwrap().record_now(true).await.unwrap();

  let mut latest = Vec::new();
  while latest.len() < 2 {
    latest = wait_for(observed.next()).await.unwrap();
  }
  let ids: Vec<_> = latest.iter().map(|e| e.id.as_str()).collect();
  assert_eq!(ids, vec!["clicks", "toggle"]);
}

#[tokio::test]
async fn tip_without_triggers_observes_nothing() {
  let engine = engine().await;
  let tip = engine.context().tip("silent").build();

  assert!(wait_for(tip.observe().next()).await.is_none());
  assert!(tip.show().await);
}

#[tokio::test]
async fn render_snapshots_content_and_actions() {
  let engine = engine().await;
  let tip = engine
    .context()
    .tip("anchor")
    .title("Remember")
    .message_with(|| "With great power".to_string())
    .asset("info")
    .action("learn-more", "Learn More")
    .build();

  let rendered = tip.render();
  assert_eq!(rendered.title, "Remember");
  assert_eq!(rendered.message, "With great power");
  assert_eq!(rendered.asset, "info");
  assert_eq!(
    rendered.actions,
    vec![TipAction::new("anchor", "learn-more", "Learn More")]
  );
}

// ─── Flows ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn successor_waits_for_predecessor() {
  let engine = engine().await;
  let ctx = engine.context();
  let first = ctx.tip("first").flow("onboarding", 0).build();
  let second = after_predecessor(ctx, "second", "onboarding", 1);

  assert!(first.show().await);
  assert!(!second.show().await);

  first.dismiss().await;

  assert!(second.show().await);
}

#[tokio::test]
async fn sparse_association_leaves_gaps() {
  let engine = engine().await;
  let ctx = engine.context();
  let third = ctx.tip("third").flow("tour", 2).build();

  let slots = ctx.flows().lookup("tour");
  assert_eq!(slots.len(), 3);
  assert!(slots[0].is_none() && slots[1].is_none());
  assert!(slots[2].as_ref().unwrap().same_tip(&third));

  // Predecessor slot unset: gated shut.
  assert!(third.flow_predecessor().is_none());
  assert!(!third.predecessor_seen().await);

  let first = ctx.tip("first").flow("tour", 0).build();
  let slots = ctx.flows().lookup("tour");
  assert!(slots[0].as_ref().unwrap().same_tip(&first));
  assert!(slots[1].is_none());
}

#[tokio::test]
async fn association_overwrites_slot() {
  let engine = engine().await;
  let ctx = engine.context();
  let _old = ctx.tip("old").flow("tour", 0).build();
  let new = ctx.tip("new").flow("tour", 0).build();

  let slots = ctx.flows().lookup("tour");
  assert_eq!(slots.len(), 1);
  assert!(slots[0].as_ref().unwrap().same_tip(&new));
  assert_eq!(ctx.flows().flow_ids(), vec!["tour".to_string()]);
  assert!(ctx.flows().lookup("unknown").is_empty());
}

// ─── Coordination surface ────────────────────────────────────────────────────

struct TwoTips {
  a: Tip<SqliteStore>,
  b: Tip<SqliteStore>,
}

impl TipSet<SqliteStore> for TwoTips {
  fn tips(&self) -> Vec<Tip<SqliteStore>> { vec![self.a.clone(), self.b.clone()] }
}

#[tokio::test]
async fn configured_tips_are_found_by_name() {
  let engine = engine().await;
  let set = TwoTips {
    a: engine.context().tip("a").build(),
    b: engine.context().tip("b").build(),
  };
  engine.configure(&set);

  assert_eq!(engine.tips().len(), 2);
  assert!(engine.tip("b").unwrap().same_tip(&set.b));
  assert!(engine.tip("c").is_none());
}

// ─── Presentation bridge ─────────────────────────────────────────────────────

#[tokio::test]
async fn showing_replaces_the_active_presentation() {
  let engine = engine().await;
  let bridge = PresentationBridge::new(Arc::new(crate::NoOpNavigation));
  let a = engine.context().tip("a").build();
  let b = engine.context().tip("b").build();

  assert!(!bridge.is_tip_showing());
  bridge.show(PopupPresentation::new(a));
  bridge.show(InlinePresentation::new(b.clone()));

  let active = bridge.active().unwrap();
  assert!(active.tip().same_tip(&b));
}

#[tokio::test]
async fn bridge_dismiss_marks_active_tip_seen() {
  let engine = engine().await;
  let bridge = PresentationBridge::new(Arc::new(crate::NoOpNavigation));
  let a = engine.context().tip("a").build();

  bridge.show(PopupPresentation::new(a.clone()));
  bridge.dismiss().await;

  assert!(!bridge.is_tip_showing());
  assert!(a.has_been_seen().await);

  // Nothing active: a second dismissal is a no-op.
  bridge.dismiss().await;
}

#[tokio::test]
async fn action_click_dismisses_then_navigates() {
  let engine = engine().await;
  let navigation = Arc::new(RecordingNavigation::default());
  let bridge = PresentationBridge::new(navigation.clone());
  let a = engine.context().tip("a").action("learn-more", "Learn More").build();

  bridge.show(PopupPresentation::new(a.clone()));
  let action = a.actions()[0].clone();
  bridge.on_action_clicked(action.clone()).await;

  assert!(!bridge.is_tip_showing());
  assert!(a.has_been_seen().await);
  assert_eq!(*navigation.clicked.lock().unwrap(), vec![action]);
}

// ─── Anchor observation ──────────────────────────────────────────────────────

#[tokio::test]
async fn anchor_presents_when_criteria_become_true() {
  let engine = engine().await;
  let bridge = Arc::new(PresentationBridge::new(Arc::new(crate::NoOpNavigation)));
  let tip = engine
    .context()
    .tip("clicky")
    .trigger("clicks")
    .criteria(|tip| async move {
      let clicks = tip.latest_events_of("clicks").await.len();
      vec![criterion(move || clicks >= 2)]
    })
    .build();

  let mut slot = bridge.subscribe();
  let _sub = observe_anchor(tip.clone(), bridge.clone(), |tip| {
    PopupPresentation::new(tip.clone()).into()
  });

  tip.trigger("clicks").unwrap().record_now(()).await.unwrap();
  assert!(!bridge.is_tip_showing());

  tip.trigger("clicks").unwrap().record_now(()).await.unwrap();
  wait_for(slot.wait_for(|active| active.is_some())).await.unwrap();
  assert!(bridge.active().unwrap().tip().same_tip(&tip));
}

#[tokio::test]
async fn anchor_without_triggers_is_checked_on_mount() {
  let engine = engine().await;
  let bridge = Arc::new(PresentationBridge::new(Arc::new(crate::NoOpNavigation)));
  let tip = engine.context().tip("mount").build();

  let mut slot = bridge.subscribe();
  let _sub = observe_anchor(tip.clone(), bridge.clone(), |tip| {
    InlinePresentation::new(tip.clone()).into()
  });

  wait_for(slot.wait_for(|active| active.is_some())).await.unwrap();
}

#[tokio::test]
async fn successor_anchor_presents_after_predecessor_dismissed() {
  let engine = engine().await;
  let ctx = engine.context();
  let bridge = Arc::new(PresentationBridge::new(Arc::new(crate::NoOpNavigation)));
  let first = ctx.tip("first").flow("onboarding", 0).build();
  let second = after_predecessor(ctx, "second", "onboarding", 1);

  let mut slot = bridge.subscribe();
  let _sub = observe_anchor(second.clone(), bridge.clone(), |tip| {
    PopupPresentation::new(tip.clone()).into()
  });
  tokio::task::yield_now().await;
  assert!(!bridge.is_tip_showing());

  first.dismiss().await;

  let active = wait_for(slot.wait_for(|active| active.is_some()))
    .await
    .unwrap()
    .clone()
    .unwrap();
  assert!(active.tip().same_tip(&second));
}

#[tokio::test]
async fn cancelled_anchor_never_presents() {
  let engine = engine().await;
  let bridge = Arc::new(PresentationBridge::new(Arc::new(crate::NoOpNavigation)));
  let tip = engine
    .context()
    .tip("late")
    .trigger("clicks")
    .criteria(|tip| async move {
      let clicks = tip.latest_events_of("clicks").await.len();
      vec![criterion(move || clicks >= 1)]
    })
    .build();

  let sub = observe_anchor(tip.clone(), bridge.clone(), |tip| {
    PopupPresentation::new(tip.clone()).into()
  });
  sub.cancel();

  tip.trigger("clicks").unwrap().record_now(()).await.unwrap();
  tokio::time::sleep(Duration::from_millis(50)).await;

  assert!(!bridge.is_tip_showing());
}
