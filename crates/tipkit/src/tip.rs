//! [`Tip`] — a single contextual hint and the decision of whether it may be
//! shown right now.
//!
//! A tip is a record, not a subclass: its triggers, eligibility criteria,
//! flow placement and content producers are all supplied through
//! [`TipBuilder`]. Its "seen" state lives in the event store, so the object
//! itself is cheap to clone and holds nothing that needs persisting.

use std::{
  fmt,
  future::Future,
  sync::{Arc, Weak},
};

use futures::{
  FutureExt as _, StreamExt as _,
  future::{self, BoxFuture},
  stream::{self, BoxStream},
};
use tipkit_core::{action::TipAction, event::TriggerOccurrenceEvent, store::EventStore};

use crate::{context::TipContext, flow::FlowRegistry, trigger::Trigger};

// ─── Criteria & content ──────────────────────────────────────────────────────

/// One zero-argument eligibility predicate. A tip is eligible only when all of
/// its predicates hold.
pub type EligibilityCriterion = Box<dyn Fn() -> bool + Send + Sync>;

/// Box a closure as an [`EligibilityCriterion`].
pub fn criterion(f: impl Fn() -> bool + Send + Sync + 'static) -> EligibilityCriterion {
  Box::new(f)
}

type CriteriaFn<S> =
  Arc<dyn Fn(Tip<S>) -> BoxFuture<'static, Vec<EligibilityCriterion>> + Send + Sync>;

/// Produces one piece of rendered content. The engine never interprets it.
type ContentProducer = Arc<dyn Fn() -> String + Send + Sync>;

/// A snapshot of everything a renderer needs to draw a tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTip {
  pub asset:   String,
  pub title:   String,
  pub message: String,
  pub actions: Vec<TipAction>,
}

/// Where a tip sits in a named, ordered flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowPlacement {
  pub flow_id:  String,
  pub position: usize,
}

// ─── Tip ─────────────────────────────────────────────────────────────────────

/// A contextual tip. Cloning is cheap; all clones share one definition.
pub struct Tip<S> {
  inner: Arc<TipInner<S>>,
}

struct TipInner<S> {
  name:      String,
  store:     Arc<S>,
  flows:     Arc<FlowRegistry<S>>,
  triggers:  Vec<Trigger<S>>,
  criteria:  Option<CriteriaFn<S>>,
  placement: Option<FlowPlacement>,
  asset:     ContentProducer,
  title:     ContentProducer,
  message:   ContentProducer,
  actions:   Vec<TipAction>,
}

impl<S> Clone for Tip<S> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<S> fmt::Debug for Tip<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Tip")
      .field("name", &self.inner.name)
      .field("triggers", &self.inner.triggers)
      .field("placement", &self.inner.placement)
      .finish_non_exhaustive()
  }
}

impl<S> Tip<S> {
  /// The stable name completions are recorded under.
  pub fn name(&self) -> &str { &self.inner.name }

  pub fn triggers(&self) -> &[Trigger<S>] { &self.inner.triggers }

  pub fn placement(&self) -> Option<&FlowPlacement> { self.inner.placement.as_ref() }

  pub fn actions(&self) -> &[TipAction] { &self.inner.actions }

  pub fn asset(&self) -> String { (self.inner.asset)() }

  pub fn title(&self) -> String { (self.inner.title)() }

  pub fn message(&self) -> String { (self.inner.message)() }

  /// Call every content producer once.
  pub fn render(&self) -> RenderedTip {
    RenderedTip {
      asset:   self.asset(),
      title:   self.title(),
      message: self.message(),
      actions: self.inner.actions.clone(),
    }
  }

  /// Whether both handles refer to the same tip definition.
  pub fn same_tip(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }

  pub fn downgrade(&self) -> WeakTip<S> { WeakTip(Arc::downgrade(&self.inner)) }
}

impl<S: EventStore> Tip<S> {
  /// The registered trigger with the given id, if any.
  pub fn trigger(&self, id: &str) -> Option<&Trigger<S>> {
    self.inner.triggers.iter().find(|t| t.id() == id)
  }

  /// Current events of the registered trigger `id`; empty if there is no
  /// such trigger or nothing has been recorded.
  pub async fn latest_events_of(&self, id: &str) -> Vec<TriggerOccurrenceEvent> {
    match self.trigger(id) {
      Some(trigger) => trigger.latest_events().await,
      None => Vec::new(),
    }
  }

  /// Combined events of every registered trigger.
  ///
  /// Once each trigger has yielded at least once, a new combined list is
  /// yielded whenever any one of them yields, built from each trigger's
  /// latest list. A tip without triggers yields nothing.
  pub fn observe(&self) -> BoxStream<'static, Vec<TriggerOccurrenceEvent>> {
    let sources = self
      .inner
      .triggers
      .iter()
      .enumerate()
      .map(|(slot, trigger)| trigger.events().map(move |events| (slot, events)).boxed());

    stream::select_all(sources)
      .scan(
        vec![None; self.inner.triggers.len()],
        |latest: &mut Vec<Option<Vec<TriggerOccurrenceEvent>>>, (slot, events)| {
          latest[slot] = Some(events);
          let combined = latest
            .iter()
            .all(Option::is_some)
            .then(|| latest.iter().flatten().flatten().cloned().collect::<Vec<_>>());
          future::ready(Some(combined))
        },
      )
      .filter_map(future::ready)
      .boxed()
  }

  /// Yields whenever the set of completed tips changes, for tips placed in a
  /// flow; a predecessor being dismissed may have made this tip eligible.
  /// Tips outside any flow get a stream that ends immediately.
  pub fn flow_continuation(&self) -> BoxStream<'static, ()> {
    if self.inner.placement.is_none() {
      return stream::empty().boxed();
    }
    self.inner.store.completions().map(|_| ()).boxed()
  }

  /// Evaluate the criteria closure. Without one, a single always-true
  /// predicate is returned.
  pub async fn criteria(&self) -> Vec<EligibilityCriterion> {
    match &self.inner.criteria {
      Some(criteria) => criteria(self.clone()).await,
      None => vec![criterion(|| true)],
    }
  }

  /// The single decision point: every criterion holds and the tip has not
  /// been seen this epoch.
  pub async fn show(&self) -> bool {
    let criteria = self.criteria().await;
    let eligible = criteria.iter().all(|c| c());
    eligible && !self.has_been_seen().await
  }

  /// Whether a completion is recorded for this tip. A store failure reads as
  /// seen, which keeps the tip hidden.
  pub async fn has_been_seen(&self) -> bool {
    match self.inner.store.is_complete(self.inner.name.clone()).await {
      Ok(seen) => seen,
      Err(e) => {
        tracing::warn!(tip = %self.inner.name, error = %e, "completion lookup failed");
        true
      }
    }
  }

  /// Mark the tip as seen for the rest of the epoch.
  pub async fn dismiss(&self) {
    if let Err(e) = self.try_dismiss().await {
      tracing::warn!(tip = %self.inner.name, error = %e, "failed to record completion");
    }
  }

  /// [`Self::dismiss`], returning the store error instead of logging it.
  pub async fn try_dismiss(&self) -> Result<(), S::Error> {
    self.inner.store.complete(self.inner.name.clone()).await
  }

  /// The tip registered one position earlier in this tip's flow.
  pub fn flow_predecessor(&self) -> Option<Tip<S>> {
    let placement = self.inner.placement.as_ref()?;
    let previous = placement.position.checked_sub(1)?;
    self
      .inner
      .flows
      .lookup(&placement.flow_id)
      .into_iter()
      .nth(previous)
      .flatten()
  }

  /// Position-indexed predecessor gating: `true` for tips outside a flow or
  /// at position 0, otherwise whether the tip at the previous position has
  /// been seen. An unregistered predecessor counts as not seen.
  pub async fn predecessor_seen(&self) -> bool {
    match &self.inner.placement {
      None => true,
      Some(placement) if placement.position == 0 => true,
      Some(_) => match self.flow_predecessor() {
        Some(previous) => previous.has_been_seen().await,
        None => false,
      },
    }
  }
}

// ─── WeakTip ─────────────────────────────────────────────────────────────────

/// A non-owning handle, held by the flow registry so that tips and the
/// registry they are listed in do not keep each other alive.
pub struct WeakTip<S>(Weak<TipInner<S>>);

impl<S> Clone for WeakTip<S> {
  fn clone(&self) -> Self { Self(Weak::clone(&self.0)) }
}

impl<S> WeakTip<S> {
  pub fn upgrade(&self) -> Option<Tip<S>> { self.0.upgrade().map(|inner| Tip { inner }) }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Declares a tip. Obtained from [`TipContext::tip`].
///
/// The trigger list is fixed once [`Self::build`] returns.
pub struct TipBuilder<S> {
  ctx:       TipContext<S>,
  name:      String,
  triggers:  Vec<Trigger<S>>,
  criteria:  Option<CriteriaFn<S>>,
  placement: Option<FlowPlacement>,
  asset:     ContentProducer,
  title:     ContentProducer,
  message:   ContentProducer,
  actions:   Vec<(String, String)>,
}

fn fixed(text: String) -> ContentProducer { Arc::new(move || text.clone()) }

impl<S: EventStore> TipBuilder<S> {
  pub(crate) fn new(ctx: TipContext<S>, name: String) -> Self {
    Self {
      ctx,
      name,
      triggers: Vec::new(),
      criteria: None,
      placement: None,
      asset: fixed(String::new()),
      title: fixed(String::new()),
      message: fixed(String::new()),
      actions: Vec::new(),
    }
  }

  /// Register a trigger whose events this tip observes.
  pub fn await_trigger(mut self, trigger: Trigger<S>) -> Self {
    self.triggers.push(trigger);
    self
  }

  /// Create a trigger on the context's store and register it.
  pub fn trigger(self, id: impl Into<String>) -> Self {
    let trigger = self.ctx.trigger(id);
    self.await_trigger(trigger)
  }

  /// Place the tip at `position` in the flow `flow_id`.
  pub fn flow(mut self, flow_id: impl Into<String>, position: usize) -> Self {
    self.placement = Some(FlowPlacement { flow_id: flow_id.into(), position });
    self
  }

  /// Set the eligibility criteria. The closure receives the built tip, so it
  /// can read the tip's own triggers and its flow predecessor.
  pub fn criteria<F, Fut>(mut self, criteria: F) -> Self
  where
    F: Fn(Tip<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<EligibilityCriterion>> + Send + 'static,
  {
    self.criteria = Some(Arc::new(move |tip: Tip<S>| criteria(tip).boxed()));
    self
  }

  pub fn asset(mut self, text: impl Into<String>) -> Self {
    self.asset = fixed(text.into());
    self
  }

  pub fn asset_with(mut self, producer: impl Fn() -> String + Send + Sync + 'static) -> Self {
    self.asset = Arc::new(producer);
    self
  }

  pub fn title(mut self, text: impl Into<String>) -> Self {
    self.title = fixed(text.into());
    self
  }

  pub fn title_with(mut self, producer: impl Fn() -> String + Send + Sync + 'static) -> Self {
    self.title = Arc::new(producer);
    self
  }

  pub fn message(mut self, text: impl Into<String>) -> Self {
    self.message = fixed(text.into());
    self
  }

  pub fn message_with(
    mut self,
    producer: impl Fn() -> String + Send + Sync + 'static,
  ) -> Self {
    self.message = Arc::new(producer);
    self
  }

  pub fn action(mut self, action_id: impl Into<String>, title: impl Into<String>) -> Self {
    self.actions.push((action_id.into(), title.into()));
    self
  }

  /// Finish the declaration. A tip with a flow placement is associated with
  /// the context's flow registry.
  pub fn build(self) -> Tip<S> {
    let actions = self
      .actions
      .into_iter()
      .map(|(action_id, title)| TipAction::new(self.name.clone(), action_id, title))
      .collect();

    let tip = Tip {
      inner: Arc::new(TipInner {
        name: self.name,
        store: Arc::clone(self.ctx.store()),
        flows: Arc::clone(self.ctx.flows()),
        triggers: self.triggers,
        criteria: self.criteria,
        placement: self.placement,
        asset: self.asset,
        title: self.title,
        message: self.message,
        actions,
      }),
    };

    if let Some(placement) = tip.placement() {
      self.ctx.flows().associate(&tip, placement.position, &placement.flow_id);
    }
    tip
  }
}
