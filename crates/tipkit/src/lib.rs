//! The tipkit engine: triggers, tips, flows, and the coordination surface
//! that decides which contextual tip may be shown, and when.
//!
//! Everything here is generic over an [`EventStore`] backend. Rendering is
//! left to the host: the engine only hands a [`TipPresentation`] to the
//! [`PresentationBridge`] and receives dismissals and action clicks back.

pub mod anchor;
pub mod bridge;
pub mod context;
pub mod engine;
pub mod flow;
pub mod presentation;
pub mod tip;
pub mod trigger;

pub use anchor::{AnchorSubscription, observe_anchor};
pub use bridge::{NoOpNavigation, PresentationBridge, TipActionNavigation};
pub use context::TipContext;
pub use engine::{TipSet, TipsEngine};
pub use flow::FlowRegistry;
pub use presentation::{
  Alignment, InlinePresentation, Offset, PopupPresentation, Size, TipPresentation,
};
pub use tip::{
  EligibilityCriterion, FlowPlacement, RenderedTip, Tip, TipBuilder, WeakTip, criterion,
};
pub use tipkit_core::{
  action::TipAction,
  event::{EventValue, TriggerOccurrenceEvent},
  store::EventStore,
};
pub use trigger::Trigger;

#[cfg(test)]
mod tests;
