//! Tip actions: the buttons a rendered tip offers, and the payload handed to
//! navigation when one is clicked.

use serde::{Deserialize, Serialize};

/// An action attached to a tip. The same record is forwarded, untouched, to
/// the host's navigation handler when the user clicks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TipAction {
  /// Stable name of the tip that owns the action.
  pub tip_id:    String,
  pub action_id: String,
  pub title:     String,
}

impl TipAction {
  pub fn new(
    tip_id: impl Into<String>,
    action_id: impl Into<String>,
    title: impl Into<String>,
  ) -> Self {
    Self {
      tip_id:    tip_id.into(),
      action_id: action_id.into(),
      title:     title.into(),
    }
  }
}
