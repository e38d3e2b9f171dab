//! Trigger occurrence events — the unit of everything the engine records.
//!
//! An event is an immutable observation that something happened under a
//! trigger id, optionally carrying a primitive value. Many events share one
//! id; within an id they are ordered by `timestamp`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

// ─── Value ───────────────────────────────────────────────────────────────────

/// The primitive payload of an occurrence. `Unit` marks a presence-only event
/// and is persisted without a `value` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventValue {
  #[default]
  #[serde(rename = "none")]
  Unit,
  Bool(bool),
  Int(i32),
  Long(i64),
  Float(f32),
  Double(f64),
  String(String),
}

impl EventValue {
  /// The discriminant written to the `kind` field of a persisted record.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Unit => "none",
      Self::Bool(_) => "bool",
      Self::Int(_) => "int",
      Self::Long(_) => "long",
      Self::Float(_) => "float",
      Self::Double(_) => "double",
      Self::String(_) => "string",
    }
  }

  pub fn is_unit(&self) -> bool { matches!(self, Self::Unit) }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(b) => Some(*b),
      _ => None,
    }
  }

  /// Integral payloads widened to `i64`.
  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Int(i) => Some(i64::from(*i)),
      Self::Long(l) => Some(*l),
      _ => None,
    }
  }

  /// Floating-point payloads widened to `f64`.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Float(f) => Some(f64::from(*f)),
      Self::Double(d) => Some(*d),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::String(s) => Some(s),
      _ => None,
    }
  }

  /// Whether the value survives encoding unchanged. JSON has no
  /// representation for NaN or the infinities.
  pub fn check_encodable(&self) -> Result<()> {
    let finite = match self {
      Self::Float(f) => f.is_finite(),
      Self::Double(d) => d.is_finite(),
      _ => true,
    };
    if !finite {
      return Err(Error::NonFiniteValue { kind: self.kind() });
    }
    Ok(())
  }
}

impl From<()> for EventValue {
  fn from(_: ()) -> Self { Self::Unit }
}

impl From<bool> for EventValue {
  fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<i32> for EventValue {
  fn from(i: i32) -> Self { Self::Int(i) }
}

impl From<i64> for EventValue {
  fn from(l: i64) -> Self { Self::Long(l) }
}

impl From<f32> for EventValue {
  fn from(f: f32) -> Self { Self::Float(f) }
}

impl From<f64> for EventValue {
  fn from(d: f64) -> Self { Self::Double(d) }
}

impl From<String> for EventValue {
  fn from(s: String) -> Self { Self::String(s) }
}

impl From<&str> for EventValue {
  fn from(s: &str) -> Self { Self::String(s.to_owned()) }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// RFC 3339, UTC, with as many fractional digits as needed to be lossless.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A single recorded occurrence of a trigger.
///
/// Persisted as `{"id": "...", "timestamp": "...", "kind": "...", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerOccurrenceEvent {
  /// The trigger id this event was recorded under. Not unique.
  pub id:        String,
  pub timestamp: DateTime<Utc>,
  #[serde(flatten)]
  pub value:     EventValue,
}

impl TriggerOccurrenceEvent {
  pub fn new(
    id: impl Into<String>,
    timestamp: DateTime<Utc>,
    value: EventValue,
  ) -> Self {
    Self { id: id.into(), timestamp, value }
  }

  /// Encode as a persisted record. Fails for values that JSON cannot carry.
  pub fn to_record(&self) -> Result<Value> {
    self.value.check_encodable()?;
    Ok(serde_json::to_value(self)?)
  }

  /// Decode a persisted record, switching on its `kind` discriminator.
  pub fn from_record(record: Value) -> Result<Self> {
    Ok(serde_json::from_value(record)?)
  }
}
