//! Encoding and decoding helpers between engine types and the plain-text
//! representations stored in SQLite columns.
//!
//! An `occurrences.events` cell is a JSON array of tagged records (see
//! [`TriggerOccurrenceEvent::to_record`]). Decoding is lenient: a record that
//! fails to decode is dropped, and a cell that is not an array at all decodes
//! as empty.

use serde_json::Value;
use tipkit_core::event::TriggerOccurrenceEvent;

use crate::schema::COMPLETION_SUFFIX;

// ─── Completion keys ─────────────────────────────────────────────────────────

pub fn completion_key(name: &str) -> String { format!("{name}{COMPLETION_SUFFIX}") }

pub fn name_from_completion_key(key: &str) -> Option<&str> {
  key.strip_suffix(COMPLETION_SUFFIX)
}

// ─── Occurrence sets ─────────────────────────────────────────────────────────

pub fn encode_events(events: &[TriggerOccurrenceEvent]) -> tipkit_core::Result<String> {
  let records = events
    .iter()
    .map(TriggerOccurrenceEvent::to_record)
    .collect::<tipkit_core::Result<Vec<_>>>()?;
  Ok(Value::Array(records).to_string())
}

/// Decode every readable record of the set stored under `trigger_id`,
/// ordered by timestamp.
pub fn decode_events(trigger_id: &str, text: &str) -> Vec<TriggerOccurrenceEvent> {
  let records = match serde_json::from_str::<Vec<Value>>(text) {
    Ok(records) => records,
    Err(e) => {
      tracing::warn!(trigger_id, error = %e, "unreadable occurrence set; treating as empty");
      return Vec::new();
    }
  };

  let mut events: Vec<_> = records
    .into_iter()
    .filter_map(|record| match TriggerOccurrenceEvent::from_record(record) {
      Ok(event) => Some(event),
      Err(e) => {
        tracing::debug!(trigger_id, error = %e, "dropping undecodable occurrence");
        None
      }
    })
    .collect();

  events.sort_by_key(|e| e.timestamp);
  events
}
