//! [`SqliteStore`] — the SQLite implementation of [`EventStore`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use futures::StreamExt as _;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use tipkit_core::{
  event::{EventValue, TriggerOccurrenceEvent, encode_dt},
  store::{CompletionStream, EventStore, OccurrenceStream},
};

use crate::{
  Result,
  encode::{completion_key, decode_events, encode_events, name_from_completion_key},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tipkit event store backed by a single SQLite file.
///
/// Every statement runs on the connection's dedicated thread, one closure at
/// a time, so each read-modify-write below is atomic with respect to every
/// other. Snapshots are published from inside the same closure that commits,
/// which keeps subscribers in commit order.
///
/// Cloning is cheap: the connection and channels are reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  occurrences:     Arc<watch::Sender<Vec<TriggerOccurrenceEvent>>>,
  completions:     Arc<watch::Sender<Vec<String>>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// A file that is not a database, or is corrupt, is replaced by an empty
  /// store. Whatever it held is lost.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    match Self::open_at(path).await {
      Err(e) if e.is_corruption() => {
        tracing::warn!(
          path = %path.display(),
          error = %e,
          "event store is corrupt; replacing it with an empty store",
        );
        remove_database_files(path)?;
        Self::open_at(path).await
      }
      result => result,
    }
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn open_at(path: &Path) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (occurrences, completions) = conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok((load_occurrences(conn)?, load_completions(conn)?))
      })
      .await?;

    Ok(Self {
      conn,
      occurrences: Arc::new(watch::channel(occurrences).0),
      completions: Arc::new(watch::channel(completions).0),
    })
  }

  /// Run `edit` inside an immediate transaction, then publish the resulting
  /// occurrence snapshot before returning.
  async fn edit_occurrences<R, F>(&self, edit: F) -> Result<R>
  where
    R: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
  {
    let publish = Arc::clone(&self.occurrences);
    let result = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = edit(&tx)?;
        let snapshot = load_occurrences(&tx)?;
        tx.commit()?;
        publish.send_replace(snapshot);
        Ok(result)
      })
      .await?;
    Ok(result)
  }

  /// Completion-table counterpart of [`Self::edit_occurrences`]. `edit`
  /// returns whether it changed anything; nothing is published otherwise.
  async fn edit_completions<F>(&self, edit: F) -> Result<()>
  where
    F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<bool> + Send + 'static,
  {
    let publish = Arc::clone(&self.completions);
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = edit(&tx)?;
        let snapshot = load_completions(&tx)?;
        tx.commit()?;
        if changed {
          publish.send_replace(snapshot);
        }
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = crate::Error;

  // ── Occurrences ───────────────────────────────────────────────────────────

  async fn record_occurrence(
    &self,
    trigger_id: String,
    value:      EventValue,
  ) -> Result<TriggerOccurrenceEvent> {
    value.check_encodable()?;

    let event = self
      .edit_occurrences(move |conn| {
        let existing: Option<String> = conn
          .query_row(
            "SELECT events FROM occurrences WHERE trigger_id = ?1",
            rusqlite::params![trigger_id],
            |row| row.get(0),
          )
          .optional()?;

        let mut events = existing
          .as_deref()
          .map(|text| decode_events(&trigger_id, text))
          .unwrap_or_default();

        // Never stamp an event earlier than the last one under this key.
        let now = Utc::now();
        let timestamp = events.last().map_or(now, |last| last.timestamp.max(now));
        let event = TriggerOccurrenceEvent::new(trigger_id.clone(), timestamp, value);
        events.push(event.clone());
        let encoded = encode_events(&events)
          .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        conn.execute(
          "INSERT INTO occurrences (trigger_id, events) VALUES (?1, ?2)
           ON CONFLICT (trigger_id) DO UPDATE SET events = excluded.events",
          rusqlite::params![trigger_id, encoded],
        )?;
        Ok(event)
      })
      .await?;

    tracing::debug!(trigger_id = %event.id, kind = event.value.kind(), "recorded occurrence");
    Ok(event)
  }

  fn occurrences(&self) -> OccurrenceStream {
    WatchStream::new(self.occurrences.subscribe()).boxed()
  }

  async fn remove_all_occurrences(&self) -> Result<()> {
    let removed = self
      .edit_occurrences(|conn| conn.execute("DELETE FROM occurrences", []))
      .await?;
    tracing::debug!(removed, "removed all occurrences");
    Ok(())
  }

  async fn remove_occurrences_of(&self, trigger_ids: Vec<String>) -> Result<()> {
    let removed = self
      .edit_occurrences(move |conn| {
        let mut stmt = conn.prepare("DELETE FROM occurrences WHERE trigger_id = ?1")?;
        let mut removed = 0;
        for id in &trigger_ids {
          removed += stmt.execute(rusqlite::params![id])?;
        }
        Ok(removed)
      })
      .await?;
    tracing::debug!(removed, "removed occurrences of selected triggers");
    Ok(())
  }

  // ── Completions ───────────────────────────────────────────────────────────

  async fn complete(&self, name: String) -> Result<()> {
    let key = completion_key(&name);
    let at  = encode_dt(Utc::now());

    // First write of the epoch wins; later calls keep the first instant.
    self
      .edit_completions(move |conn| {
        let inserted = conn.execute(
          "INSERT OR IGNORE INTO completions (key, completed_at) VALUES (?1, ?2)",
          rusqlite::params![key, at],
        )?;
        Ok(inserted > 0)
      })
      .await?;

    tracing::debug!(tip = %name, "tip completed");
    Ok(())
  }

  async fn is_complete(&self, name: String) -> Result<bool> {
    let key = completion_key(&name);
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM completions WHERE key = ?1",
              rusqlite::params![key],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }

  fn completions(&self) -> CompletionStream {
    WatchStream::new(self.completions.subscribe()).boxed()
  }

  async fn clear_completions(&self) -> Result<()> {
    self
      .edit_completions(|conn| Ok(conn.execute("DELETE FROM completions", [])? > 0))
      .await?;
    tracing::debug!("cleared all completions");
    Ok(())
  }

  async fn clear_completion(&self, names: Vec<String>) -> Result<()> {
    self
      .edit_completions(move |conn| {
        let mut stmt = conn.prepare("DELETE FROM completions WHERE key = ?1")?;
        let mut removed = 0;
        for name in &names {
          removed += stmt.execute(rusqlite::params![completion_key(name)])?;
        }
        Ok(removed > 0)
      })
      .await?;
    tracing::debug!("cleared selected completions");
    Ok(())
  }
}

// ─── Snapshot loading ────────────────────────────────────────────────────────

fn load_occurrences(
  conn: &rusqlite::Connection,
) -> rusqlite::Result<Vec<TriggerOccurrenceEvent>> {
  let mut stmt = conn.prepare("SELECT trigger_id, events FROM occurrences")?;
  let rows = stmt
    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut events: Vec<_> = rows
    .iter()
    .flat_map(|(trigger_id, text)| decode_events(trigger_id, text))
    .collect();
  events.sort_by_key(|e| e.timestamp);
  Ok(events)
}

fn load_completions(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare("SELECT key FROM completions ORDER BY key")?;
  let keys = stmt
    .query_map([], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(
    keys
      .iter()
      .filter_map(|key| name_from_completion_key(key))
      .map(str::to_owned)
      .collect(),
  )
}

/// Delete a database file together with its WAL and shared-memory siblings.
fn remove_database_files(path: &Path) -> std::io::Result<()> {
  for suffix in ["", "-wal", "-shm"] {
    let mut file = path.as_os_str().to_owned();
    file.push(suffix);
    match std::fs::remove_file(&file) {
      Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
      _ => {}
    }
  }
  Ok(())
}
