//! SQL schema for the tipkit SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Suffix appended to a tip name to form its key in `completions`.
pub const COMPLETION_SUFFIX: &str = "-completed_at";

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per seen tip; cleared at every epoch boundary.
CREATE TABLE IF NOT EXISTS completions (
    key          TEXT PRIMARY KEY,   -- '<tip name>-completed_at'
    completed_at TEXT NOT NULL       -- ISO 8601 UTC
);

-- One row per trigger id. `events` is a JSON array of tagged records,
-- rewritten as a whole on every append.
CREATE TABLE IF NOT EXISTS occurrences (
    trigger_id TEXT PRIMARY KEY,
    events     TEXT NOT NULL DEFAULT '[]'
);

PRAGMA user_version = 1;
";
