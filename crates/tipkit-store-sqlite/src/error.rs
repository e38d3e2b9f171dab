//! Error type for `tipkit-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The event could not be encoded; nothing was written.
  #[error("core error: {0}")]
  Core(#[from] tipkit_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// Whether the error means the file on disk is not a usable database.
  pub fn is_corruption(&self) -> bool {
    use rusqlite::ErrorCode;

    let Self::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(e, _),
    )) = self
    else {
      return false;
    };
    matches!(e.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
