//! Error types for `tipkit-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// NaN and the infinities have no JSON representation.
  #[error("{kind} value is not finite and cannot be persisted")]
  NonFiniteValue { kind: &'static str },

  /// A record failed to encode or decode. Unknown kinds, mistyped values and
  /// malformed timestamps all land here.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
