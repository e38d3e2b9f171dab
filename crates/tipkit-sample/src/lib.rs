//! The tipkit sample host: a three-step onboarding flow driven from the
//! command line.

pub mod tips;
pub mod watch;

use std::path::PathBuf;

use serde::Deserialize;

pub use tips::SampleTips;

/// Flow the sample tips are placed in unless configured otherwise.
pub const DEFAULT_FLOW_ID: &str = "onboarding-flow";

/// Store file used when no `store_path` is configured.
pub const DEFAULT_STORE_PATH: &str = "tipkit.db";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `tipkit.toml` and `TIPKIT_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct SampleConfig {
  pub store_path: PathBuf,
  pub flow_id:    String,
}
