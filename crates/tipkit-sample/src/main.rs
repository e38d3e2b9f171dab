//! `tipkit-sample` — drive the sample onboarding flow from the terminal.
//!
//! Reads `tipkit.toml` (or the path given with `--config`) and `TIPKIT_*`
//! environment variables, then opens the SQLite event store.
//!
//! ```
//! tipkit-sample record clicks
//! tipkit-sample record toggle --bool true
//! tipkit-sample status
//! tipkit-sample watch
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tipkit::{EventValue, TipsEngine};
use tipkit_sample::{DEFAULT_FLOW_ID, DEFAULT_STORE_PATH, SampleConfig, SampleTips, watch};
use tipkit_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Contextual tips sample host")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tipkit.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Record one occurrence of a trigger.
  Record {
    trigger: String,
    #[arg(long = "bool", conflicts_with_all = ["int", "text"])]
    flag:    Option<bool>,
    #[arg(long, conflicts_with = "text")]
    int:     Option<i64>,
    #[arg(long)]
    text:    Option<String>,
  },
  /// Show every tip's eligibility and trigger counts.
  Status,
  /// Mark a tip as seen.
  Dismiss { tip: String },
  /// Start a new epoch: forget every dismissal and every occurrence.
  Reset,
  /// Observe the tips interactively.
  Watch,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .set_default("store_path", DEFAULT_STORE_PATH)?
    .set_default("flow_id", DEFAULT_FLOW_ID)?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TIPKIT"))
    .build()
    .context("failed to read config file")?;

  let cfg: SampleConfig = settings
    .try_deserialize()
    .context("failed to deserialise SampleConfig")?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let engine = TipsEngine::new(Arc::new(store));
  let tips = SampleTips::declare(engine.context(), &cfg.flow_id);
  engine.configure(&tips);

  match cli.command {
    Command::Record { trigger, flag, int, text } => {
      let value = match (flag, int, text) {
        (Some(b), _, _) => EventValue::Bool(b),
        (_, Some(i), _) => EventValue::Long(i),
        (_, _, Some(s)) => EventValue::String(s),
        _ => EventValue::Unit,
      };
      let event = engine
        .context()
        .trigger(trigger)
        .record_now(value)
        .await
        .context("failed to record occurrence")?;
      println!("recorded {} at {}", event.id, event.timestamp);
    }

    Command::Status => {
      for tip in engine.tips() {
        let position = tip
          .placement()
          .map(|p| format!("{}#{}", p.flow_id, p.position))
          .unwrap_or_else(|| "-".to_owned());
        println!(
          "{:<12} {:<18} seen={:<5} show={}",
          tip.name(),
          position,
          tip.has_been_seen().await,
          tip.show().await,
        );
        for trigger in tip.triggers() {
          let events = trigger.latest_events().await;
          let last = events.last().map(|e| format!("{:?}", e.value));
          println!(
            "    {:<10} {} event(s), last {}",
            trigger.id(),
            events.len(),
            last.unwrap_or_default(),
          );
        }
      }
    }

    Command::Dismiss { tip } => {
      let found = engine
        .tip(&tip)
        .with_context(|| format!("no tip named {tip:?}"))?;
      found.try_dismiss().await.context("failed to record completion")?;
      println!("dismissed {tip}");
    }

    Command::Reset => {
      engine.invalidate_all_tips().await.context("reset task failed")?;
      println!("all tips reset");
    }

    Command::Watch => {
      println!("commands: click | toggle on|off | dismiss | action <id> | quit");
      watch::run(&tips).await?;
    }
  }

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
