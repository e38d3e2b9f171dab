//! Interactive mode: every sample tip is observed as if its anchor were on
//! screen, and presentations are printed as they appear.
//!
//! Commands are read from stdin, one per line:
//!
//! ```text
//! click              record a click
//! toggle on|off      record the toggle state
//! dismiss            dismiss the showing tip
//! action <id>        click an action of the showing tip
//! quit
//! ```

use std::sync::Arc;

use anyhow::{Context as _, bail};
use tipkit::{
  EventStore, InlinePresentation, PopupPresentation, PresentationBridge, TipAction,
  TipActionNavigation, TipPresentation, observe_anchor,
};
use tokio::io::{AsyncBufReadExt as _, BufReader};

use crate::tips::{CLICKS, SampleTips, TOGGLE};

/// Prints the action it would navigate to.
struct PrintNavigation;

impl TipActionNavigation for PrintNavigation {
  fn on_action_clicked(&self, action: TipAction) {
    println!("-> navigate: {} / {} ({})", action.tip_id, action.action_id, action.title);
  }
}

enum Command {
  Click,
  Toggle(bool),
  Dismiss,
  Action(String),
  Quit,
}

fn parse(line: &str) -> anyhow::Result<Command> {
  let mut words = line.split_whitespace();
  let command = match (words.next(), words.next()) {
    (Some("click"), None) => Command::Click,
    (Some("toggle"), Some("on")) => Command::Toggle(true),
    (Some("toggle"), Some("off")) => Command::Toggle(false),
    (Some("dismiss"), None) => Command::Dismiss,
    (Some("action"), Some(id)) => Command::Action(id.to_owned()),
    (Some("quit" | "exit"), None) => Command::Quit,
    _ => bail!("unrecognised command: {line:?}"),
  };
  if words.next().is_some() {
    bail!("unexpected arguments: {line:?}");
  }
  Ok(command)
}

/// Run until `quit` or end of input.
pub async fn run<S: EventStore>(tips: &SampleTips<S>) -> anyhow::Result<()> {
  let bridge = Arc::new(PresentationBridge::new(Arc::new(PrintNavigation)));

  let mut slot = bridge.subscribe();
  let printer = tokio::spawn(async move {
    while slot.changed().await.is_ok() {
      match slot.borrow_and_update().as_ref() {
        Some(presentation) => print_presentation(presentation),
        None => println!("(no tip showing)"),
      }
    }
  });

  let _anchors = [
    observe_anchor(tips.anchor.clone(), bridge.clone(), |tip| {
      PopupPresentation::new(tip.clone()).into()
    }),
    observe_anchor(tips.anchor2.clone(), bridge.clone(), |tip| {
      PopupPresentation::new(tip.clone()).into()
    }),
    observe_anchor(tips.anchor3.clone(), bridge.clone(), |tip| {
      InlinePresentation::new(tip.clone()).into()
    }),
  ];

  let clicks = tips.anchor.trigger(CLICKS).context("anchor has no clicks trigger")?;
  let toggle = tips.anchor.trigger(TOGGLE).context("anchor has no toggle trigger")?;

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
    if line.trim().is_empty() {
      continue;
    }
    let command = match parse(&line) {
      Ok(command) => command,
      Err(e) => {
        eprintln!("{e}");
        continue;
      }
    };

    match command {
      Command::Click => {
        clicks.record_now(()).await.context("failed to record click")?;
      }
      Command::Toggle(on) => {
        toggle.record_now(on).await.context("failed to record toggle")?;
      }
      Command::Dismiss => bridge.dismiss().await,
      Command::Action(id) => {
        let action = bridge
          .active()
          .and_then(|p| p.content().actions.iter().find(|a| a.action_id == id).cloned());
        match action {
          Some(action) => bridge.on_action_clicked(action).await,
          None => eprintln!("no action {id:?} on the showing tip"),
        }
      }
      Command::Quit => break,
    }
  }

  printer.abort();
  Ok(())
}

fn print_presentation<S>(presentation: &TipPresentation<S>) {
  let kind = match presentation {
    TipPresentation::Popup(_) => "popup",
    TipPresentation::Inline(_) => "inline",
  };
  let content = presentation.content();
  println!("[{kind}] {} ({}): {}", content.title, content.asset, content.message);
  for action in &content.actions {
    println!("    action {}: {}", action.action_id, action.title);
  }
}
