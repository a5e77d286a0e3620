//! Implementation of the `update-flake`, `update-all-flakes` and
//! `find-and-update-all-flakes` commands.
//!
//! The registry is not persisted between invocations, so every command starts
//! with a discovery, the same way an editor session discovers flakes on load.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use tracing::debug;

use nixdc_lib::sync::{SyncError, SyncOutcome, SyncStatus};

use crate::GlobalArgs;
use crate::cmd::Session;
use crate::output::{format_duration, symbols};

/// Update one flake, chosen by `name` or interactively.
///
/// Dismissing the prompt is not an error.
pub fn cmd_update_flake(global: &GlobalArgs, name: Option<&str>) -> Result<ExitCode> {
  let session = Session::new(global)?;
  if session.coordinator.find_flakes().is_err() {
    return session.finish(false);
  }

  let result = session.runtime.block_on(session.coordinator.sync_one(name));
  let success = match result {
    Ok(outcome) => outcome.status.is_success(),
    Err(SyncError::NoSelection) => true,
    Err(e) => {
      debug!(error = %e, "update-flake did not run");
      false
    }
  };

  session.finish(success)
}

/// Discover, update every flake and wait for all of them to report.
///
/// Serves both `update-all-flakes` and `find-and-update-all-flakes`: within one
/// process the bootstrap discovery and the explicit one are the same step.
pub fn cmd_update_all(global: &GlobalArgs) -> Result<ExitCode> {
  let start = Instant::now();
  let session = Session::new(global)?;

  let coordinator = session.coordinator.clone();
  let outcomes = session.runtime.block_on(async move {
    let dispatched = coordinator.find_and_sync_all()?;
    Ok::<_, SyncError>(dispatched.collect().await)
  });

  let success = match outcomes {
    Ok(outcomes) => {
      print_summary(&outcomes, start);
      outcomes.iter().all(|o| o.status.is_success())
    }
    Err(e) => {
      debug!(error = %e, "update-all did not run");
      false
    }
  };

  session.finish(success)
}

fn print_summary(outcomes: &[SyncOutcome], start: Instant) {
  let count = |f: fn(&SyncStatus) -> bool| outcomes.iter().filter(|o| f(&o.status)).count();
  let updated = count(|s| *s == SyncStatus::Updated);
  let unchanged = count(|s| *s == SyncStatus::Unchanged);
  let failed = outcomes.len() - updated - unchanged;

  let symbol = if failed == 0 {
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()).to_string()
  } else {
    symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
  };

  println!();
  println!(
    "{} {} updated, {} unchanged, {} failed {}",
    symbol,
    updated,
    unchanged,
    failed,
    format!("({})", format_duration(start.elapsed())).if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}
