//! User-facing messages emitted by the coordinator.

use std::path::Path;

use crate::consts::TASK_LABEL_PREFIX;
use crate::flake::FlakeSet;

pub const NOT_DISCOVERED: &str = "No flakes found. Run \"Find Flakes\" first.";
pub const NOT_FOUND: &str = "Flake not found";
pub const SELECT_PLACEHOLDER: &str = "Select a flake to update";
pub const PROGRESS_MESSAGE: &str = "Running nix print-dev-env...";
pub const RELOAD_ACTION: &str = "Reload Environment";

/// Lines of stderr kept on a failed progress surface.
const STDERR_TAIL_LINES: usize = 20;

pub fn found(set: &FlakeSet) -> String {
  format!("Found {} flake(s): {}", set.len(), set.names().join(", "))
}

pub fn progress_title(profile: &Path) -> String {
  format!("Updating Nix profile: {}", profile.display())
}

pub fn unchanged(name: &str) -> String {
  format!("{TASK_LABEL_PREFIX} {name}: unchanged")
}

pub fn updated(name: &str) -> String {
  format!("{TASK_LABEL_PREFIX} {name}: updated\nPlease reload the environment to apply changes.")
}

pub fn failed(name: &str) -> String {
  format!("{TASK_LABEL_PREFIX} {name}: failed to build")
}

pub fn write_failed(name: &str, err: &dyn std::fmt::Display) -> String {
  format!("{TASK_LABEL_PREFIX} {name}: failed to write profile ({err})")
}

/// The last few lines of a failed unit's stderr.
pub fn stderr_tail(stderr: &str) -> String {
  let lines: Vec<&str> = stderr.trim_end().lines().collect();
  let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
  lines[start..].join("\n")
}
