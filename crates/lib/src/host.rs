//! The seam between the engine and whatever presents it to a user.
//!
//! The engine never prints or prompts on its own. Everything user-facing
//! goes through a [`Host`]: workspace roots, choice prompts, notifications,
//! progress surfaces and the reload continuation.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
  Info,
  Warning,
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Severity::Info => "info",
      Severity::Warning => "warning",
      Severity::Error => "error",
    };
    f.write_str(s)
  }
}

/// One entry of a choice prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
  pub label: String,
  pub description: String,
}

/// A long-running, non-cancellable progress indicator.
pub trait Progress: Send {
  /// Update the message shown under the title.
  fn report(&self, message: &str);

  /// Dispose of the surface after success.
  fn finish(self: Box<Self>);

  /// Leave the surface visible for inspection after a failure.
  fn abandon(self: Box<Self>, detail: &str);
}

#[async_trait]
pub trait Host: Send + Sync {
  /// Root directories currently open in the workspace, in display order.
  fn workspace_roots(&self) -> Vec<PathBuf>;

  /// Ask the user to pick one option. `None` when dismissed.
  async fn choose(&self, placeholder: &str, options: &[Choice]) -> Option<String>;

  fn notify(&self, severity: Severity, message: &str);

  /// Notify with a single action button. Returns `true` if the user activated it.
  async fn notify_with_action(&self, severity: Severity, message: &str, action: &str) -> bool;

  fn begin_progress(&self, title: &str) -> Box<dyn Progress>;

  /// Reload the environment so updated profiles take effect.
  fn reload(&self);
}
