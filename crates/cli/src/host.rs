//! Terminal rendering of the engine's host seam.
//!
//! Notifications are printed, progress surfaces are indicatif spinners and
//! prompts are dialoguer widgets. Prompts block, so they run on the blocking
//! pool with the spinners suspended, one at a time.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::{OwoColorize, Stream};
use tokio::sync::Mutex;
use tracing::warn;

use nixdc_lib::host::{Choice, Host, Progress, Severity};

use crate::output::{print_detail, print_notification, print_warning};
use crate::prompts;

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct TerminalHost {
  roots: Vec<PathBuf>,
  /// Activate notification actions without asking.
  accept_actions: bool,
  /// Drop info notifications, e.g. while printing JSON.
  quiet: bool,
  interactive: bool,
  bars: MultiProgress,
  prompt: Mutex<()>,
  reload_requested: AtomicBool,
}

impl TerminalHost {
  pub fn new(roots: Vec<PathBuf>, accept_actions: bool, quiet: bool) -> Self {
    let interactive = prompts::is_interactive();
    let bars = if interactive && !quiet {
      MultiProgress::new()
    } else {
      MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    };

    Self {
      roots,
      accept_actions,
      quiet,
      interactive,
      bars,
      prompt: Mutex::new(()),
      reload_requested: AtomicBool::new(false),
    }
  }

  /// Whether an accepted notification asked for the environment to be reloaded.
  pub fn reload_requested(&self) -> bool {
    self.reload_requested.load(Ordering::SeqCst)
  }

  fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {prefix} {wide_msg}")
      .unwrap_or_else(|_| ProgressStyle::default_spinner())
      .tick_strings(SPINNER_TICKS)
  }
}

struct TerminalProgress {
  title: String,
  bar: ProgressBar,
  bars: MultiProgress,
}

impl Progress for TerminalProgress {
  fn report(&self, message: &str) {
    self.bar.set_message(message.to_string());
  }

  fn finish(self: Box<Self>) {
    self.bar.finish_and_clear();
    self.bars.remove(&self.bar);
  }

  fn abandon(self: Box<Self>, detail: &str) {
    self.bar.finish_and_clear();
    self.bars.remove(&self.bar);
    self.bars.suspend(|| print_detail(&self.title, detail));
  }
}

#[async_trait]
impl Host for TerminalHost {
  fn workspace_roots(&self) -> Vec<PathBuf> {
    self.roots.clone()
  }

  async fn choose(&self, placeholder: &str, options: &[Choice]) -> Option<String> {
    if !self.interactive {
      print_warning("No flake name given and no terminal to prompt on");
      return None;
    }

    let items: Vec<String> = options
      .iter()
      .map(|c| {
        format!(
          "{}  {}",
          c.label,
          c.description.if_supports_color(Stream::Stderr, |s| s.dimmed())
        )
      })
      .collect();
    let labels: Vec<String> = options.iter().map(|c| c.label.clone()).collect();
    let prompt = placeholder.to_string();
    let bars = self.bars.clone();

    let _turn = self.prompt.lock().await;
    let picked = tokio::task::spawn_blocking(move || bars.suspend(|| prompts::select(&prompt, &items))).await;

    match picked {
      Ok(Ok(index)) => index.and_then(|i| labels.get(i).cloned()),
      Ok(Err(e)) => {
        warn!(error = %e, "selection prompt failed");
        None
      }
      Err(e) => {
        warn!(error = %e, "selection prompt panicked");
        None
      }
    }
  }

  fn notify(&self, severity: Severity, message: &str) {
    if self.quiet && severity == Severity::Info {
      return;
    }
    self.bars.suspend(|| print_notification(severity, message));
  }

  async fn notify_with_action(&self, severity: Severity, message: &str, action: &str) -> bool {
    self.notify(severity, message);
    if self.accept_actions {
      return true;
    }
    if !self.interactive {
      return false;
    }

    let question = format!("{action}?");
    let bars = self.bars.clone();
    let _turn = self.prompt.lock().await;
    match tokio::task::spawn_blocking(move || bars.suspend(|| prompts::confirm(&question, false))).await {
      Ok(Ok(accepted)) => accepted,
      Ok(Err(e)) => {
        warn!(error = %e, "confirmation prompt failed");
        false
      }
      Err(e) => {
        warn!(error = %e, "confirmation prompt panicked");
        false
      }
    }
  }

  fn begin_progress(&self, title: &str) -> Box<dyn Progress> {
    let bar = self.bars.add(ProgressBar::new_spinner());
    bar.set_style(Self::spinner_style());
    bar.set_prefix(title.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));

    Box::new(TerminalProgress {
      title: title.to_string(),
      bar,
      bars: self.bars.clone(),
    })
  }

  fn reload(&self) {
    self.reload_requested.store(true, Ordering::SeqCst);
  }
}
