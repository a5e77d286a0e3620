//! Units of work and completion correlation.
//!
//! A unit of work is one external shell invocation. Submitting it to the
//! [`TaskHub`] registers a listener under a freshly generated [`TaskToken`]
//! and starts the process in the background. When the process exits, the hub
//! dispatches a [`TaskEvent`] to the listener with the matching token and
//! removes that listener. Events for unknown tokens are ignored.
//!
//! Labels are for display only; two units may share a label without their
//! completions being confused.

mod launcher;

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

pub use launcher::{Launcher, ShellLauncher};

#[derive(Debug, Error)]
pub enum TaskError {
  #[error("unit of work '{label}' ended without reporting completion")]
  Abandoned { label: String },
}

/// Correlation key of one submitted unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskToken(u64);


impl fmt::Display for TaskToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// A shell script with a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOfWork {
  pub label: String,
  pub script: String,
}

impl UnitOfWork {
  pub fn new(label: impl Into<String>, script: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      script: script.into(),
    }
  }
}

/// Terminal state of a unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskExit {
  /// Exit code, `None` when the process could not be started or was killed by a signal.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl TaskExit {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }

  pub fn launch_failed(err: &io::Error) -> Self {
    Self {
      code: None,
      stdout: String::new(),
      stderr: err.to_string(),
    }
  }
}

/// Completion notification for one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEvent {
  pub token: TaskToken,
  pub label: String,
  pub exit: TaskExit,
}

type Listeners = Arc<Mutex<HashMap<TaskToken, oneshot::Sender<TaskEvent>>>>;

/// A registered listener awaiting its completion event.
#[derive(Debug)]
pub struct PendingTask {
  token: TaskToken,
  label: String,
  rx: oneshot::Receiver<TaskEvent>,
}

impl PendingTask {
  pub fn token(&self) -> TaskToken {
    self.token
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  /// Take the event if it has already arrived.
  pub fn try_take(&mut self) -> Option<TaskEvent> {
    self.rx.try_recv().ok()
  }

  /// Suspend until the correlated completion arrives.
  pub async fn wait(self) -> Result<TaskEvent, TaskError> {
    self.rx.await.map_err(|_| TaskError::Abandoned { label: self.label })
  }
}

/// Launches units of work and routes their completions by token.
pub struct TaskHub {
  launcher: Arc<dyn Launcher>,
  listeners: Listeners,
  next_token: AtomicU64,
}

impl TaskHub {
  pub fn new(launcher: Arc<dyn Launcher>) -> Self {
    Self {
      launcher,
      listeners: Arc::new(Mutex::new(HashMap::new())),
      next_token: AtomicU64::new(0),
    }
  }

  /// Register a listener for a unit of work that will be started elsewhere.
  pub fn register(&self, label: impl Into<String>) -> PendingTask {
    let token = TaskToken(self.next_token.fetch_add(1, Ordering::Relaxed) + 1);
    let (tx, rx) = oneshot::channel();
    lock(&self.listeners).insert(token, tx);

    PendingTask {
      token,
      label: label.into(),
      rx,
    }
  }

  /// Start `unit` in the background and return its listener.
  ///
  /// Must be called within a tokio runtime.
  pub fn submit(&self, unit: UnitOfWork) -> PendingTask {
    let pending = self.register(unit.label.clone());
    let token = pending.token;
    let launcher = Arc::clone(&self.launcher);
    let listeners = Arc::clone(&self.listeners);

    info!(%token, label = %unit.label, "executing unit of work");

    tokio::spawn(async move {
      let label = unit.label.clone();
      // The launcher runs in its own task so a panic still ends in a dispatch.
      let run = tokio::spawn(async move { launcher.run(&unit).await });
      let exit = match run.await {
        Ok(Ok(exit)) => exit,
        Ok(Err(e)) => {
          warn!(%token, %label, error = %e, "failed to launch unit of work");
          TaskExit::launch_failed(&e)
        }
        Err(e) => {
          warn!(%token, %label, error = %e, "unit of work aborted");
          TaskExit::launch_failed(&io::Error::other(e.to_string()))
        }
      };
      dispatch_to(
        &listeners,
        TaskEvent { token, label, exit },
      );
    });

    pending
  }

  /// Deliver a completion event to its listener, releasing the listener.
  ///
  /// Returns `false` when no listener is registered for the event's token.
  pub fn dispatch(&self, event: TaskEvent) -> bool {
    dispatch_to(&self.listeners, event)
  }

  /// Number of listeners still waiting for their completion.
  pub fn pending(&self) -> usize {
    lock(&self.listeners).len()
  }
}

fn lock(listeners: &Listeners) -> std::sync::MutexGuard<'_, HashMap<TaskToken, oneshot::Sender<TaskEvent>>> {
  listeners.lock().unwrap_or_else(|e| e.into_inner())
}

fn dispatch_to(listeners: &Listeners, event: TaskEvent) -> bool {
  info!(token = %event.token, label = %event.label, code = ?event.exit.code, "unit of work ended");

  let Some(tx) = lock(listeners).remove(&event.token) else {
    debug!(token = %event.token, label = %event.label, "ignoring completion with no listener");
    return false;
  };

  if tx.send(event).is_err() {
    debug!("listener dropped before its completion arrived");
  }
  true
}
