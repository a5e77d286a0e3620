//! Environment capture for a single flake.
//!
//! A capture runs `nix print-dev-env <flake-dir>` as one unit of work and hands
//! back the raw output together with the terminal exit status. Filtering and
//! persisting the output is left to the profile store, so a failed capture
//! never touches the stored profile.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::TASK_LABEL_PREFIX;
use crate::flake::Flake;
use crate::task::{TaskError, TaskExit, TaskHub, TaskToken, UnitOfWork};

#[derive(Debug, Error)]
pub enum CaptureError {
  #[error("flake.nix not found in {}\n{} does not exist", dir.display(), file.display())]
  MissingFlakeFile { dir: PathBuf, file: PathBuf },

  #[error("invalid nix command {value:?}")]
  InvalidCommand { value: String },

  #[error(transparent)]
  Task(#[from] TaskError),
}

/// Outcome of one capture unit of work.
#[derive(Debug, Clone)]
pub struct CaptureOutput {
  pub token: TaskToken,
  pub label: String,
  pub exit: TaskExit,
}

/// Builds and runs capture units of work.
#[derive(Clone)]
pub struct CaptureRunner {
  hub: Arc<TaskHub>,
  nix: String,
}

impl CaptureRunner {
  pub fn new(hub: Arc<TaskHub>, nix: impl Into<String>) -> Self {
    Self { hub, nix: nix.into() }
  }

  /// Display label of a flake's capture, e.g. `DevShell /work/proj`.
  pub fn label_for(flake: &Flake) -> String {
    format!("{} {}", TASK_LABEL_PREFIX, flake.path.display())
  }

  /// Verify the flake directory still holds a `flake.nix`.
  pub fn check(flake: &Flake) -> Result<(), CaptureError> {
    let file = flake.flake_file();
    if file.is_file() {
      debug!(file = %file.display(), "flake.nix exists");
      Ok(())
    } else {
      debug!(file = %file.display(), "flake.nix does not exist");
      Err(CaptureError::MissingFlakeFile {
        dir: flake.path.clone(),
        file,
      })
    }
  }

  /// The unit of work that materializes `flake`'s dev shell on stdout.
  ///
  /// The configured nix command may carry its own arguments, e.g.
  /// `nix --extra-experimental-features 'nix-command flakes'`.
  pub fn unit_for(&self, flake: &Flake) -> Result<UnitOfWork, CaptureError> {
    let invalid = || CaptureError::InvalidCommand {
      value: self.nix.clone(),
    };

    let mut words = shlex::split(&self.nix).filter(|w| !w.is_empty()).ok_or_else(invalid)?;
    words.push("print-dev-env".to_string());
    words.push(flake.path.to_string_lossy().into_owned());

    let command = shlex::try_join(words.iter().map(String::as_str)).map_err(|_| invalid())?;
    let script = format!("set -euo pipefail\nexec {command}\n");
    Ok(UnitOfWork::new(Self::label_for(flake), script))
  }

  /// Run the capture for `flake` and wait for its correlated completion.
  ///
  /// Nothing is submitted when the flake has no `flake.nix`.
  pub async fn capture(&self, flake: &Flake) -> Result<CaptureOutput, CaptureError> {
    Self::check(flake)?;
    let unit = self.unit_for(flake)?;

    let pending = self.hub.submit(unit);
    let token = pending.token();
    let event = pending.wait().await?;

    info!(flake = %flake.name, %token, code = ?event.exit.code, "capture finished");
    Ok(CaptureOutput {
      token,
      label: event.label,
      exit: event.exit,
    })
  }
}
