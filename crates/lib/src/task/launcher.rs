//! Process launchers for units of work.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{TaskExit, UnitOfWork};
use crate::platform;

/// Runs a unit of work to completion.
///
/// Implementations must not time out or cancel; the unit runs until the
/// process exits.
#[async_trait]
pub trait Launcher: Send + Sync {
  async fn run(&self, unit: &UnitOfWork) -> io::Result<TaskExit>;
}

/// Runs the unit's script under `bash -c`, capturing stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellLauncher;

#[async_trait]
impl Launcher for ShellLauncher {
  async fn run(&self, unit: &UnitOfWork) -> io::Result<TaskExit> {
    let (shell, args) = platform::script_shell();
    debug!(shell, label = %unit.label, "spawning process");

    let output = Command::new(shell)
      .args(args)
      .arg(&unit.script)
      .stdin(Stdio::null())
      .output()
      .await?;

    let exit = TaskExit {
      code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if !exit.stderr.is_empty() {
      debug!(stderr = %exit.stderr, "command stderr");
    }

    Ok(exit)
  }
}
