mod find;
mod status;
mod update;

pub use find::cmd_find_flakes;
pub use status::cmd_status;
pub use update::{cmd_update_all, cmd_update_flake};

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::debug;

use nixdc_lib::config::SyncConfig;
use nixdc_lib::sync::Coordinator;
use nixdc_lib::task::ShellLauncher;

use crate::GlobalArgs;
use crate::host::TerminalHost;
use crate::output::print_info;
use crate::prompts;

/// Everything one command invocation needs. The registry lives as long as this does.
pub struct Session {
  pub runtime: Runtime,
  pub host: Arc<TerminalHost>,
  pub coordinator: Coordinator,
  pub config: SyncConfig,
}

impl Session {
  pub fn new(global: &GlobalArgs) -> Result<Self> {
    Self::build(global, false)
  }

  /// A session whose host prints no info notifications.
  pub fn quiet(global: &GlobalArgs) -> Result<Self> {
    Self::build(global, true)
  }

  fn build(global: &GlobalArgs, quiet: bool) -> Result<Self> {
    let config = resolve_config(global)?;
    let roots = workspace_roots(global)?;
    debug!(?roots, profile_dir = %config.profile_dir.display(), elevation = %config.elevation, "session");

    let runtime = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    let host = Arc::new(TerminalHost::new(roots, global.reload, quiet));
    let coordinator = Coordinator::new(host.clone(), Arc::new(ShellLauncher), &config);

    Ok(Self {
      runtime,
      host,
      coordinator,
      config,
    })
  }

  /// Run the reload continuation if it was requested and map success to an exit code.
  pub fn finish(self, success: bool) -> Result<ExitCode> {
    if self.host.reload_requested() {
      reload_environment(&self.config)?;
    }
    Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
  }
}

/// Environment configuration with command-line overrides applied on top.
pub fn resolve_config(global: &GlobalArgs) -> Result<SyncConfig> {
  let mut config = SyncConfig::from_env().context("Invalid configuration")?;

  if let Some(dir) = &global.profile_dir {
    config.profile_dir = dir.clone();
  }
  if let Some(dir) = &global.templates {
    config.templates_dir = dir.clone();
  }
  if let Some(nix) = &global.nix {
    config.nix = nix.clone();
  }
  if let Some(mode) = global.elevate {
    config.elevation = mode;
  }

  Ok(config)
}

fn workspace_roots(global: &GlobalArgs) -> Result<Vec<PathBuf>> {
  if global.workspaces.is_empty() {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    return Ok(vec![cwd]);
  }

  global
    .workspaces
    .iter()
    .map(|p| dunce::canonicalize(p).with_context(|| format!("Workspace not found: {}", p.display())))
    .collect()
}

/// Re-source the generated profiles.
///
/// A running shell cannot be changed from here, so an interactive terminal gets a
/// fresh login shell in place of this process. Otherwise print how to do it by hand.
fn reload_environment(config: &SyncConfig) -> Result<()> {
  if cfg!(unix) && prompts::is_interactive() {
    return Err(exec_login_shell());
  }

  let pattern = config
    .profile_dir
    .join(format!("{}-*.{}", config.profile_prefix, config.profile_ext));
  print_info(&format!(
    "To reload, open a new login shell or run: for f in {}; do . \"$f\"; done",
    pattern.display()
  ));
  Ok(())
}

/// Replace this process with `$SHELL -l`. Only returns on failure.
#[cfg(unix)]
fn exec_login_shell() -> anyhow::Error {
  use std::os::unix::process::CommandExt;

  let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
  print_info(&format!("Reloading environment ({shell} -l)"));
  let err = std::process::Command::new(&shell).arg("-l").exec();
  anyhow::Error::new(err).context(format!("Failed to start {shell}"))
}

#[cfg(not(unix))]
fn exec_login_shell() -> anyhow::Error {
  anyhow::anyhow!("Reloading the environment is only supported on Unix")
}
