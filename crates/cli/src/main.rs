mod cmd;
mod host;
mod output;
mod prompts;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nixdc_lib::config::ElevationMode;

use cmd::{cmd_find_flakes, cmd_status, cmd_update_all, cmd_update_flake};

/// nix-devcontainer - sync Nix flake dev shells into /etc/profile.d
#[derive(Parser)]
#[command(name = "nix-devcontainer")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Option<Commands>,
}

/// Options shared by every command. Each overrides its `NIX_DEVCONTAINER_*` variable.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Workspace root to search for flake.nix (repeatable, default: current directory)
  #[arg(short, long = "workspace", value_name = "DIR", global = true)]
  pub workspaces: Vec<PathBuf>,

  /// Directory receiving the generated profiles
  #[arg(long, value_name = "DIR", global = true)]
  pub profile_dir: Option<PathBuf>,

  /// Root of the bundled templates
  #[arg(long, value_name = "DIR", global = true)]
  pub templates: Option<PathBuf>,

  /// Command used to run nix, arguments allowed
  #[arg(long, value_name = "COMMAND", global = true)]
  pub nix: Option<String>,

  /// How profile writes are elevated: auto, always or never
  #[arg(long, value_name = "MODE", global = true)]
  pub elevate: Option<ElevationMode>,

  /// Reload the environment after an update without asking
  #[arg(long, global = true)]
  pub reload: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Discover flakes in the workspace and the bundled default
  FindFlakes,

  /// Update the profile of a single flake
  UpdateFlake {
    /// Flake name (prompts when omitted)
    name: Option<String>,
  },

  /// Update the profiles of all discovered flakes
  UpdateAllFlakes,

  /// Discover flakes, then update all of them (default)
  FindAndUpdateAllFlakes,

  /// Show discovered flakes and the state of their profiles
  Status {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  let default_level = if cli.global.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command.unwrap_or(Commands::FindAndUpdateAllFlakes) {
    Commands::FindFlakes => cmd_find_flakes(&cli.global),
    Commands::UpdateFlake { name } => cmd_update_flake(&cli.global, name.as_deref()),
    Commands::UpdateAllFlakes | Commands::FindAndUpdateAllFlakes => cmd_update_all(&cli.global),
    Commands::Status { json } => cmd_status(&cli.global, json),
  }
}
