//! Implementation of the `find-flakes` command.

use std::process::ExitCode;

use anyhow::Result;

use crate::GlobalArgs;
use crate::cmd::Session;
use crate::output::print_stat;

/// Discover flakes and list them.
///
/// The summary line comes from the host notification; with `--verbose` each
/// flake's directory is listed underneath.
pub fn cmd_find_flakes(global: &GlobalArgs) -> Result<ExitCode> {
  let session = Session::new(global)?;

  let found = session.coordinator.find_flakes();
  if let Ok(set) = &found {
    if global.verbose {
      for flake in set.iter() {
        print_stat(&flake.name, &flake.path.display().to_string());
      }
    }
  }

  session.finish(found.is_ok())
}
