//! Status command implementation.
//!
//! Displays the discovered flakes, the profile each one owns, and whether Nix
//! installed its own profile script.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use nixdc_lib::sync::FlakeStatus;

use crate::GlobalArgs;
use crate::cmd::Session;
use crate::output::{format_bytes, print_error, print_json, print_stat, print_success, print_warning, symbols};

#[derive(Debug, Serialize)]
struct StatusReport {
  registry_version: u64,
  profile_dir: PathBuf,
  nix_profile: PathBuf,
  nix_installed: bool,
  flakes: Vec<FlakeStatus>,
}

pub fn cmd_status(global: &GlobalArgs, json: bool) -> Result<ExitCode> {
  let session = if json { Session::quiet(global)? } else { Session::new(global)? };

  let set = match session.coordinator.find_flakes() {
    Ok(set) => set,
    Err(_) => return session.finish(false),
  };

  let flakes = session.runtime.block_on(session.coordinator.status());
  let (nix_profile, nix_installed) = session.coordinator.nix_profile();

  let report = StatusReport {
    registry_version: set.version,
    profile_dir: session.coordinator.store().dir().to_path_buf(),
    nix_profile,
    nix_installed,
    flakes,
  };

  if json {
    print_json(&report)?;
  } else {
    print_text(&report);
  }

  session.finish(true)
}

fn print_text(report: &StatusReport) {
  println!();
  if report.nix_installed {
    print_success(&format!("Nix profile: {}", report.nix_profile.display()));
  } else {
    print_warning(&format!("Nix profile missing: {}", report.nix_profile.display()));
  }

  for status in &report.flakes {
    println!();
    let symbol = if status.profile.exists {
      symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()).to_string()
    } else {
      symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()).to_string()
    };
    println!("{} {}", symbol, status.flake.name.if_supports_color(Stream::Stdout, |s| s.bold()));
    print_stat("Flake", &status.flake.path.display().to_string());

    let profile = match status.profile.bytes {
      Some(bytes) => format!("{} ({})", status.profile.path.display(), format_bytes(bytes)),
      None => format!("{} (not generated)", status.profile.path.display()),
    };
    print_stat("Profile", &profile);

    if !status.has_flake_file {
      print_error(&format!("{}: flake.nix is missing", status.flake.name));
    }
  }
}
