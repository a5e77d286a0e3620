//! Profile storage.
//!
//! Each flake owns one sourceable script in the profile directory:
//!
//! ```text
//! {profile_dir}/
//! ├── nix.sh                           # installed by Nix, never touched
//! └── nix-devcontainer-<name>.sh       # one per flake
//! ```
//!
//! The profile directory is normally root-owned, so writes go through a single
//! external command (optionally under `sudo`) that writes a sibling temp file
//! and renames it over the destination.

mod filter;

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{ElevationMode, SyncConfig};
use crate::consts::NIX_PROFILE_FILE;
use crate::flake::Flake;
use crate::platform;

pub use filter::filter_profile;

/// Writes stdin to a fresh `$1.XXXXXX` sibling, then renames it over `$1`.
///
/// Each invocation stages through its own temp file, so concurrent writers to
/// one profile never share partial content. The temp file is removed on failure.
const REPLACE_SCRIPT: &str = r#"set -e
mkdir -p "$(dirname "$1")"
t=$(mktemp "$1.XXXXXX")
trap 'rm -f "$t"' EXIT
cat > "$t"
chmod 0644 "$t"
mv -f "$t" "$1"
"#;

#[derive(Debug, Error)]
pub enum ProfileError {
  #[error("failed to read profile {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to run profile write for {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },

  #[error("profile write for {} exited with code {code:?}: {stderr}", path.display())]
  WriteFailed {
    path: PathBuf,
    code: Option<i32>,
    stderr: String,
  },
}

/// Privilege helper prepended to the write command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
  Sudo,
  None,
}

impl Elevation {
  /// Resolve a configured mode against the current process.
  pub fn from_mode(mode: ElevationMode) -> Self {
    match mode {
      ElevationMode::Always => Elevation::Sudo,
      ElevationMode::Never => Elevation::None,
      ElevationMode::Auto if platform::is_elevated() => Elevation::None,
      ElevationMode::Auto => Elevation::Sudo,
    }
  }

  /// Wrap `program args...` with the privilege helper, if any.
  fn command(self, program: &str) -> Command {
    match self {
      Elevation::Sudo => {
        let mut cmd = Command::new("sudo");
        cmd.arg(program);
        cmd
      }
      Elevation::None => Command::new(program),
    }
  }
}

/// On-disk state of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileStatus {
  pub path: PathBuf,
  pub exists: bool,
  pub bytes: Option<u64>,
}

/// Reads and replaces per-flake profile scripts.
#[derive(Debug, Clone)]
pub struct ProfileStore {
  dir: PathBuf,
  prefix: String,
  ext: String,
  elevation: Elevation,
}

impl ProfileStore {
  pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, ext: impl Into<String>, elevation: Elevation) -> Self {
    Self {
      dir: dir.into(),
      prefix: prefix.into(),
      ext: ext.into(),
      elevation,
    }
  }

  pub fn from_config(config: &SyncConfig) -> Self {
    Self::new(
      &config.profile_dir,
      &config.profile_prefix,
      &config.profile_ext,
      Elevation::from_mode(config.elevation),
    )
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Profile path for a flake: `<dir>/<prefix>-<name>.<ext>`.
  ///
  /// Distinct flake names map to distinct paths; nothing else disambiguates them.
  pub fn path_for(&self, flake: &Flake) -> PathBuf {
    self.dir.join(format!("{}-{}.{}", self.prefix, flake.name, self.ext))
  }

  /// Path of the profile Nix installs for itself.
  pub fn nix_profile_path(&self) -> PathBuf {
    self.dir.join(NIX_PROFILE_FILE)
  }

  /// Whether the Nix installation profile is present.
  pub fn nix_installed(&self) -> bool {
    self.nix_profile_path().is_file()
  }

  pub async fn read(&self, flake: &Flake) -> Result<String, ProfileError> {
    let path = self.path_for(flake);
    let content = tokio::fs::read_to_string(&path)
      .await
      .map_err(|source| ProfileError::Read {
        path: path.clone(),
        source,
      })?;
    debug!(path = %path.display(), len = content.len(), "profile read");
    Ok(content)
  }

  /// Read the profile, treating any failure as "no prior profile".
  pub async fn read_or_empty(&self, flake: &Flake) -> String {
    match self.read(flake).await {
      Ok(content) => content,
      Err(e) => {
        debug!(error = %e, "no readable prior profile, using empty");
        String::new()
      }
    }
  }

  /// Filter `text` and atomically replace the flake's profile with it.
  pub async fn write(&self, flake: &Flake, text: &str) -> Result<(), ProfileError> {
    let path = self.path_for(flake);
    let content = filter_profile(text);

    let mut command = self.elevation.command(platform::posix_shell());
    command
      .arg("-c")
      .arg(REPLACE_SCRIPT)
      .arg("sh")
      .arg(&path)
      .stdin(Stdio::piped())
      .stdout(Stdio::null())
      .stderr(Stdio::piped());

    debug!(path = %path.display(), elevation = ?self.elevation, "writing profile");

    let write_err = |source| ProfileError::Write {
      path: path.clone(),
      source,
    };

    let mut child = command.spawn().map_err(write_err)?;
    if let Some(mut stdin) = child.stdin.take() {
      // A broken pipe means the script already failed; its exit status says why.
      match stdin.write_all(content.as_bytes()).await {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(write_err(e)),
        _ => {}
      }
    }

    let output = child.wait_with_output().await.map_err(write_err)?;
    if !output.status.success() {
      return Err(ProfileError::WriteFailed {
        path,
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    info!(path = %path.display(), len = content.len(), "profile written");
    Ok(())
  }

  pub async fn status(&self, flake: &Flake) -> ProfileStatus {
    let path = self.path_for(flake);
    match tokio::fs::metadata(&path).await {
      Ok(meta) => ProfileStatus {
        path,
        exists: true,
        bytes: Some(meta.len()),
      },
      Err(_) => ProfileStatus {
        path,
        exists: false,
        bytes: None,
      },
    }
  }
}
