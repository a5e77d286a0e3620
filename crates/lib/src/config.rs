//! Runtime configuration.
//!
//! Every setting has a built-in default that can be overridden through the
//! environment. The CLI layers its own flags on top of [`SyncConfig::from_env`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::consts::{APP_NAME, PROFILE_DIR, PROFILE_EXT};

/// Overrides the profile destination directory.
pub const ENV_PROFILE_DIR: &str = "NIX_DEVCONTAINER_PROFILE_DIR";
/// Overrides the templates root.
pub const ENV_TEMPLATES: &str = "NIX_DEVCONTAINER_TEMPLATES";
/// Overrides the `nix` executable.
pub const ENV_NIX: &str = "NIX_DEVCONTAINER_NIX";
/// Selects the elevation mode (`auto`, `always`, `never`).
pub const ENV_ELEVATE: &str = "NIX_DEVCONTAINER_ELEVATE";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid elevation mode '{0}' (expected auto, always or never)")]
  InvalidElevation(String),
}

/// How profile writes cross the privilege boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ElevationMode {
  /// Use `sudo` unless already running as root.
  #[default]
  Auto,
  /// Always go through `sudo`.
  Always,
  /// Never elevate; the profile directory must be writable.
  Never,
}

impl ElevationMode {
  pub fn as_str(self) -> &'static str {
    match self {
      ElevationMode::Auto => "auto",
      ElevationMode::Always => "always",
      ElevationMode::Never => "never",
    }
  }
}

impl fmt::Display for ElevationMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ElevationMode {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "auto" => Ok(ElevationMode::Auto),
      "always" | "sudo" => Ok(ElevationMode::Always),
      "never" | "none" => Ok(ElevationMode::Never),
      other => Err(ConfigError::InvalidElevation(other.to_string())),
    }
  }
}

/// Settings shared by every component of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
  /// Directory receiving the generated profile scripts.
  pub profile_dir: PathBuf,
  /// File name prefix of generated profiles.
  pub profile_prefix: String,
  /// File extension of generated profiles.
  pub profile_ext: String,
  /// Root of the bundled templates.
  pub templates_dir: PathBuf,
  /// The `nix` executable used for capture.
  pub nix: String,
  pub elevation: ElevationMode,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      profile_dir: PathBuf::from(PROFILE_DIR),
      profile_prefix: APP_NAME.to_string(),
      profile_ext: PROFILE_EXT.to_string(),
      templates_dir: default_templates_dir(),
      nix: "nix".to_string(),
      elevation: ElevationMode::Auto,
    }
  }
}

impl SyncConfig {
  /// Build the configuration from defaults and environment overrides.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Some(dir) = env_non_empty(ENV_PROFILE_DIR) {
      config.profile_dir = PathBuf::from(dir);
    }
    if let Some(dir) = env_non_empty(ENV_TEMPLATES) {
      config.templates_dir = PathBuf::from(dir);
    }
    if let Some(nix) = env_non_empty(ENV_NIX) {
      config.nix = nix;
    }
    if let Some(mode) = env_non_empty(ENV_ELEVATE) {
      config.elevation = mode.parse()?;
    }

    Ok(config)
  }
}

fn env_non_empty(key: &str) -> Option<String> {
  std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Candidate template roots, most specific first.
///
/// - `<exe-dir>/../share/nix-devcontainer/templates` (installed layout)
/// - `<exe-dir>/templates` (unpacked archive)
/// - the `templates/` directory of the source checkout
pub fn template_dir_candidates() -> Vec<PathBuf> {
  let mut candidates = Vec::new();

  if let Some(exe_dir) = std::env::current_exe()
    .ok()
    .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
  {
    if let Some(prefix) = exe_dir.parent() {
      candidates.push(prefix.join("share").join(APP_NAME).join("templates"));
    }
    candidates.push(exe_dir.join("templates"));
  }

  candidates.push(PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../templates")));
  candidates
}

/// First existing template root, or the source checkout path when none exist.
///
/// A missing root is not an error here; the template resolver reports it on lookup.
pub fn default_templates_dir() -> PathBuf {
  let candidates = template_dir_candidates();
  candidates
    .iter()
    .find(|p| p.is_dir())
    .map(|p| dunce::canonicalize(p).unwrap_or_else(|_| p.clone()))
    .or_else(|| candidates.last().cloned())
    .unwrap_or_else(|| PathBuf::from("templates"))
}
