//! Flake discovery and the registry of known flakes.
//!
//! The registry never mutates a published set. Each discovery builds a fresh
//! [`FlakeSet`] with the next version number and swaps it in; readers hold an
//! `Arc` to whichever version was current when they started.

pub mod template;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{DEFAULT_FLAKE_NAME, DEFAULT_FLAKE_TEMPLATE, FLAKE_FILE};

pub use template::{TemplateError, TemplateResolver};

#[derive(Debug, Error)]
pub enum DiscoverError {
  #[error("bundled default flake is missing: {0}")]
  Template(#[from] TemplateError),
}

/// A named directory expected to contain a `flake.nix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flake {
  pub name: String,
  pub path: PathBuf,
}

impl Flake {
  pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      path: path.into(),
    }
  }

  /// Path of the flake definition file inside the flake directory.
  pub fn flake_file(&self) -> PathBuf {
    self.path.join(FLAKE_FILE)
  }

  pub fn has_flake_file(&self) -> bool {
    self.flake_file().is_file()
  }
}

/// One published version of the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlakeSet {
  /// Zero for the never-discovered set; increases with every discovery.
  pub version: u64,
  pub flakes: Vec<Flake>,
}

impl FlakeSet {
  pub fn is_empty(&self) -> bool {
    self.flakes.is_empty()
  }

  pub fn len(&self) -> usize {
    self.flakes.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Flake> {
    self.flakes.iter()
  }

  /// First flake with the given name.
  pub fn get(&self, name: &str) -> Option<&Flake> {
    self.flakes.iter().find(|f| f.name == name)
  }

  pub fn names(&self) -> Vec<&str> {
    self.flakes.iter().map(|f| f.name.as_str()).collect()
  }
}

/// Process-wide holder of the current [`FlakeSet`].
#[derive(Debug, Default)]
pub struct Registry {
  current: RwLock<Arc<FlakeSet>>,
  last_version: AtomicU64,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The set that is current right now.
  pub fn snapshot(&self) -> Arc<FlakeSet> {
    let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
    Arc::clone(&*guard)
  }

  /// Publish `flakes` as the next version, replacing the previous set wholesale.
  pub fn replace(&self, flakes: Vec<Flake>) -> Arc<FlakeSet> {
    let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
    let version = self.last_version.fetch_add(1, Ordering::SeqCst) + 1;
    let set = Arc::new(FlakeSet { version, flakes });
    *guard = Arc::clone(&set);
    debug!(version, count = set.len(), "registry replaced");
    set
  }
}

/// Discover the bundled default flake plus every workspace root holding a `flake.nix`.
///
/// The default flake always comes first, followed by workspace roots in the
/// order given. Names are taken from directory base names and are not
/// deduplicated.
///
/// # Errors
///
/// Fails when the bundled default flake cannot be located. No partial result
/// is produced in that case.
pub fn discover(templates: &TemplateResolver, workspace_roots: &[PathBuf]) -> Result<Vec<Flake>, DiscoverError> {
  let default_path = templates.resolve(&[DEFAULT_FLAKE_TEMPLATE])?;
  let mut flakes = vec![Flake::new(DEFAULT_FLAKE_NAME, default_path)];

  for root in workspace_roots {
    if root.join(FLAKE_FILE).is_file() {
      debug!(root = %root.display(), "flake.nix found in workspace root");
      flakes.push(Flake::new(base_name(root), root.clone()));
    } else {
      debug!(root = %root.display(), "no flake.nix in workspace root");
    }
  }

  info!(count = flakes.len(), "discovered flakes");
  Ok(flakes)
}

/// Name used for a root with no final component, such as `/`.
const UNNAMED_ROOT: &str = "root";

/// Last path component of a workspace root, always a single path segment.
fn base_name(path: &Path) -> String {
  path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| UNNAMED_ROOT.to_string())
}
