//! Synchronization of flake dev shells into profiles.
//!
//! The [`Coordinator`] drives the whole pipeline for one or many flakes:
//! discover → capture → compare → persist → report. Every per-flake failure is
//! reported through the [`Host`] and folded into a [`SyncOutcome`]; only
//! command-level failures (nothing discovered, no selection, unknown flake,
//! missing bundled template) surface as [`SyncError`].

pub mod report;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::capture::{CaptureError, CaptureRunner};
use crate::config::SyncConfig;
use crate::flake::{DiscoverError, Flake, FlakeSet, Registry, TemplateResolver, discover};
use crate::host::{Choice, Host, Severity};
use crate::profile::{ProfileStatus, ProfileStore, filter_profile};
use crate::task::{Launcher, TaskHub};

#[derive(Debug, Error)]
pub enum SyncError {
  #[error("no flakes have been discovered")]
  NotDiscovered,

  #[error("no flake selected")]
  NoSelection,

  #[error("flake '{0}' not found")]
  NotFound(String),

  #[error(transparent)]
  Discover(#[from] DiscoverError),
}

/// How a single flake's synchronization ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
  /// The captured profile matches the stored one byte for byte.
  Unchanged,
  /// The stored profile was replaced with different content.
  Updated,
  /// The capture exited non-zero or could not be launched.
  Failed { code: Option<i32> },
  /// The capture succeeded but the profile could not be written.
  WriteFailed,
  /// The flake directory has no `flake.nix`; nothing was run.
  MissingFlakeFile,
}

impl SyncStatus {
  pub fn is_success(&self) -> bool {
    matches!(self, SyncStatus::Unchanged | SyncStatus::Updated)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
  pub flake: Flake,
  pub status: SyncStatus,
}

/// Flows started by [`Coordinator::sync_all`].
///
/// The coordinator itself never joins these flows. Each one reports to the
/// host on its own and then pushes its outcome into `outcomes`, in completion
/// order. Dropping this value does not cancel anything.
#[derive(Debug)]
pub struct Dispatched {
  /// Registry version the flows were started from.
  pub version: u64,
  /// Number of flows started.
  pub count: usize,
  outcomes: mpsc::UnboundedReceiver<SyncOutcome>,
}

impl Dispatched {
  /// Next outcome to complete, or `None` once every flow has reported.
  pub async fn next(&mut self) -> Option<SyncOutcome> {
    self.outcomes.recv().await
  }

  /// Wait for every remaining flow and return outcomes in completion order.
  pub async fn collect(mut self) -> Vec<SyncOutcome> {
    let mut all = Vec::with_capacity(self.count);
    while let Some(outcome) = self.next().await {
      all.push(outcome);
    }
    all
  }
}

/// Per-flake state for status listings.
#[derive(Debug, Clone, Serialize)]
pub struct FlakeStatus {
  pub flake: Flake,
  pub has_flake_file: bool,
  pub profile: ProfileStatus,
}

struct Shared {
  host: Arc<dyn Host>,
  registry: Registry,
  templates: TemplateResolver,
  store: ProfileStore,
  capture: CaptureRunner,
}

/// Orchestrates discovery and profile synchronization.
///
/// Cheap to clone; clones share the registry and host.
#[derive(Clone)]
pub struct Coordinator {
  shared: Arc<Shared>,
}

impl Coordinator {
  pub fn new(host: Arc<dyn Host>, launcher: Arc<dyn Launcher>, config: &SyncConfig) -> Self {
    let hub = Arc::new(TaskHub::new(launcher));
    Self::from_parts(
      host,
      TemplateResolver::new(&config.templates_dir),
      ProfileStore::from_config(config),
      CaptureRunner::new(hub, &config.nix),
    )
  }

  pub fn from_parts(
    host: Arc<dyn Host>,
    templates: TemplateResolver,
    store: ProfileStore,
    capture: CaptureRunner,
  ) -> Self {
    Self {
      shared: Arc::new(Shared {
        host,
        registry: Registry::new(),
        templates,
        store,
        capture,
      }),
    }
  }

  pub fn registry(&self) -> &Registry {
    &self.shared.registry
  }

  pub fn store(&self) -> &ProfileStore {
    &self.shared.store
  }

  fn host(&self) -> &dyn Host {
    self.shared.host.as_ref()
  }

  /// Discover flakes and publish them as the new registry version.
  pub fn find_flakes(&self) -> Result<Arc<FlakeSet>, SyncError> {
    let roots = self.host().workspace_roots();
    debug!(roots = roots.len(), "finding flakes");

    match discover(&self.shared.templates, &roots) {
      Ok(flakes) => {
        let set = self.shared.registry.replace(flakes);
        self.host().notify(Severity::Info, &report::found(&set));
        Ok(set)
      }
      Err(e) => {
        self.host().notify(Severity::Error, &e.to_string());
        Err(e.into())
      }
    }
  }

  /// Start a sync for every flake in the current registry without waiting.
  ///
  /// Flows start in registry order and finish in any order. Must be called
  /// from within a tokio runtime.
  pub fn sync_all(&self) -> Result<Dispatched, SyncError> {
    let set = self.shared.registry.snapshot();
    if set.is_empty() {
      self.host().notify(Severity::Warning, report::NOT_DISCOVERED);
      return Err(SyncError::NotDiscovered);
    }

    info!(version = set.version, count = set.len(), "syncing all flakes");
    let (tx, rx) = mpsc::unbounded_channel();

    for flake in set.iter().cloned() {
      let this = self.clone();
      let tx = tx.clone();
      tokio::spawn(async move {
        let outcome = this.sync_flake(flake).await;
        if tx.send(outcome).is_err() {
          debug!("outcome receiver dropped");
        }
      });
    }

    Ok(Dispatched {
      version: set.version,
      count: set.len(),
      outcomes: rx,
    })
  }

  /// Sync a single flake, chosen by name or interactively, and wait for it.
  pub async fn sync_one(&self, selection: Option<&str>) -> Result<SyncOutcome, SyncError> {
    let set = self.shared.registry.snapshot();
    if set.is_empty() {
      self.host().notify(Severity::Error, report::NOT_DISCOVERED);
      return Err(SyncError::NotDiscovered);
    }

    let name = match selection {
      Some(name) => name.to_string(),
      None => {
        let options: Vec<Choice> = set
          .iter()
          .map(|f| Choice {
            label: f.name.clone(),
            description: f.path.display().to_string(),
          })
          .collect();
        match self.host().choose(report::SELECT_PLACEHOLDER, &options).await {
          Some(name) => name,
          None => {
            debug!("no flake selected");
            return Err(SyncError::NoSelection);
          }
        }
      }
    };

    // The registry may have been replaced while the prompt was open.
    let Some(flake) = self.shared.registry.snapshot().get(&name).cloned() else {
      self.host().notify(Severity::Error, report::NOT_FOUND);
      return Err(SyncError::NotFound(name));
    };

    info!(flake = %flake.name, "updating flake");
    Ok(self.sync_flake(flake).await)
  }

  /// Discover flakes, then start syncing all of them.
  pub fn find_and_sync_all(&self) -> Result<Dispatched, SyncError> {
    self.find_flakes()?;
    self.sync_all()
  }

  /// Capture, compare, persist and report one flake.
  ///
  /// Never fails: every problem is reported to the host and reflected in the
  /// returned status.
  pub async fn sync_flake(&self, flake: Flake) -> SyncOutcome {
    let status = self.run_flake(&flake).await;
    SyncOutcome { flake, status }
  }

  async fn run_flake(&self, flake: &Flake) -> SyncStatus {
    let host = self.host();
    let store = &self.shared.store;

    if let Err(e) = CaptureRunner::check(flake) {
      host.notify(Severity::Error, &e.to_string());
      return SyncStatus::MissingFlakeFile;
    }

    let profile_path = store.path_for(flake);
    debug!(flake = %flake.name, profile = %profile_path.display(), "starting profile update");

    // Read before capturing so the comparison is against pre-capture state.
    let previous = store.read_or_empty(flake).await;

    let progress = host.begin_progress(&report::progress_title(&profile_path));
    progress.report(report::PROGRESS_MESSAGE);

    let output = match self.shared.capture.capture(flake).await {
      Ok(output) => output,
      Err(e @ CaptureError::MissingFlakeFile { .. }) => {
        progress.abandon(&e.to_string());
        host.notify(Severity::Error, &e.to_string());
        return SyncStatus::MissingFlakeFile;
      }
      Err(e) => {
        warn!(flake = %flake.name, error = %e, "capture did not complete");
        progress.abandon(&e.to_string());
        host.notify(Severity::Error, &report::failed(&flake.name));
        return SyncStatus::Failed { code: None };
      }
    };

    if !output.exit.success() {
      warn!(flake = %flake.name, code = ?output.exit.code, "failed to build dev shell");
      progress.abandon(&report::stderr_tail(&output.exit.stderr));
      host.notify(Severity::Error, &report::failed(&flake.name));
      return SyncStatus::Failed {
        code: output.exit.code,
      };
    }

    debug!(flake = %flake.name, token = %output.token, label = %output.label, "capture completed");
    let current = filter_profile(&output.exit.stdout);
    if let Err(e) = store.write(flake, &current).await {
      warn!(flake = %flake.name, error = %e, "failed to write profile");
      progress.abandon(&e.to_string());
      host.notify(Severity::Error, &report::write_failed(&flake.name, &e));
      return SyncStatus::WriteFailed;
    }

    progress.finish();

    if current == previous {
      info!(flake = %flake.name, "profile unchanged");
      host.notify(Severity::Info, &report::unchanged(&flake.name));
      SyncStatus::Unchanged
    } else {
      info!(flake = %flake.name, len = current.len(), "profile updated");
      if host
        .notify_with_action(Severity::Info, &report::updated(&flake.name), report::RELOAD_ACTION)
        .await
      {
        debug!("reload requested");
        host.reload();
      }
      SyncStatus::Updated
    }
  }

  /// Profile state of every flake in the current registry.
  pub async fn status(&self) -> Vec<FlakeStatus> {
    let set = self.shared.registry.snapshot();
    let mut statuses = Vec::with_capacity(set.len());
    for flake in set.iter() {
      statuses.push(FlakeStatus {
        flake: flake.clone(),
        has_flake_file: flake.has_flake_file(),
        profile: self.shared.store.status(flake).await,
      });
    }
    statuses
  }

  /// Path of the profile Nix installs for itself, and whether it exists.
  pub fn nix_profile(&self) -> (PathBuf, bool) {
    let store = &self.shared.store;
    (store.nix_profile_path(), store.nix_installed())
  }
}
