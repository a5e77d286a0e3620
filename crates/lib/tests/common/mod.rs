//! Shared helpers for coordinator integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::oneshot;

use nixdc_lib::config::{ElevationMode, SyncConfig};
use nixdc_lib::host::{Choice, Host, Progress, Severity};
use nixdc_lib::sync::Coordinator;
use nixdc_lib::task::{Launcher, ShellLauncher, TaskExit, UnitOfWork};

/// Stand-in for `nix`: prints `<dir>/env.sh`, or fails when `<dir>/fail` exists.
///
/// Every invocation appends the flake directory to `<bin>/calls.log`.
const FAKE_NIX: &str = r#"#!/bin/sh
dir="$2"
echo "$dir" >> "$(dirname "$0")/calls.log"
if [ -f "$dir/fail" ]; then
  echo "error: builder for '$dir' failed" >&2
  exit 1
fi
cat "$dir/env.sh" 2>/dev/null || true
"#;

/// Everything the host was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
  Notify(Severity, String),
  ProgressBegin(String),
  ProgressReport(String, String),
  ProgressFinish(String),
  ProgressAbandon(String, String),
  Reload,
}

/// A host that records every interaction and answers prompts from presets.
#[derive(Default)]
pub struct RecordingHost {
  pub roots: Mutex<Vec<PathBuf>>,
  pub events: Arc<Mutex<Vec<HostEvent>>>,
  pub choice: Mutex<Option<String>>,
  pub offered: Mutex<Vec<Choice>>,
  pub accept_action: bool,
  pub reloads: AtomicUsize,
}

impl RecordingHost {
  pub fn new(roots: Vec<PathBuf>) -> Self {
    Self {
      roots: Mutex::new(roots),
      ..Default::default()
    }
  }

  pub fn accepting_reload(roots: Vec<PathBuf>) -> Self {
    Self {
      roots: Mutex::new(roots),
      accept_action: true,
      ..Default::default()
    }
  }

  pub fn answer(&self, choice: Option<&str>) {
    *self.choice.lock().unwrap() = choice.map(str::to_string);
  }

  pub fn events(&self) -> Vec<HostEvent> {
    self.events.lock().unwrap().clone()
  }

  pub fn notifications(&self) -> Vec<(Severity, String)> {
    self
      .events()
      .into_iter()
      .filter_map(|e| match e {
        HostEvent::Notify(s, m) => Some((s, m)),
        _ => None,
      })
      .collect()
  }

  pub fn has_notification(&self, severity: Severity, message: &str) -> bool {
    self
      .notifications()
      .iter()
      .any(|(s, m)| *s == severity && m.starts_with(message))
  }

  pub fn clear(&self) {
    self.events.lock().unwrap().clear();
  }

  fn push(&self, event: HostEvent) {
    self.events.lock().unwrap().push(event);
  }
}

struct RecordingProgress {
  title: String,
  events: Arc<Mutex<Vec<HostEvent>>>,
}

impl Progress for RecordingProgress {
  fn report(&self, message: &str) {
    self
      .events
      .lock()
      .unwrap()
      .push(HostEvent::ProgressReport(self.title.clone(), message.to_string()));
  }

  fn finish(self: Box<Self>) {
    self.events.lock().unwrap().push(HostEvent::ProgressFinish(self.title));
  }

  fn abandon(self: Box<Self>, detail: &str) {
    self
      .events
      .lock()
      .unwrap()
      .push(HostEvent::ProgressAbandon(self.title, detail.to_string()));
  }
}

#[async_trait]
impl Host for RecordingHost {
  fn workspace_roots(&self) -> Vec<PathBuf> {
    self.roots.lock().unwrap().clone()
  }

  async fn choose(&self, _placeholder: &str, options: &[Choice]) -> Option<String> {
    *self.offered.lock().unwrap() = options.to_vec();
    self.choice.lock().unwrap().clone()
  }

  fn notify(&self, severity: Severity, message: &str) {
    self.push(HostEvent::Notify(severity, message.to_string()));
  }

  async fn notify_with_action(&self, severity: Severity, message: &str, _action: &str) -> bool {
    self.push(HostEvent::Notify(severity, message.to_string()));
    self.accept_action
  }

  fn begin_progress(&self, title: &str) -> Box<dyn Progress> {
    self.push(HostEvent::ProgressBegin(title.to_string()));
    Box::new(RecordingProgress {
      title: title.to_string(),
      events: Arc::clone(&self.events),
    })
  }

  fn reload(&self) {
    self.reloads.fetch_add(1, Ordering::SeqCst);
    self.push(HostEvent::Reload);
  }
}

/// A launcher whose units only finish when the test releases them by label.
#[derive(Default)]
pub struct GatedLauncher {
  gates: Mutex<HashMap<String, oneshot::Receiver<TaskExit>>>,
}

impl GatedLauncher {
  /// Create the gate for `label`; send on the returned sender to finish the unit.
  pub fn gate(&self, label: &str) -> oneshot::Sender<TaskExit> {
    let (tx, rx) = oneshot::channel();
    self.gates.lock().unwrap().insert(label.to_string(), rx);
    tx
  }
}

#[async_trait]
impl Launcher for GatedLauncher {
  async fn run(&self, unit: &UnitOfWork) -> io::Result<TaskExit> {
    let gate = self.gates.lock().unwrap().remove(&unit.label);
    match gate {
      Some(rx) => rx
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::Interrupted, "gate dropped")),
      None => Err(io::Error::new(io::ErrorKind::NotFound, "no gate for unit")),
    }
  }
}

/// Isolated filesystem layout for one test.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write("templates/flake/flake.nix", "{ }");
    env.write("bin/fake-nix", FAKE_NIX);
    std::fs::create_dir_all(env.profile_dir()).unwrap();
    env
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn write(&self, relative: &str, content: &str) {
    let path = self.path().join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
  }

  pub fn default_flake_dir(&self) -> PathBuf {
    self.path().join("templates").join("flake")
  }

  pub fn profile_dir(&self) -> PathBuf {
    self.path().join("profile.d")
  }

  pub fn profile(&self, name: &str) -> PathBuf {
    self.profile_dir().join(format!("nix-devcontainer-{name}.sh"))
  }

  pub fn read_profile(&self, name: &str) -> Option<String> {
    std::fs::read_to_string(self.profile(name)).ok()
  }

  /// A workspace root with a `flake.nix` and the given dev shell output.
  pub fn project(&self, name: &str, env_sh: &str) -> PathBuf {
    self.write(&format!("ws/{name}/flake.nix"), "{ }");
    self.write(&format!("ws/{name}/env.sh"), env_sh);
    self.path().join("ws").join(name)
  }

  /// Directories the fake nix was invoked for.
  pub fn nix_calls(&self) -> Vec<String> {
    std::fs::read_to_string(self.path().join("bin").join("calls.log"))
      .map(|s| s.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }

  pub fn config(&self) -> SyncConfig {
    let fake_nix = self.path().join("bin").join("fake-nix");
    SyncConfig {
      profile_dir: self.profile_dir(),
      templates_dir: self.path().join("templates"),
      nix: format!("sh {}", shlex::try_quote(&fake_nix.to_string_lossy()).unwrap()),
      elevation: ElevationMode::Never,
      ..SyncConfig::default()
    }
  }

  pub fn coordinator(&self, host: Arc<RecordingHost>) -> Coordinator {
    Coordinator::new(host, Arc::new(ShellLauncher), &self.config())
  }
}
