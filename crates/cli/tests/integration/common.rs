//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Stand-in for `nix print-dev-env <dir>`: prints `<dir>/env.sh`, fails when `<dir>/fail` exists.
const FAKE_NIX: &str = r#"#!/bin/sh
dir="$2"
if [ -f "$dir/fail" ]; then
  echo "error: builder for '$dir' failed" >&2
  exit 1
fi
cat "$dir/env.sh" 2>/dev/null || true
"#;

/// Isolated test environment.
///
/// Each test gets its own templates root, profile directory, fake `nix` and
/// workspace directories.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("templates/flake/flake.nix", "{ }");
    env.write_file("templates/flake/env.sh", "export DEFAULT_SHELL=1\n");
    env.write_file("bin/fake-nix", FAKE_NIX);
    std::fs::create_dir_all(env.profile_dir()).unwrap();
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// A workspace root with a `flake.nix` whose dev shell prints `env_sh`.
  pub fn project(&self, name: &str, env_sh: &str) -> PathBuf {
    self.write_file(&format!("ws/{name}/flake.nix"), "{ }");
    self.write_file(&format!("ws/{name}/env.sh"), env_sh);
    self.temp.path().join("ws").join(name)
  }

  pub fn profile_dir(&self) -> PathBuf {
    self.temp.path().join("profile.d")
  }

  pub fn profile(&self, name: &str) -> PathBuf {
    self.profile_dir().join(format!("nix-devcontainer-{name}.sh"))
  }

  pub fn read_profile(&self, name: &str) -> Option<String> {
    std::fs::read_to_string(self.profile(name)).ok()
  }

  /// Get a pre-configured Command for the binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `NIX_DEVCONTAINER_PROFILE_DIR`: temporary profile directory
  /// - `NIX_DEVCONTAINER_TEMPLATES`: temporary templates root
  /// - `NIX_DEVCONTAINER_NIX`: the fake nix script
  /// - `NIX_DEVCONTAINER_ELEVATE`: unset, tests pass `--elevate never`
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("nix-devcontainer");
    let fake_nix = self.temp.path().join("bin").join("fake-nix");
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("NIX_DEVCONTAINER_ELEVATE");
    cmd.env("NIX_DEVCONTAINER_PROFILE_DIR", self.profile_dir());
    cmd.env("NIX_DEVCONTAINER_TEMPLATES", self.temp.path().join("templates"));
    cmd.env("NIX_DEVCONTAINER_NIX", format!("sh '{}'", fake_nix.display()));
    cmd.current_dir(self.temp.path());
    cmd.args(["--elevate", "never"]);
    cmd
  }
}
