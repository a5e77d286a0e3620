use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn update_all_writes_filtered_profiles() {
  let env = TestEnv::new();
  let proj = env.project("proj", "export P=1\nLINENO=7\nexport Q=2\n");

  env
    .cmd()
    .args(["find-and-update-all-flakes", "--workspace"])
    .arg(&proj)
    .assert()
    .success()
    .stdout(predicate::str::contains("DevShell proj: updated"))
    .stdout(predicate::str::contains("2 updated, 0 unchanged, 0 failed"));

  assert_eq!(env.read_profile("proj").as_deref(), Some("export P=1\nexport Q=2\n"));
  assert_eq!(env.read_profile("default").as_deref(), Some("export DEFAULT_SHELL=1\n"));
}

#[test]
fn default_command_is_find_and_update_all() {
  let env = TestEnv::new();

  env
    .cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Found 1 flake(s): default"))
    .stdout(predicate::str::contains("1 updated"));
}

#[test]
fn second_run_reports_unchanged() {
  let env = TestEnv::new();
  let proj = env.project("proj", "export P=1\n");

  env.cmd().arg("update-all-flakes").arg("--workspace").arg(&proj).assert().success();

  env
    .cmd()
    .arg("update-all-flakes")
    .arg("--workspace")
    .arg(&proj)
    .assert()
    .success()
    .stdout(predicate::str::contains("DevShell proj: unchanged"))
    .stdout(predicate::str::contains("0 updated, 2 unchanged, 0 failed"));
}

#[test]
fn failed_build_exits_non_zero_and_keeps_profile() {
  let env = TestEnv::new();
  let proj = env.project("proj", "export P=2\n");
  env.write_file("ws/proj/fail", "");
  env.write_file("profile.d/nix-devcontainer-proj.sh", "export P=1\n");

  env
    .cmd()
    .args(["update-flake", "proj", "--workspace"])
    .arg(&proj)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("DevShell proj: failed to build"))
    .stderr(predicate::str::contains("builder for"));

  assert_eq!(env.read_profile("proj").as_deref(), Some("export P=1\n"));
}

#[test]
fn one_failure_does_not_stop_siblings() {
  let env = TestEnv::new();
  let good = env.project("good", "export G=1\n");
  let bad = env.project("bad", "");
  env.write_file("ws/bad/fail", "");

  env
    .cmd()
    .arg("update-all-flakes")
    .arg("--workspace")
    .arg(&good)
    .arg("--workspace")
    .arg(&bad)
    .assert()
    .code(1)
    .stdout(predicate::str::contains("2 updated, 0 unchanged, 1 failed"));

  assert_eq!(env.read_profile("good").as_deref(), Some("export G=1\n"));
  assert_eq!(env.read_profile("bad"), None);
}

#[test]
fn update_unknown_flake_fails() {
  let env = TestEnv::new();

  env
    .cmd()
    .args(["update-flake", "ghost"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Flake not found"));
}

#[test]
fn update_without_name_and_terminal_is_a_no_op() {
  let env = TestEnv::new();
  let proj = env.project("proj", "export P=1\n");

  env
    .cmd()
    .args(["update-flake", "--workspace"])
    .arg(&proj)
    .assert()
    .success()
    .stderr(predicate::str::contains("no terminal to prompt on"));

  assert_eq!(env.read_profile("proj"), None);
}

#[test]
fn reload_flag_prints_hint_without_terminal() {
  let env = TestEnv::new();
  let proj = env.project("proj", "export P=1\n");

  env
    .cmd()
    .args(["update-flake", "proj", "--reload", "--workspace"])
    .arg(&proj)
    .assert()
    .success()
    .stdout(predicate::str::contains("To reload, open a new login shell"));
}

#[test]
fn write_failure_exits_non_zero() {
  let env = TestEnv::new();
  let blocked = env.temp.path().join("blocked");
  std::fs::write(&blocked, "").unwrap();

  env
    .cmd()
    .arg("--profile-dir")
    .arg(&blocked)
    .arg("update-all-flakes")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("failed to write profile"));
}

#[test]
fn update_all_commands_discover_once() {
  let env = TestEnv::new();
  let proj = env.project("proj", "export P=1\n");

  for command in ["update-all-flakes", "find-and-update-all-flakes"] {
    env
      .cmd()
      .arg(command)
      .arg("--workspace")
      .arg(&proj)
      .assert()
      .success()
      .stdout(predicate::function(|out: &str| out.matches("Found 2 flake(s)").count() == 1));
  }
}
