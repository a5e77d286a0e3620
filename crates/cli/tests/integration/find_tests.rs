use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn find_lists_default_and_workspace_flakes() {
  let env = TestEnv::new();
  let alpha = env.project("alpha", "");
  let beta = env.project("beta", "");

  env
    .cmd()
    .arg("find-flakes")
    .arg("--workspace")
    .arg(&alpha)
    .arg("--workspace")
    .arg(&beta)
    .assert()
    .success()
    .stdout(predicate::str::contains("Found 3 flake(s): default, alpha, beta"));
}

#[test]
fn find_skips_roots_without_flake() {
  let env = TestEnv::new();
  env.write_file("ws/plain/README", "no flake here");

  env
    .cmd()
    .arg("find-flakes")
    .arg("--workspace")
    .arg(env.temp.path().join("ws").join("plain"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Found 1 flake(s): default"));
}

#[test]
fn find_verbose_lists_paths() {
  let env = TestEnv::new();
  let proj = env.project("proj", "");

  env
    .cmd()
    .args(["find-flakes", "-v", "--workspace"])
    .arg(&proj)
    .assert()
    .success()
    .stdout(predicate::str::contains(dunce::canonicalize(&proj).unwrap().display().to_string()));
}

#[test]
fn find_never_writes_profiles() {
  let env = TestEnv::new();
  let proj = env.project("proj", "export P=1\n");

  env.cmd().arg("find-flakes").arg("--workspace").arg(&proj).assert().success();

  assert_eq!(std::fs::read_dir(env.profile_dir()).unwrap().count(), 0);
}
