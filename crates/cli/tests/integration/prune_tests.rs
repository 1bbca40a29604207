#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

fn deploy_versions(env: &TestEnv, versions: &[&str]) {
  let archive = env.temp.path().join("myapp.tar.gz");
  for version in versions {
    env.write_request(&archive, version, &[]);
    env.ardeploy_cmd().arg("deploy").arg(&env.request_path).assert().success();
    std::thread::sleep(std::time::Duration::from_millis(20));
  }
}

#[test]
fn prune_with_empty_target_succeeds() {
  let env = TestEnv::with_artifact("1.0.0");

  env
    .ardeploy_cmd()
    .arg("prune")
    .arg(&env.request_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Pruning complete"));
}

#[test]
fn prune_removes_oldest_beyond_keep() {
  let env = TestEnv::with_artifact("1.0.0");
  deploy_versions(&env, &["1.0.0", "1.1.0", "1.2.0", "2.0.0"]);

  env
    .ardeploy_cmd()
    .arg("prune")
    .arg(&env.request_path)
    .args(["--keep", "1"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Versions removed"));

  // 2.0.0 is current and protected; of the 3 previous, keep the newest
  assert!(!env.release_path("1.0.0").exists());
  assert!(!env.release_path("1.1.0").exists());
  assert!(env.release_path("1.2.0").exists());
  assert!(env.release_path("2.0.0").exists());
}

#[test]
fn prune_dry_run_deletes_nothing() {
  let env = TestEnv::with_artifact("1.0.0");
  deploy_versions(&env, &["1.0.0", "1.1.0", "2.0.0"]);

  env
    .ardeploy_cmd()
    .arg("prune")
    .arg(&env.request_path)
    .args(["--keep", "1"])
    .arg("--dry-run")
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"));

  assert!(env.release_path("1.0.0").exists());
  assert!(env.release_path("1.1.0").exists());
}

#[test]
fn prune_json_output_lists_deleted_versions() {
  let env = TestEnv::with_artifact("1.0.0");
  deploy_versions(&env, &["1.0.0", "1.1.0", "2.0.0"]);

  let output = env
    .ardeploy_cmd()
    .arg("prune")
    .arg(&env.request_path)
    .args(["--keep", "1", "-o", "json"])
    .assert()
    .success();

  let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
  let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
  assert_eq!(json["stats"]["versions_deleted"], 1);
  assert_eq!(json["deleted_versions"][0], "1.0.0");
}
