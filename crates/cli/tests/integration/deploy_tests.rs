#![cfg(unix)]

use std::fs;

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn first_deploy_creates_release_and_current_link() {
  let env = TestEnv::with_artifact("1.0.0");

  env
    .ardeploy_cmd()
    .arg("deploy")
    .arg(&env.request_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Deployed myapp 1.0.0"));

  let release = env.release_path("1.0.0");
  assert_eq!(fs::read_to_string(release.join("app.jar")).unwrap(), "app bytes");
  assert!(release.join("manifest.yaml").exists());
  assert_eq!(fs::read_link(env.deploy_to().join("current")).unwrap(), release);
}

#[test]
fn rerun_reports_up_to_date() {
  let env = TestEnv::with_artifact("1.0.0");

  env.ardeploy_cmd().arg("deploy").arg(&env.request_path).assert().success();

  env
    .ardeploy_cmd()
    .arg("deploy")
    .arg(&env.request_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("already up to date"));
}

#[test]
fn force_flag_redeploys() {
  let env = TestEnv::with_artifact("1.0.0");

  env.ardeploy_cmd().arg("deploy").arg(&env.request_path).assert().success();

  env
    .ardeploy_cmd()
    .arg("deploy")
    .arg(&env.request_path)
    .arg("--force")
    .assert()
    .success()
    .stdout(predicate::str::contains("Deployed myapp 1.0.0"));
}

#[test]
fn json_output_reports_outcome() {
  let env = TestEnv::with_artifact("1.0.0");

  let output = env
    .ardeploy_cmd()
    .arg("deploy")
    .arg(&env.request_path)
    .args(["-o", "json"])
    .assert()
    .success();

  let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
  let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
  assert_eq!(json["version"], "1.0.0");
  assert_eq!(json["deployed"], true);
  assert_eq!(json["restarted"], true);
  assert_eq!(json["source_kind"], "local_file");
}

#[test]
fn latest_with_http_source_fails() {
  let env = TestEnv::with_artifact("1.0.0");
  env.write_request(&"http://host.example.com/myapp.tar.gz".into(), "latest", &[]);

  env
    .ardeploy_cmd()
    .arg("deploy")
    .arg(&env.request_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("latest"));
}

#[test]
fn missing_request_file_fails_cleanly() {
  let env = TestEnv::with_artifact("1.0.0");

  env
    .ardeploy_cmd()
    .arg("deploy")
    .arg(env.temp.path().join("no-such-request.toml"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load deploy request"));
}

#[test]
fn preseed_caches_without_linking() {
  let env = TestEnv::with_artifact("1.0.0");

  env
    .ardeploy_cmd()
    .arg("preseed")
    .arg(&env.request_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("cached"));

  assert!(env.temp.path().join("cache/myapp/1.0.0/myapp.tar.gz").exists());
  assert!(!env.deploy_to().join("current").exists());
}
