#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn status_on_empty_target_reports_none() {
  let env = TestEnv::with_artifact("1.0.0");

  env
    .ardeploy_cmd()
    .arg("status")
    .arg(&env.request_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("(none)"));
}

#[test]
fn status_reports_current_and_previous_versions() {
  let env = TestEnv::with_artifact("1.0.0");
  let archive = env.temp.path().join("myapp.tar.gz");

  for version in ["1.0.0", "2.0.0"] {
    env.write_request(&archive, version, &[]);
    env.ardeploy_cmd().arg("deploy").arg(&env.request_path).assert().success();
    std::thread::sleep(std::time::Duration::from_millis(20));
  }

  let output = env
    .ardeploy_cmd()
    .arg("status")
    .arg(&env.request_path)
    .args(["-o", "json"])
    .assert()
    .success();

  let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
  let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
  assert_eq!(json["current_version"], "2.0.0");
  assert_eq!(json["previous_versions"][0], "1.0.0");
  assert_eq!(json["cached_versions"], serde_json::json!(["1.0.0", "2.0.0"]));
}
