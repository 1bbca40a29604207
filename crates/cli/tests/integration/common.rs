//! Shared test helpers for CLI integration tests.

use std::fs::{self, File};
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment: one temp directory holding the deploy
/// target, the artifact cache, the artifact itself, and the request file.
pub struct TestEnv {
  pub temp: TempDir,
  pub request_path: PathBuf,
}

impl TestEnv {
  /// Set up a local-file-sourced deploy request for `version`, backed by a
  /// small tar.gz artifact.
  pub fn with_artifact(version: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let env = Self {
      request_path: temp.path().join("request.toml"),
      temp,
    };

    let archive = env.build_archive("app bytes");
    env.write_request(&archive, version, &[]);
    env
  }

  /// Build a tar.gz with `app.jar` and `conf/app.yml` under the temp dir.
  pub fn build_archive(&self, marker: &str) -> PathBuf {
    let archive_path = self.temp.path().join("myapp.tar.gz");
    let payload = self.temp.path().join("payload");
    fs::create_dir_all(payload.join("conf")).unwrap();
    fs::write(payload.join("app.jar"), marker).unwrap();
    fs::write(payload.join("conf/app.yml"), "key: value").unwrap();

    let file = File::create(&archive_path).unwrap();
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(".", &payload).unwrap();
    builder.into_inner().unwrap().finish().unwrap();
    fs::remove_dir_all(&payload).unwrap();

    archive_path
  }

  /// Write the request file, with optional extra TOML lines appended.
  pub fn write_request(&self, artifact: &PathBuf, version: &str, extra: &[&str]) {
    let mut content = format!(
      r#"name = "myapp"
artifact_location = "{}"
version = "{}"
deploy_to = "{}"
artifact_cache_root = "{}"
"#,
      artifact.display(),
      version,
      self.deploy_to().display(),
      self.temp.path().join("cache").display(),
    );
    for line in extra {
      content.push_str(line);
      content.push('\n');
    }
    fs::write(&self.request_path, content).unwrap();
  }

  pub fn deploy_to(&self) -> PathBuf {
    self.temp.path().join("srv")
  }

  pub fn release_path(&self, version: &str) -> PathBuf {
    self.deploy_to().join("releases").join(version)
  }

  /// Pre-configured command for the ardeploy binary.
  pub fn ardeploy_cmd(&self) -> Command {
    let cmd: Command = cargo_bin_cmd!("ardeploy");
    cmd
  }
}
