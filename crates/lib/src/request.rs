//! The deploy request: everything one convergence run needs to know.
//!
//! A request is typically loaded from a TOML file, but it is a plain serde
//! struct and can be built directly by embedding callers.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::consts::{CURRENT_LINK, DEFAULT_KEEP, SHARED_DIR};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
  #[error("failed to read request file {path}: {source}")]
  Read {
    path: PathBuf,
    source: io::Error,
  },

  #[error("failed to parse request file {path}: {message}")]
  Parse { path: PathBuf, message: String },

  #[error("invalid request: {0}")]
  Invalid(String),
}

/// Configuration surface for one deploy target.
///
/// `current_path` and `shared_path` default to `<deploy_to>/current` and
/// `<deploy_to>/shared` when omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployRequest {
  /// Artifact name; also the subdirectory of the cache root.
  pub name: String,

  /// Where the artifact comes from: an http(s) URL, colon-separated
  /// repository coordinates (`group:artifact:version[:ext]`), or a local
  /// file path.
  pub artifact_location: String,

  /// Version to deploy. `"latest"` is only meaningful for
  /// repository-indexed sources.
  pub version: String,

  /// Expected SHA256 of the artifact payload, lowercase hex. When set,
  /// a cached copy with a matching checksum skips the transfer entirely.
  #[serde(default)]
  pub artifact_checksum: Option<String>,

  /// Root of the deploy target; releases live under
  /// `<deploy_to>/releases/<version>`.
  pub deploy_to: PathBuf,

  /// Path of the "current" symlink.
  #[serde(default)]
  pub current_path: Option<PathBuf>,

  /// Path of the shared directory.
  #[serde(default)]
  pub shared_path: Option<PathBuf>,

  /// Root under which fetched artifacts are cached, per name and version.
  pub artifact_cache_root: PathBuf,

  /// Base URL of the artifact repository, required for
  /// repository-indexed sources. Maven-style layout is assumed.
  #[serde(default)]
  pub repository_url: Option<String>,

  /// Owner applied to created trees (unix only, best effort).
  #[serde(default)]
  pub owner: Option<String>,

  /// Group applied to created trees (unix only, best effort).
  #[serde(default)]
  pub group: Option<String>,

  /// How many previous releases (and their caches) to keep.
  #[serde(default = "default_keep")]
  pub keep: usize,

  /// Whether the artifact is an archive to extract. When false the
  /// cached file is copied into the release directory verbatim.
  #[serde(default = "default_true")]
  pub is_tarball: bool,

  /// Redeploy even when the version and manifest are unchanged.
  #[serde(default)]
  pub force: bool,

  /// Run the migrate hook trio after a deploy.
  #[serde(default)]
  pub should_migrate: bool,

  /// Symlink mappings materialized after extraction:
  /// `<shared_path>/<key>` <- `<release_path>/<value>`.
  #[serde(default)]
  pub symlinks: BTreeMap<String, String>,

  /// Subdirectories of the shared path created during Preparing.
  #[serde(default)]
  pub shared_directories: Vec<String>,
}

fn default_keep() -> usize {
  DEFAULT_KEEP
}

fn default_true() -> bool {
  true
}

impl DeployRequest {
  /// Load and validate a request from a TOML file.
  pub fn from_file(path: &Path) -> Result<Self, RequestError> {
    let content = fs::read_to_string(path).map_err(|e| RequestError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;

    let request: DeployRequest = toml::from_str(&content).map_err(|e| RequestError::Parse {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;

    request.validate()?;
    Ok(request)
  }

  /// Check the invariants a request must satisfy before any phase runs.
  pub fn validate(&self) -> Result<(), RequestError> {
    if self.name.is_empty() {
      return Err(RequestError::Invalid("name must not be empty".to_string()));
    }
    if self.artifact_location.is_empty() {
      return Err(RequestError::Invalid("artifact_location must not be empty".to_string()));
    }
    if self.version.is_empty() {
      return Err(RequestError::Invalid("version must not be empty".to_string()));
    }
    if self.keep == 0 {
      return Err(RequestError::Invalid(
        "keep must be at least 1; the current release is always retained".to_string(),
      ));
    }
    Ok(())
  }

  /// Path of the "current" symlink, defaulted under `deploy_to`.
  pub fn current_path(&self) -> PathBuf {
    self
      .current_path
      .clone()
      .unwrap_or_else(|| self.deploy_to.join(CURRENT_LINK))
  }

  /// Path of the shared directory, defaulted under `deploy_to`.
  pub fn shared_path(&self) -> PathBuf {
    self
      .shared_path
      .clone()
      .unwrap_or_else(|| self.deploy_to.join(SHARED_DIR))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn minimal_toml() -> String {
    r#"
name = "myapp"
artifact_location = "http://repo.example.com/myapp-1.0.0.tar.gz"
version = "1.0.0"
deploy_to = "/srv/myapp"
artifact_cache_root = "/var/cache/ardeploy"
"#
    .to_string()
  }

  #[test]
  fn parses_minimal_request_with_defaults() {
    let request: DeployRequest = toml::from_str(&minimal_toml()).unwrap();
    request.validate().unwrap();

    assert_eq!(request.keep, DEFAULT_KEEP);
    assert!(request.is_tarball);
    assert!(!request.force);
    assert!(!request.should_migrate);
    assert_eq!(request.current_path(), PathBuf::from("/srv/myapp/current"));
    assert_eq!(request.shared_path(), PathBuf::from("/srv/myapp/shared"));
  }

  #[test]
  fn explicit_paths_override_defaults() {
    let mut toml_str = minimal_toml();
    toml_str.push_str("current_path = \"/opt/app/live\"\nshared_path = \"/opt/app/shared\"\n");

    let request: DeployRequest = toml::from_str(&toml_str).unwrap();
    assert_eq!(request.current_path(), PathBuf::from("/opt/app/live"));
    assert_eq!(request.shared_path(), PathBuf::from("/opt/app/shared"));
  }

  #[test]
  fn zero_keep_is_rejected() {
    let mut toml_str = minimal_toml();
    toml_str.push_str("keep = 0\n");

    let request: DeployRequest = toml::from_str(&toml_str).unwrap();
    assert!(matches!(request.validate(), Err(RequestError::Invalid(_))));
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let mut toml_str = minimal_toml();
    toml_str.push_str("no_such_field = true\n");

    let result: Result<DeployRequest, _> = toml::from_str(&toml_str);
    assert!(result.is_err());
  }

  #[test]
  fn symlinks_and_shared_directories_parse() {
    let mut toml_str = minimal_toml();
    toml_str.push_str(
      r#"
shared_directories = ["logs", "pids"]

[symlinks]
logs = "logs"
"system.properties" = "conf/system.properties"
"#,
    );

    let request: DeployRequest = toml::from_str(&toml_str).unwrap();
    assert_eq!(request.shared_directories, vec!["logs", "pids"]);
    assert_eq!(request.symlinks.get("logs").unwrap(), "logs");
    assert_eq!(
      request.symlinks.get("system.properties").unwrap(),
      "conf/system.properties"
    );
  }
}
