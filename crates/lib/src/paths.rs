//! Version locator: deterministic path derivation for a deploy target and
//! enumeration of previously installed versions.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::consts::{MANIFEST_FILENAME, RELEASES_DIR};
use crate::request::DeployRequest;

/// All paths one deploy invocation touches, derived once from the request
/// and the resolved version. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePaths {
  /// `<artifact_cache_root>/<name>`
  pub artifact_root: PathBuf,
  /// `<artifact_root>/<version>`
  pub version_cache_path: PathBuf,
  /// `<version_cache_path>/<filename>`
  pub cached_artifact_path: PathBuf,
  /// `<deploy_to>/releases/<version>`
  pub release_path: PathBuf,
  /// `<release_path>/manifest.yaml`
  pub manifest_path: PathBuf,
  /// The "current" symlink.
  pub current_link: PathBuf,
  /// Shared directory for state surviving across releases.
  pub shared_path: PathBuf,
}

impl ReleasePaths {
  /// Derive every path from the request, resolved version, and cached
  /// artifact filename.
  pub fn derive(request: &DeployRequest, version: &str, filename: &str) -> Self {
    let artifact_root = request.artifact_cache_root.join(&request.name);
    let version_cache_path = artifact_root.join(version);
    let release_path = request.deploy_to.join(RELEASES_DIR).join(version);

    Self {
      cached_artifact_path: version_cache_path.join(filename),
      manifest_path: release_path.join(MANIFEST_FILENAME),
      artifact_root,
      version_cache_path,
      release_path,
      current_link: request.current_path(),
      shared_path: request.shared_path(),
    }
  }

  /// The releases directory this release lives under.
  pub fn releases_dir(&self) -> PathBuf {
    self
      .release_path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| self.release_path.clone())
  }
}

/// A previously installed release, discovered by scanning the releases
/// directory. Ephemeral.
#[derive(Debug, Clone)]
pub struct PreviousVersion {
  pub version: String,
  pub release_path: PathBuf,
  pub modified: SystemTime,
}

/// Version the "current" symlink points at, if any.
///
/// The version label is the basename of the link target.
pub fn current_release_version(current_link: &Path) -> Option<String> {
  let target = fs::read_link(current_link).ok()?;
  target.file_name().map(|n| n.to_string_lossy().to_string())
}

/// Release directory the "current" symlink points at, if any.
pub fn current_release_path(current_link: &Path) -> Option<PathBuf> {
  fs::read_link(current_link).ok()
}

/// Enumerate previously installed versions, oldest first.
///
/// Scans the immediate subdirectories of `<deploy_to>/releases`, excluding
/// the version the "current" symlink resolves to, sorted ascending by
/// directory modification time. A missing releases directory yields an
/// empty list.
pub fn previous_versions(deploy_to: &Path, current_link: &Path) -> io::Result<Vec<PreviousVersion>> {
  let releases_dir = deploy_to.join(RELEASES_DIR);
  let current_version = current_release_version(current_link);

  let entries = match fs::read_dir(&releases_dir) {
    Ok(entries) => entries,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => return Err(e),
  };

  let mut versions = Vec::new();
  for entry in entries {
    let entry = entry?;
    if !entry.file_type()?.is_dir() {
      continue;
    }

    let version = match entry.file_name().to_str() {
      Some(name) => name.to_string(),
      None => continue,
    };

    if Some(&version) == current_version.as_ref() {
      continue;
    }

    let modified = entry.metadata()?.modified()?;
    versions.push(PreviousVersion {
      version,
      release_path: entry.path(),
      modified,
    });
  }

  versions.sort_by_key(|v| v.modified);
  debug!(
    count = versions.len(),
    current = ?current_version,
    "enumerated previous versions"
  );

  Ok(versions)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;
  use tempfile::tempdir;

  fn request_for(root: &Path) -> DeployRequest {
    DeployRequest {
      name: "myapp".to_string(),
      artifact_location: "http://host/myapp-1.0.0.tar.gz".to_string(),
      version: "1.0.0".to_string(),
      artifact_checksum: None,
      deploy_to: root.join("srv"),
      current_path: None,
      shared_path: None,
      artifact_cache_root: root.join("cache"),
      repository_url: None,
      owner: None,
      group: None,
      keep: 3,
      is_tarball: true,
      force: false,
      should_migrate: false,
      symlinks: BTreeMap::new(),
      shared_directories: Vec::new(),
    }
  }

  #[cfg(unix)]
  fn symlink(target: &Path, link: &Path) {
    std::os::unix::fs::symlink(target, link).unwrap();
  }

  #[test]
  fn paths_derive_deterministically() {
    let temp = tempdir().unwrap();
    let request = request_for(temp.path());

    let paths = ReleasePaths::derive(&request, "1.0.0", "myapp-1.0.0.tar.gz");

    assert_eq!(paths.release_path, temp.path().join("srv/releases/1.0.0"));
    assert_eq!(paths.version_cache_path, temp.path().join("cache/myapp/1.0.0"));
    assert_eq!(
      paths.cached_artifact_path,
      temp.path().join("cache/myapp/1.0.0/myapp-1.0.0.tar.gz")
    );
    assert_eq!(paths.manifest_path, temp.path().join("srv/releases/1.0.0/manifest.yaml"));
    assert_eq!(paths.current_link, temp.path().join("srv/current"));
    assert_eq!(paths.releases_dir(), temp.path().join("srv/releases"));
  }

  #[test]
  fn missing_releases_dir_yields_empty_list() {
    let temp = tempdir().unwrap();
    let versions = previous_versions(&temp.path().join("srv"), &temp.path().join("srv/current")).unwrap();
    assert!(versions.is_empty());
  }

  #[test]
  #[cfg(unix)]
  fn previous_versions_sorted_and_exclude_current() {
    let temp = tempdir().unwrap();
    let deploy_to = temp.path().join("srv");
    let releases = deploy_to.join("releases");

    // Creation order fixes the mtime order
    for version in ["1.0.0", "1.1.0", "2.0.0"] {
      fs::create_dir_all(releases.join(version)).unwrap();
      std::thread::sleep(std::time::Duration::from_millis(20));
    }

    let current = deploy_to.join("current");
    symlink(&releases.join("2.0.0"), &current);

    let versions = previous_versions(&deploy_to, &current).unwrap();
    let labels: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();

    assert_eq!(labels, vec!["1.0.0", "1.1.0"]);
  }

  #[test]
  fn current_version_is_link_target_basename() {
    let temp = tempdir().unwrap();
    let link = temp.path().join("current");

    assert_eq!(current_release_version(&link), None);

    #[cfg(unix)]
    {
      let target = temp.path().join("releases/3.2.1");
      fs::create_dir_all(&target).unwrap();
      symlink(&target, &link);
      assert_eq!(current_release_version(&link).unwrap(), "3.2.1");
    }
  }
}
