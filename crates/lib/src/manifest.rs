//! Release manifests: content fingerprints deciding whether a redeploy is
//! needed when the version string alone cannot tell.
//!
//! A manifest maps release-relative file paths to SHA-1 content digests and
//! is persisted as `manifest.yaml` inside the release directory. It is
//! written only after a successful deploy, as the very last filesystem
//! operation, so a present manifest always describes a complete release.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::consts::MANIFEST_FILENAME;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
  #[error("failed to walk release directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },

  #[error("failed to read manifest at {path}: {message}")]
  ReadManifest { path: String, message: String },

  #[error("failed to parse manifest at {path}: {message}")]
  ParseManifest { path: String, message: String },

  #[error("failed to write manifest at {path}: {message}")]
  WriteManifest { path: String, message: String },
}

/// Map of release-relative path to SHA-1 content digest (lowercase hex).
///
/// BTreeMap keeps the serialized form stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseManifest(pub BTreeMap<String, String>);

impl ReleaseManifest {
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }
}

/// Generate a manifest over all regular files under `root`.
///
/// Directory entries and the manifest side-car itself are excluded. Paths
/// are release-relative with forward slashes, keyed in sorted order.
pub fn generate(root: &Path) -> Result<ReleaseManifest, ManifestError> {
  let mut entries = BTreeMap::new();

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.map_err(|e| ManifestError::WalkDir { message: e.to_string() })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let rel_path = entry
      .path()
      .strip_prefix(root)
      .unwrap_or(entry.path())
      .to_string_lossy()
      .replace('\\', "/");

    if rel_path == MANIFEST_FILENAME {
      continue;
    }

    let digest = hash_file(entry.path())?;
    entries.insert(rel_path, digest);
  }

  debug!(root = %root.display(), files = entries.len(), "generated manifest");
  Ok(ReleaseManifest(entries))
}

/// Load the persisted manifest side-car from a release directory.
pub fn load(root: &Path) -> Result<ReleaseManifest, ManifestError> {
  let path = root.join(MANIFEST_FILENAME);

  let content = fs::read_to_string(&path).map_err(|e| ManifestError::ReadManifest {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  serde_yaml::from_str(&content).map_err(|e| ManifestError::ParseManifest {
    path: path.display().to_string(),
    message: e.to_string(),
  })
}

/// Decide whether the release content differs from its persisted manifest.
///
/// A missing or corrupt side-car counts as changed: deployment state is
/// unknown, so a redeploy is forced.
pub fn has_changed(root: &Path) -> Result<bool, ManifestError> {
  let saved = match load(root) {
    Ok(manifest) => manifest,
    Err(e) => {
      warn!(root = %root.display(), error = %e, "cannot load manifest, treating release as changed");
      return Ok(true);
    }
  };

  let current = generate(root)?;
  let changed = saved != current;

  if changed {
    info!(root = %root.display(), "manifest differs from release content");
  } else {
    debug!(root = %root.display(), "manifest matches release content");
  }

  Ok(changed)
}

/// Regenerate and persist the manifest side-car for a release.
///
/// Must be the last filesystem operation of a successful deploy.
pub fn write(root: &Path) -> Result<ReleaseManifest, ManifestError> {
  let manifest = generate(root)?;
  let path = root.join(MANIFEST_FILENAME);

  let content = serde_yaml::to_string(&manifest).map_err(|e| ManifestError::WriteManifest {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  fs::write(&path, content).map_err(|e| ManifestError::WriteManifest {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  info!(path = %path.display(), files = manifest.len(), "wrote manifest");
  Ok(manifest)
}

/// SHA-1 digest of a file's contents, streamed in 8 KiB chunks.
fn hash_file(path: &Path) -> Result<String, ManifestError> {
  let mut file = fs::File::open(path).map_err(|e| ManifestError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  let mut hasher = Sha1::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| ManifestError::ReadFile {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hex::encode(hasher.finalize()))
}
