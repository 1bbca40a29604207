//! Artifact retrieval into the version-scoped cache.
//!
//! Retrieval is content-addressed: when the cached file already matches the
//! expected checksum the transfer is skipped, so repeated convergence runs
//! cost no network or copy work.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::source::{RepoCoordinates, SourceError, SourceKind};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
  #[error("failed to fetch {url}: {message}")]
  Http { url: String, message: String },

  #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
  ChecksumMismatch {
    path: String,
    expected: String,
    actual: String,
  },

  #[error("repository-indexed source '{0}' requires a repository_url in the request")]
  NoRepositoryUrl(String),

  #[error(transparent)]
  Source(#[from] SourceError),

  #[error("io error during fetch: {0}")]
  Io(#[from] std::io::Error),
}

/// Retrieve the artifact into `dest`, skipping the transfer on a checksum
/// cache hit.
///
/// `locator` is interpreted according to `kind`; repository coordinates are
/// turned into a Maven-layout download URL under `repository_url`.
pub fn fetch_artifact(
  kind: SourceKind,
  locator: &str,
  version: &str,
  repository_url: Option<&str>,
  expected_sha256: Option<&str>,
  dest: &Path,
) -> Result<(), FetchError> {
  if let Some(expected) = expected_sha256 {
    if dest.exists() {
      let actual = hash_file(dest)?;
      if actual == expected {
        info!(path = %dest.display(), "cached artifact matches checksum, skipping transfer");
        return Ok(());
      }
      debug!(
        path = %dest.display(),
        expected, actual, "cached artifact checksum mismatch, re-fetching"
      );
    }
  }

  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent)?;
  }

  match kind {
    SourceKind::Http => fetch_url(locator, dest, expected_sha256),
    SourceKind::RepositoryIndexed => {
      let base = repository_url.ok_or_else(|| FetchError::NoRepositoryUrl(locator.to_string()))?;
      let url = repository_download_url(base, locator, version)?;
      fetch_url(&url, dest, expected_sha256)
    }
    SourceKind::LocalFile => {
      info!(from = %locator, to = %dest.display(), "copying local artifact");
      fs::copy(locator, dest)?;
      verify_checksum(dest, expected_sha256)
    }
  }
}

/// Build the Maven-layout download URL for repository coordinates:
/// `<base>/<group as path>/<artifact>/<version>/<artifact>-<version>.<ext>`.
pub fn repository_download_url(base: &str, locator: &str, version: &str) -> Result<String, FetchError> {
  let mut coords = RepoCoordinates::parse(locator)?;
  coords.version = version.to_string();

  Ok(format!(
    "{}/{}/{}/{}/{}",
    base.trim_end_matches('/'),
    coords.group_id.replace('.', "/"),
    coords.artifact_id,
    coords.version,
    coords.filename()
  ))
}

/// Download a URL to `dest`, verifying the checksum when one is expected.
fn fetch_url(url: &str, dest: &Path, expected_sha256: Option<&str>) -> Result<(), FetchError> {
  info!(url, "fetching artifact");

  let response = reqwest::blocking::get(url).map_err(|e| FetchError::Http {
    url: url.to_string(),
    message: e.to_string(),
  })?;

  if !response.status().is_success() {
    return Err(FetchError::Http {
      url: url.to_string(),
      message: format!("HTTP {}", response.status()),
    });
  }

  let bytes = response.bytes().map_err(|e| FetchError::Http {
    url: url.to_string(),
    message: e.to_string(),
  })?;

  if let Some(expected) = expected_sha256 {
    let actual = hex::encode(Sha256::digest(&bytes));
    if actual != expected {
      return Err(FetchError::ChecksumMismatch {
        path: url.to_string(),
        expected: expected.to_string(),
        actual,
      });
    }
    debug!(url, "checksum verified");
  }

  let mut file = fs::File::create(dest)?;
  file.write_all(&bytes)?;

  info!(path = %dest.display(), size = bytes.len(), "download complete");
  Ok(())
}

fn verify_checksum(path: &Path, expected_sha256: Option<&str>) -> Result<(), FetchError> {
  let Some(expected) = expected_sha256 else {
    return Ok(());
  };

  let actual = hash_file(path)?;
  if actual != expected {
    return Err(FetchError::ChecksumMismatch {
      path: path.display().to_string(),
      expected: expected.to_string(),
      actual,
    });
  }
  Ok(())
}

/// SHA256 of a file's contents, streamed.
pub fn hash_file(path: &Path) -> Result<String, std::io::Error> {
  let mut file = fs::File::open(path)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hex::encode(hasher.finalize()))
}
