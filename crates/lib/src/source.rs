//! Artifact source classification.
//!
//! A locator string resolves to exactly one [`SourceKind`] during the
//! Resolving phase and is carried in the deploy context from then on;
//! nothing downstream re-derives it.

use std::path::Path;

use serde::Serialize;

use crate::consts::DEFAULT_REPO_EXTENSION;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
  #[error(
    "cannot resolve artifact source '{0}': not an http(s) URL, repository coordinates, or an existing local file"
  )]
  Unresolved(String),

  #[error("version 'latest' cannot be used with the http source '{0}'")]
  LatestWithHttp(String),

  #[error("version 'latest' cannot be resolved: coordinates '{0}' carry no concrete version")]
  LatestUnresolvable(String),

  #[error("malformed repository coordinates '{0}': expected group:artifact:version[:extension]")]
  MalformedCoordinates(String),
}

/// Where an artifact comes from. Resolved once per deploy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
  Http,
  RepositoryIndexed,
  LocalFile,
}

/// Parsed colon-separated repository coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
  pub group_id: String,
  pub artifact_id: String,
  pub version: String,
  pub extension: String,
}

impl RepoCoordinates {
  /// Parse `group:artifact:version[:extension]`. A missing extension
  /// defaults to `jar`.
  pub fn parse(locator: &str) -> Result<Self, SourceError> {
    let segments: Vec<&str> = locator.split(':').collect();
    if segments.len() < 3 || segments.len() > 4 || segments.iter().any(|s| s.is_empty()) {
      return Err(SourceError::MalformedCoordinates(locator.to_string()));
    }

    Ok(Self {
      group_id: segments[0].to_string(),
      artifact_id: segments[1].to_string(),
      version: segments[2].to_string(),
      extension: segments.get(3).unwrap_or(&DEFAULT_REPO_EXTENSION).to_string(),
    })
  }

  /// Filename the artifact is cached under: `<artifact>-<version>.<ext>`.
  pub fn filename(&self) -> String {
    format!("{}-{}.{}", self.artifact_id, self.version, self.extension)
  }
}

/// Classify a locator into its source kind.
///
/// Order matters: an http(s) URL contains colons, so the URL check runs
/// before the coordinate check.
pub fn classify(locator: &str) -> Result<SourceKind, SourceError> {
  if is_http(locator) {
    return Ok(SourceKind::Http);
  }
  if locator.split(':').count() > 2 {
    return Ok(SourceKind::RepositoryIndexed);
  }
  if Path::new(locator).exists() {
    return Ok(SourceKind::LocalFile);
  }
  Err(SourceError::Unresolved(locator.to_string()))
}

/// True when a locator is an http or https URL.
pub fn is_http(locator: &str) -> bool {
  let lower = locator.to_ascii_lowercase();
  (lower.starts_with("http://") || lower.starts_with("https://")) && lower.len() > "https://".len()
}

/// Case-insensitive check for the "latest" version token.
pub fn is_latest(version: &str) -> bool {
  version.eq_ignore_ascii_case("latest")
}

/// Resolve the concrete version for a request.
///
/// "latest" is rejected for http sources outright, and only accepted for
/// repository sources whose coordinates carry a concrete version.
pub fn resolve_version(kind: SourceKind, locator: &str, requested: &str) -> Result<String, SourceError> {
  if !is_latest(requested) {
    return Ok(requested.to_string());
  }

  match kind {
    SourceKind::Http => Err(SourceError::LatestWithHttp(locator.to_string())),
    SourceKind::RepositoryIndexed => {
      let coords = RepoCoordinates::parse(locator)?;
      if is_latest(&coords.version) {
        return Err(SourceError::LatestUnresolvable(locator.to_string()));
      }
      Ok(coords.version)
    }
    SourceKind::LocalFile => Err(SourceError::LatestUnresolvable(locator.to_string())),
  }
}

/// Filename the artifact will be cached under.
///
/// Repository coordinates produce `<artifact>-<version>.<ext>`; every other
/// source uses the last path segment of the locator.
pub fn artifact_filename(kind: SourceKind, locator: &str, version: &str) -> Result<String, SourceError> {
  match kind {
    SourceKind::RepositoryIndexed => {
      let mut coords = RepoCoordinates::parse(locator)?;
      if is_latest(&coords.version) {
        coords.version = version.to_string();
      }
      Ok(coords.filename())
    }
    SourceKind::Http | SourceKind::LocalFile => {
      let basename = locator
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(locator);
      // Strip any query string from URL locators
      let basename = basename.split('?').next().unwrap_or(basename);
      if basename.is_empty() {
        return Err(SourceError::Unresolved(locator.to_string()));
      }
      Ok(basename.to_string())
    }
  }
}
