//! Retention: bound disk growth by deleting the oldest previous releases
//! and their artifact caches.
//!
//! Pruning runs before a new release is touched, so the bound holds even
//! when the deploy that follows fails. Deletion is best effort per entry:
//! one locked or half-removed directory must not block retention of the
//! rest. The currently linked release is never in the candidate list
//! (excluded by [`crate::paths::previous_versions`]).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::paths::PreviousVersion;

/// Counters for one pruning pass.
#[derive(Debug, Default, serde::Serialize)]
pub struct PruneStats {
  pub versions_scanned: usize,
  pub versions_deleted: usize,
  pub bytes_freed: u64,
}

/// Outcome of one pruning pass.
#[derive(Debug, Default, serde::Serialize)]
pub struct PruneResult {
  pub stats: PruneStats,
  pub deleted_versions: Vec<String>,
  pub deleted_paths: Vec<PathBuf>,
}

/// Total size of the regular files under a directory.
fn dir_size(path: &Path) -> u64 {
  WalkDir::new(path)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .filter_map(|e| e.metadata().ok())
    .map(|m| m.len())
    .sum()
}

/// Delete the oldest previous versions beyond `keep`.
///
/// `previous` must be ordered oldest first. For each pruned version both
/// the release directory and `<artifact_root>/<version>` are removed.
/// With `dry_run` set, candidates are reported but nothing is deleted.
pub fn prune(previous: &[PreviousVersion], keep: usize, artifact_root: &Path, dry_run: bool) -> PruneResult {
  let mut result = PruneResult::default();
  result.stats.versions_scanned = previous.len();

  let delete_count = previous.len().saturating_sub(keep);
  if delete_count == 0 {
    debug!(total = previous.len(), keep, "retention satisfied, nothing to prune");
    return result;
  }

  info!(
    total = previous.len(),
    keep, delete_count, dry_run, "pruning old versions"
  );

  for version in &previous[..delete_count] {
    let cache_path = artifact_root.join(&version.version);
    let mut freed = 0u64;
    let mut removed = Vec::new();
    let mut failed = false;

    for path in [&version.release_path, &cache_path] {
      if !path.exists() {
        continue;
      }

      let size = dir_size(path);
      if dry_run {
        freed += size;
        removed.push(path.clone());
        continue;
      }

      match fs::remove_dir_all(path) {
        Ok(()) => {
          freed += size;
          removed.push(path.clone());
        }
        Err(e) => {
          warn!(path = %path.display(), error = %e, "failed to delete pruned version directory");
          failed = true;
        }
      }
    }

    if !failed {
      debug!(version = %version.version, "pruned");
      result.deleted_versions.push(version.version.clone());
      result.stats.versions_deleted += 1;
    }
    result.stats.bytes_freed += freed;
    result.deleted_paths.extend(removed);
  }

  result
}
