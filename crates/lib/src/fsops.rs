//! Filesystem collaborators: idempotent directory creation, symlink
//! replacement, and best-effort ownership application.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum FsOpsError {
  #[error("failed to create directory {path}: {source}")]
  CreateDir { path: String, source: io::Error },

  #[error("failed to create symlink {link} -> {target}: {source}")]
  Symlink {
    link: String,
    target: String,
    source: io::Error,
  },
}

/// Create a directory and its parents. Re-running on an existing
/// directory is not an error.
pub fn ensure_dir(path: &Path) -> Result<(), FsOpsError> {
  fs::create_dir_all(path).map_err(|e| FsOpsError::CreateDir {
    path: path.display().to_string(),
    source: e,
  })
}

/// Point `link` at `target`, replacing any existing link or file at that
/// path.
///
/// Already pointing at `target` is a no-op: the link is left untouched.
/// A repoint stages the new symlink under a sibling name and renames it
/// over the old one, so readers see either the old target or the new
/// one, never a missing link.
pub fn replace_symlink(target: &Path, link: &Path) -> Result<(), FsOpsError> {
  if fs::read_link(link).is_ok_and(|existing| existing == target) {
    debug!(link = %link.display(), target = %target.display(), "symlink already current");
    return Ok(());
  }

  let symlink_err = |e: io::Error| FsOpsError::Symlink {
    link: link.display().to_string(),
    target: target.display().to_string(),
    source: e,
  };

  if link.is_symlink() || link.exists() {
    let staged = staged_path(link);
    if staged.is_symlink() || staged.exists() {
      fs::remove_file(&staged).ok();
    }
    symlink(target, &staged).map_err(symlink_err)?;
    rename_over(&staged, link).map_err(symlink_err)?;
  } else {
    symlink(target, link).map_err(symlink_err)?;
  }

  debug!(link = %link.display(), target = %target.display(), "symlink repointed");
  Ok(())
}

fn staged_path(link: &Path) -> PathBuf {
  let mut name = link.as_os_str().to_os_string();
  name.push(".new");
  PathBuf::from(name)
}

#[cfg(unix)]
fn rename_over(staged: &Path, link: &Path) -> io::Result<()> {
  fs::rename(staged, link)
}

#[cfg(windows)]
fn rename_over(staged: &Path, link: &Path) -> io::Result<()> {
  fs::remove_file(link).ok();
  fs::rename(staged, link)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  if target.is_dir() {
    std::os::windows::fs::symlink_dir(target, link)
  } else {
    std::os::windows::fs::symlink_file(target, link)
  }
}

/// Apply owner/group to a tree, best effort.
///
/// Resolution failures and chown failures are logged, never fatal: the
/// deploy itself owns correctness of content, not of ownership metadata.
#[cfg(unix)]
pub fn apply_ownership(root: &Path, owner: Option<&str>, group: Option<&str>) {
  use nix::unistd::{Gid, Group, Uid, User, chown};

  if owner.is_none() && group.is_none() {
    return;
  }

  let uid: Option<Uid> = owner.and_then(|name| match User::from_name(name) {
    Ok(Some(user)) => Some(user.uid),
    _ => {
      warn!(owner = name, "cannot resolve owner, leaving ownership unchanged");
      None
    }
  });

  let gid: Option<Gid> = group.and_then(|name| match Group::from_name(name) {
    Ok(Some(group)) => Some(group.gid),
    _ => {
      warn!(group = name, "cannot resolve group, leaving ownership unchanged");
      None
    }
  });

  if uid.is_none() && gid.is_none() {
    return;
  }

  for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
    if let Err(e) = chown(entry.path(), uid, gid) {
      warn!(path = %entry.path().display(), error = %e, "chown failed");
    }
  }
}

#[cfg(not(unix))]
pub fn apply_ownership(_root: &Path, _owner: Option<&str>, _group: Option<&str>) {}
