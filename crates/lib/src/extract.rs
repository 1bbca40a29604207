//! Artifact format classification and extraction into a release directory.
//!
//! Tar-family archives (tar, tar.gz/tgz, tar.bz2/tbz) and zip-family
//! archives (zip, war, jar) are extracted in-process; anything else is
//! copied verbatim only when explicitly classified as plain. Entries land
//! exactly as archived, no leading path component is stripped.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
  #[error("cannot extract artifact '{0}': unsupported extension (supported: tar, tar.gz, tgz, tar.bz2, tbz, zip, war, jar)")]
  UnsupportedType(String),

  #[error("failed to read zip archive {path}: {message}")]
  Zip { path: String, message: String },

  #[error("zip entry with unsafe path in {0}")]
  UnsafeZipEntry(String),

  #[error("io error during extraction: {0}")]
  Io(#[from] std::io::Error),
}

/// On-disk format of a cached artifact, classified by filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
  Tar,
  TarGz,
  TarBz2,
  Zip,
  /// Not an archive; deployed by verbatim copy.
  Plain,
}

impl ArtifactFormat {
  /// Classify by filename suffix. `is_tarball=false` requests force the
  /// plain copy path regardless of extension.
  pub fn classify(filename: &str, is_archive: bool) -> Result<Self, ExtractError> {
    if !is_archive {
      return Ok(Self::Plain);
    }

    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
      Ok(Self::TarGz)
    } else if lower.ends_with(".tar.bz2") || lower.ends_with(".tbz") {
      Ok(Self::TarBz2)
    } else if lower.ends_with(".tar") {
      Ok(Self::Tar)
    } else if lower.ends_with(".zip") || lower.ends_with(".war") || lower.ends_with(".jar") {
      Ok(Self::Zip)
    } else {
      Err(ExtractError::UnsupportedType(filename.to_string()))
    }
  }
}

/// Extract (or copy) a cached artifact into the release directory.
pub fn deploy_artifact(cached: &Path, release_path: &Path, format: ArtifactFormat) -> Result<(), ExtractError> {
  fs::create_dir_all(release_path)?;

  match format {
    ArtifactFormat::Tar => {
      let file = File::open(cached)?;
      unpack_tar(BufReader::new(file), release_path)?;
    }
    ArtifactFormat::TarGz => {
      let file = File::open(cached)?;
      unpack_tar(GzDecoder::new(BufReader::new(file)), release_path)?;
    }
    ArtifactFormat::TarBz2 => {
      let file = File::open(cached)?;
      unpack_tar(BzDecoder::new(BufReader::new(file)), release_path)?;
    }
    ArtifactFormat::Zip => unpack_zip(cached, release_path)?,
    ArtifactFormat::Plain => {
      let filename = cached.file_name().unwrap_or(cached.as_os_str());
      fs::copy(cached, release_path.join(filename))?;
    }
  }

  info!(artifact = %cached.display(), release = %release_path.display(), "artifact deployed into release");
  Ok(())
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> Result<(), ExtractError> {
  let mut archive = Archive::new(reader);
  archive.unpack(dest)?;
  Ok(())
}

fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<(), ExtractError> {
  let file = File::open(archive_path)?;
  let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| ExtractError::Zip {
    path: archive_path.display().to_string(),
    message: e.to_string(),
  })?;

  for i in 0..archive.len() {
    let mut entry = archive.by_index(i).map_err(|e| ExtractError::Zip {
      path: archive_path.display().to_string(),
      message: e.to_string(),
    })?;

    let rel_path = entry
      .enclosed_name()
      .ok_or_else(|| ExtractError::UnsafeZipEntry(archive_path.display().to_string()))?;
    let dest_path = dest.join(rel_path);

    if entry.is_dir() {
      fs::create_dir_all(&dest_path)?;
      continue;
    }

    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent)?;
    }

    let mut outfile = File::create(&dest_path)?;
    std::io::copy(&mut entry, &mut outfile)?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      if let Some(mode) = entry.unix_mode() {
        fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))?;
      }
    }
  }

  Ok(())
}
