//! The deployment orchestrator.
//!
//! One convergence run walks the phases in order: Resolving, Pruning,
//! Preparing, Fetching, DecidingDeploy, Deploying (or skipping),
//! Configuring, Migrating, Restarting, Finalizing. Everything the phases
//! need is resolved once into an immutable [`DeployContext`]; no phase
//! re-derives source kinds or paths.
//!
//! Failure semantics: resolution errors abort before any mutation;
//! filesystem failures in later phases propagate and abort the remainder.
//! No rollback is attempted, re-running the (idempotent) workflow repairs
//! partial state.

use std::io;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::extract::{ArtifactFormat, ExtractError, deploy_artifact};
use crate::fetch::{FetchError, fetch_artifact};
use crate::fsops::{FsOpsError, apply_ownership, ensure_dir, replace_symlink};
use crate::hooks::{HookError, HookPoint, LifecycleHooks};
use crate::manifest::{self, ManifestError};
use crate::paths::{ReleasePaths, current_release_version, previous_versions};
use crate::request::{DeployRequest, RequestError};
use crate::retention::{PruneResult, prune};
use crate::source::{self, SourceError, SourceKind};

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
  #[error(transparent)]
  Request(#[from] RequestError),

  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Extract(#[from] ExtractError),

  #[error(transparent)]
  Hook(#[from] HookError),

  #[error(transparent)]
  Fs(#[from] FsOpsError),

  #[error("io error during deploy: {0}")]
  Io(#[from] io::Error),
}

/// Everything one invocation needs, resolved once and never mutated.
#[derive(Debug, Clone)]
pub struct DeployContext {
  pub request: DeployRequest,
  pub source_kind: SourceKind,
  /// Concrete version ("latest" already resolved).
  pub version: String,
  /// Filename the artifact is cached under.
  pub filename: String,
  pub paths: ReleasePaths,
}

/// Summary of one convergence run.
#[derive(Debug, serde::Serialize)]
pub struct DeployOutcome {
  pub name: String,
  pub version: String,
  pub source_kind: SourceKind,
  /// Whether artifact content was (re)extracted this run.
  pub deployed: bool,
  /// Whether the restart hook fired.
  pub restarted: bool,
  pub release_path: PathBuf,
  pub pruned: PruneResult,
}

/// Resolving phase: classify the source, settle the version, derive paths.
///
/// All configuration errors surface here, before any mutation.
pub fn resolve(request: DeployRequest) -> Result<DeployContext, DeployError> {
  request.validate()?;

  let source_kind = source::classify(&request.artifact_location)?;
  let version = source::resolve_version(source_kind, &request.artifact_location, &request.version)?;
  let filename = source::artifact_filename(source_kind, &request.artifact_location, &version)?;
  let paths = ReleasePaths::derive(&request, &version, &filename);

  debug!(
    name = %request.name,
    ?source_kind,
    version,
    filename,
    "resolved deploy context"
  );

  Ok(DeployContext {
    request,
    source_kind,
    version,
    filename,
    paths,
  })
}

/// Run the full deploy pipeline.
pub fn execute(request: DeployRequest, hooks: &LifecycleHooks) -> Result<DeployOutcome, DeployError> {
  let context = resolve(request)?;
  let request = &context.request;
  let paths = &context.paths;

  info!(
    name = %request.name,
    version = %context.version,
    deploy_to = %request.deploy_to.display(),
    "starting deploy"
  );

  // Pruning: bound disk growth before touching the new release, so the
  // bound holds even if this deploy fails later.
  let previous = previous_versions(&request.deploy_to, &paths.current_link)?;
  let pruned = prune(&previous, request.keep, &paths.artifact_root, false);

  // Version labels still installed after pruning; used by the decision.
  let previous_labels: Vec<String> = previous
    .iter()
    .map(|v| v.version.clone())
    .filter(|v| !pruned.deleted_versions.contains(v))
    .collect();

  prepare_directories(&context)?;

  fetch_artifact(
    context.source_kind,
    &request.artifact_location,
    &context.version,
    request.repository_url.as_deref(),
    request.artifact_checksum.as_deref(),
    &paths.cached_artifact_path,
  )?;

  hooks.run(HookPoint::BeforeDeploy, &context)?;

  // DecidingDeploy
  let current_version = current_release_version(&paths.current_link);
  let should_deploy = should_deploy(&context, current_version.as_deref(), &previous_labels)?;
  let symlink_changing = current_version.as_deref() != Some(context.version.as_str());

  if should_deploy {
    hooks.run(HookPoint::BeforeExtract, &context)?;
    let format = ArtifactFormat::classify(&context.filename, request.is_tarball)?;
    deploy_artifact(&paths.cached_artifact_path, &paths.release_path, format)?;
    apply_ownership(&paths.release_path, request.owner.as_deref(), request.group.as_deref());
    hooks.run(HookPoint::AfterExtract, &context)?;

    hooks.run(HookPoint::BeforeSymlink, &context)?;
    materialize_shared_symlinks(&context)?;
    hooks.run(HookPoint::AfterSymlink, &context)?;
  } else {
    info!(name = %request.name, version = %context.version, "release unchanged, skipping deploy");
  }

  hooks.run(HookPoint::Configure, &context)?;

  if should_deploy && request.should_migrate {
    hooks.run(HookPoint::BeforeMigrate, &context)?;
    hooks.run(HookPoint::Migrate, &context)?;
    hooks.run(HookPoint::AfterMigrate, &context)?;
  }

  // Restart when content changed this run, or the release content drifted
  // from its manifest, or the current symlink is about to move.
  let restart = should_deploy || symlink_changing || manifest::has_changed(&paths.release_path)?;
  if restart {
    hooks.run(HookPoint::Restart, &context)?;
  }

  hooks.run(HookPoint::AfterDeploy, &context)?;

  // Finalizing: the symlink flip must precede the manifest write, the
  // manifest describes the now-current release.
  replace_symlink(&paths.release_path, &paths.current_link)?;
  manifest::write(&paths.release_path)?;

  info!(
    name = %request.name,
    version = %context.version,
    deployed = should_deploy,
    restarted = restart,
    "deploy complete"
  );

  Ok(DeployOutcome {
    name: request.name.clone(),
    version: context.version.clone(),
    source_kind: context.source_kind,
    deployed: should_deploy,
    restarted: restart,
    release_path: paths.release_path.clone(),
    pruned,
  })
}

/// Prepare the version cache and fetch the artifact, nothing more.
///
/// Useful for warming caches ahead of a maintenance window.
pub fn pre_seed(request: DeployRequest) -> Result<PathBuf, DeployError> {
  let context = resolve(request)?;

  prepare_directories(&context)?;
  fetch_artifact(
    context.source_kind,
    &context.request.artifact_location,
    &context.version,
    context.request.repository_url.as_deref(),
    context.request.artifact_checksum.as_deref(),
    &context.paths.cached_artifact_path,
  )?;

  info!(path = %context.paths.cached_artifact_path.display(), "artifact pre-seeded");
  Ok(context.paths.cached_artifact_path.clone())
}

/// Preparing phase: idempotent creation of the cache, release, and shared
/// trees.
fn prepare_directories(context: &DeployContext) -> Result<(), DeployError> {
  let paths = &context.paths;
  let request = &context.request;

  ensure_dir(&paths.version_cache_path)?;
  ensure_dir(&paths.release_path)?;
  ensure_dir(&paths.shared_path)?;

  for dir in &request.shared_directories {
    ensure_dir(&paths.shared_path.join(dir))?;
  }

  apply_ownership(&paths.shared_path, request.owner.as_deref(), request.group.as_deref());
  Ok(())
}

/// The deploy decision table.
///
/// Force always deploys. With nothing currently linked, deploy. A version
/// that is neither linked nor previously installed deploys. A version that
/// is linked, or previously installed, defers to the manifest comparison
/// of its release directory.
fn should_deploy(
  context: &DeployContext,
  current_version: Option<&str>,
  previous_labels: &[String],
) -> Result<bool, DeployError> {
  let version = context.version.as_str();

  if context.request.force {
    info!(version, "force flag set, deploying");
    return Ok(true);
  }

  let Some(current) = current_version else {
    info!(version, "no version currently linked, deploying");
    return Ok(true);
  };

  if version != current && !previous_labels.iter().any(|v| v == version) {
    info!(version, current, "version not previously installed, deploying");
    return Ok(true);
  }

  // Version is either the linked one or a previously installed one:
  // content decides.
  let changed = manifest::has_changed(&context.paths.release_path)?;
  debug!(version, current, changed, "deferring to manifest comparison");
  Ok(changed)
}

/// Materialize the configured symlink mappings: for each `key -> value`,
/// ensure `<shared>/<key>` exists and link `<release>/<value>` to it.
fn materialize_shared_symlinks(context: &DeployContext) -> Result<(), DeployError> {
  let paths = &context.paths;

  for (shared_entry, release_entry) in &context.request.symlinks {
    let shared_target = paths.shared_path.join(shared_entry);
    ensure_dir(&shared_target)?;

    let link = paths.release_path.join(release_entry);
    if let Some(parent) = link.parent() {
      ensure_dir(parent)?;
    }
    replace_symlink(&shared_target, &link)?;
  }

  Ok(())
}
