//! Implementation of the `ardeploy prune` command.
//!
//! Standalone retention: useful when disk pressure demands pruning without
//! waiting for the next deploy.

use std::path::Path;

use anyhow::{Context, Result};

use ardeploy_lib::paths::previous_versions;
use ardeploy_lib::request::DeployRequest;
use ardeploy_lib::retention::prune;

use crate::output::{OutputFormat, format_bytes, print_info, print_json, print_stat, print_success};

pub fn cmd_prune(request_path: &str, keep: Option<usize>, dry_run: bool, output: OutputFormat) -> Result<()> {
  let request = DeployRequest::from_file(Path::new(request_path)).context("Failed to load deploy request")?;
  let keep = keep.unwrap_or(request.keep);

  let previous = previous_versions(&request.deploy_to, &request.current_path())
    .context("Failed to enumerate previous versions")?;
  let artifact_root = request.artifact_cache_root.join(&request.name);

  let result = prune(&previous, keep, &artifact_root, dry_run);

  if output.is_json() {
    print_json(&result)?;
    return Ok(());
  }

  println!();
  if dry_run {
    print_info("Dry run - no changes made");
  } else {
    print_success("Pruning complete");
  }
  print_stat("Versions scanned", &result.stats.versions_scanned.to_string());
  print_stat("Versions removed", &result.stats.versions_deleted.to_string());
  print_stat("Space freed", &format_bytes(result.stats.bytes_freed));
  for version in &result.deleted_versions {
    print_stat("Removed", version);
  }

  Ok(())
}
