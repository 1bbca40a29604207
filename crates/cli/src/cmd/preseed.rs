//! Implementation of the `ardeploy preseed` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use ardeploy_lib::deploy::pre_seed;
use ardeploy_lib::request::DeployRequest;

use crate::output::{OutputFormat, print_json, print_stat, print_success};

#[derive(Serialize)]
struct PreseedResult {
  cached_path: std::path::PathBuf,
}

/// Fetch the artifact into its version-scoped cache without deploying.
pub fn cmd_preseed(request_path: &str, output: OutputFormat) -> Result<()> {
  let request = DeployRequest::from_file(Path::new(request_path)).context("Failed to load deploy request")?;
  let name = request.name.clone();

  let cached_path = pre_seed(request).context("Pre-seed failed")?;

  if output.is_json() {
    print_json(&PreseedResult { cached_path })?;
    return Ok(());
  }

  println!();
  print_success(&format!("Artifact for {} cached", name));
  print_stat("Path", &cached_path.display().to_string());

  Ok(())
}
