//! Implementation of the `ardeploy status` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use ardeploy_lib::paths::{current_release_version, previous_versions};
use ardeploy_lib::request::DeployRequest;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

#[derive(Serialize)]
struct StatusReport {
  name: String,
  current_version: Option<String>,
  previous_versions: Vec<String>,
  cached_versions: Vec<String>,
}

/// Report the current, previous, and cached versions of a deploy target.
pub fn cmd_status(request_path: &str, output: OutputFormat) -> Result<()> {
  let request = DeployRequest::from_file(Path::new(request_path)).context("Failed to load deploy request")?;

  let current = current_release_version(&request.current_path());
  let previous = previous_versions(&request.deploy_to, &request.current_path())
    .context("Failed to enumerate previous versions")?;
  let cached = cached_versions(&request.artifact_cache_root.join(&request.name));

  let report = StatusReport {
    name: request.name.clone(),
    current_version: current,
    previous_versions: previous.iter().map(|v| v.version.clone()).collect(),
    cached_versions: cached,
  };

  if output.is_json() {
    print_json(&report)?;
    return Ok(());
  }

  println!();
  print_info(&format!("Deploy target {}", request.deploy_to.display()));
  print_stat("Name", &report.name);
  print_stat("Current", report.current_version.as_deref().unwrap_or("(none)"));
  print_stat(
    "Previous",
    &if report.previous_versions.is_empty() {
      "(none)".to_string()
    } else {
      report.previous_versions.join(", ")
    },
  );
  print_stat(
    "Cached",
    &if report.cached_versions.is_empty() {
      "(none)".to_string()
    } else {
      report.cached_versions.join(", ")
    },
  );

  Ok(())
}

/// Versions present in the artifact cache, sorted.
fn cached_versions(artifact_root: &Path) -> Vec<String> {
  let Ok(entries) = std::fs::read_dir(artifact_root) else {
    return Vec::new();
  };

  let mut versions: Vec<String> = entries
    .flatten()
    .filter(|e| e.path().is_dir())
    .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
    .collect();
  versions.sort();
  versions
}
