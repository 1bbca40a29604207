//! Implementation of the `ardeploy deploy` command.

use std::path::Path;

use anyhow::{Context, Result};

use ardeploy_lib::deploy::execute;
use ardeploy_lib::hooks::LifecycleHooks;
use ardeploy_lib::request::DeployRequest;

use crate::output::{OutputFormat, format_bytes, print_json, print_stat, print_success};

/// Run the full deploy pipeline for the given request file.
///
/// `--force` overrides the request's force flag; hooks are not wired from
/// the CLI (embedding callers register them programmatically).
pub fn cmd_deploy(request_path: &str, force: bool, output: OutputFormat) -> Result<()> {
  let mut request =
    DeployRequest::from_file(Path::new(request_path)).context("Failed to load deploy request")?;
  if force {
    request.force = true;
  }

  let outcome = execute(request, &LifecycleHooks::default()).context("Deploy failed")?;

  if output.is_json() {
    print_json(&outcome)?;
    return Ok(());
  }

  println!();
  if outcome.deployed {
    print_success(&format!("Deployed {} {}", outcome.name, outcome.version));
  } else {
    print_success(&format!("{} {} already up to date", outcome.name, outcome.version));
  }
  print_stat("Release", &outcome.release_path.display().to_string());
  print_stat("Restarted", if outcome.restarted { "yes" } else { "no" });
  print_stat(
    "Pruned",
    &format!(
      "{} version(s), {}",
      outcome.pruned.stats.versions_deleted,
      format_bytes(outcome.pruned.stats.bytes_freed)
    ),
  );

  Ok(())
}
