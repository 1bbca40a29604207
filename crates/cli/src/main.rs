use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::OutputFormat;

/// Convergent artifact deployment: fetch, extract, symlink, retain.
#[derive(Parser)]
#[command(name = "ardeploy")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Output format
  #[arg(short, long, global = true, default_value = "text")]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the full deploy pipeline for a request file
  Deploy {
    /// Path to the deploy request (TOML)
    request: String,

    /// Redeploy even when version and manifest are unchanged
    #[arg(short, long)]
    force: bool,
  },

  /// Fetch the artifact into the cache without deploying
  Preseed {
    /// Path to the deploy request (TOML)
    request: String,
  },

  /// Delete previous releases beyond the retention count
  Prune {
    /// Path to the deploy request (TOML)
    request: String,

    /// Override the request's keep count
    #[arg(short, long)]
    keep: Option<usize>,

    /// Report what would be deleted without deleting
    #[arg(long)]
    dry_run: bool,
  },

  /// Show the current and previous versions of a deploy target
  Status {
    /// Path to the deploy request (TOML)
    request: String,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Deploy { request, force } => cmd::cmd_deploy(&request, force, cli.output),
    Commands::Preseed { request } => cmd::cmd_preseed(&request, cli.output),
    Commands::Prune { request, keep, dry_run } => cmd::cmd_prune(&request, keep, dry_run, cli.output),
    Commands::Status { request } => cmd::cmd_status(&request, cli.output),
  }
}
