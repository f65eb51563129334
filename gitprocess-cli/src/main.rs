//! gitprocess CLI - Azure DevOps branch management
//!
//! Clones a repository, checks the baseline branch for unmerged work, cuts a
//! new branch and copies the baseline's branch policies onto it.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gitprocess_azure::AzurePolicyCopier;
use gitprocess_core::{Config, Coordinator, LineConsole, Outcome, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// gitprocess: create a branch from develop with its branch policies
#[derive(Parser, Debug)]
#[command(name = "gitprocess")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Directory to clone the repository into
    #[arg(short = 'C', long, default_value = ".")]
    workdir: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with prompts
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load_with_overrides().context("Failed to load configuration")?;
    // An unusable secrets file only costs the policy copy its stored token
    let secrets = Secrets::load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring secrets file: {}", e);
        Secrets::default()
    });

    if cli.verbose {
        tracing::info!(
            baseline = %config.workflow.baseline_branch,
            remote = %config.workflow.remote,
            organization = ?config.azure.organization,
            project = ?config.azure.project,
            "Configuration loaded"
        );
    }

    println!("GitProcess - Azure DevOps Branch Management Tool");
    println!("===============================================");
    println!();

    let copier = AzurePolicyCopier::from_config(&config, &secrets);
    let mut console = LineConsole::stdio();

    let outcome = Coordinator::new(&mut console, &copier, config.workflow.clone())
        .with_workdir(&cli.workdir)
        .run()
        .await?;

    match outcome {
        Outcome::Completed { branch, policies } => {
            tracing::info!(
                branch = %branch,
                policies_copied = ?policies.as_ref().map(|p| p.copied()),
                policies_failed = ?policies.as_ref().map(|p| p.failed()),
                "Session complete"
            );
        }
        Outcome::Halted => {
            tracing::info!("Session halted before creating a branch");
        }
    }

    Ok(())
}
