// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! opq - run operation plans on a priority queue

mod commands;
mod completions;
mod plan;
mod runner;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, run};
use completions::CompletionsArgs;

#[derive(Parser)]
#[command(
    name = "opq",
    version,
    about = "Operation queue - run dependent, prioritized work with bounded concurrency"
)]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. "debug" or "opq_engine=trace"
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a plan
    Run(run::RunArgs),
    /// Validate a plan and print its serial order
    Check(check::CheckArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Run(args) => run::run(args).await,
        Commands::Check(args) => check::check(args),
        Commands::Completions(args) => {
            completions::generate_completions::<Cli>(args.shell);
            Ok(())
        }
    }
}

fn setup_logging(level: Option<&str>) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    // Logs go to stderr so run output stays parseable
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}
