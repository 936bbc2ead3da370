// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `opq run <plan>` - Execute a plan on an operation queue

use crate::plan::Plan;
use crate::runner::run_plan;
use anyhow::{bail, Result};
use clap::Args;
use opq_core::MaxConcurrency;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args)]
pub struct RunArgs {
    /// Plan file (TOML)
    pub plan: PathBuf,

    /// Override the plan's concurrency limit
    #[arg(long, value_name = "N|unbounded")]
    pub max_concurrent: Option<MaxConcurrency>,

    /// Override the plan's queue name
    #[arg(long)]
    pub name: Option<String>,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let plan = Plan::load(&args.plan)?;
    let mut config = plan.queue.clone();
    if let Some(max) = args.max_concurrent {
        config = config.with_max_concurrency(max);
    }
    if let Some(name) = args.name {
        config.name = name;
    }
    tracing::info!(
        plan = %args.plan.display(),
        queue = %config.name,
        operations = plan.operations.len(),
        "running plan"
    );

    // A failed signal handler install must not end the run early
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let mut stdout = std::io::stdout().lock();
    let summary = run_plan(&plan, config, interrupt, &mut stdout).await?;
    writeln!(stdout, "{}", summary)?;
    if summary.cancelled > 0 {
        writeln!(stdout, "cancelled: {}", summary.cancelled)?;
    }

    if summary.failed > 0 {
        bail!("{} operation(s) failed", summary.failed);
    }
    Ok(())
}
