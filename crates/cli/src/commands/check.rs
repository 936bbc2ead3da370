// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `opq check <plan>` - Validate a plan without running it

use crate::plan::Plan;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckArgs {
    /// Plan file (TOML)
    pub plan: PathBuf,
}

pub fn check(args: CheckArgs) -> Result<()> {
    let plan = Plan::load(&args.plan)?;
    let order = plan.serial_order()?;

    println!("plan ok: {} operations", plan.operations.len());
    for (i, spec) in order.iter().enumerate() {
        println!("{}. {}", i + 1, spec.name);
    }
    for spec in plan.operations.iter().filter(|s| s.cancel) {
        println!("cancelled: {}", spec.name);
    }
    Ok(())
}
