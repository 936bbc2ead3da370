//! CLI error specs

use crate::prelude::*;

#[test]
fn missing_plan_file_fails() {
    let temp = Project::empty();
    temp.opq()
        .args(&["run", "nope.toml"])
        .fails()
        .stderr_has("nope.toml");
}

#[test]
fn zero_concurrency_override_is_rejected() {
    let temp = Project::empty();
    temp.file("plan.toml", MINIMAL_PLAN);
    temp.opq()
        .args(&["run", "plan.toml", "--max-concurrent", "0"])
        .fails();
}

#[test]
fn unknown_subcommand_fails() {
    let temp = Project::empty();
    temp.opq().args(&["frobnicate"]).fails();
}
