//! `opq run` specs
//!
//! Verify plans execute in dependency and priority order.

use crate::prelude::*;

#[test]
fn run_executes_dependencies_first() {
    let temp = Project::empty();
    temp.file("plan.toml", MINIMAL_PLAN);
    temp.opq().args(&["run", "plan.toml"]).passes().stdout_eq(
        "start first\nfinish first\nstart second\nfinish second\ndone: 2 finished, 0 failed\n",
    );
}

#[test]
fn run_with_single_slot_follows_priority() {
    let temp = Project::empty();
    temp.file(
        "plan.toml",
        r#"
[[operation]]
name = "low"
priority = "low"

[[operation]]
name = "high"
priority = "high"
"#,
    );
    temp.opq()
        .args(&["run", "plan.toml", "--max-concurrent", "1"])
        .passes()
        .stdout_eq("start high\nfinish high\nstart low\nfinish low\ndone: 2 finished, 0 failed\n");
}

#[test]
fn failed_operation_fails_the_run() {
    let temp = Project::empty();
    temp.file(
        "plan.toml",
        r#"
[queue]
max_concurrent_operations = 1

[[operation]]
name = "broken"
fail = true

[[operation]]
name = "after"
depends_on = ["broken"]
"#,
    );
    temp.opq()
        .args(&["run", "plan.toml"])
        .fails()
        .stdout_has("fail broken: failed on request")
        .stdout_has("finish after")
        .stdout_has("done: 1 finished, 1 failed")
        .stderr_has("1 operation(s) failed");
}

#[test]
fn cancelled_operation_is_reported() {
    let temp = Project::empty();
    temp.file(
        "plan.toml",
        r#"
[[operation]]
name = "skip"
cancel = true
"#,
    );
    temp.opq()
        .args(&["run", "plan.toml"])
        .passes()
        .stdout_eq("cancel skip\ndone: 0 finished, 0 failed\ncancelled: 1\n");
}

#[test]
fn sleeping_operations_complete() {
    let temp = Project::empty();
    temp.file(
        "plan.toml",
        r#"
[queue]
max_concurrent_operations = "unbounded"

[[operation]]
name = "a"
sleep_ms = 30

[[operation]]
name = "b"
sleep_ms = 30
"#,
    );
    temp.opq()
        .args(&["run", "plan.toml"])
        .passes()
        .stdout_has("finish a")
        .stdout_has("finish b")
        .stdout_has("done: 2 finished, 0 failed");
}

#[test]
fn debug_logging_goes_to_stderr() {
    let temp = Project::empty();
    temp.file("plan.toml", MINIMAL_PLAN);
    temp.opq()
        .args(&["--log-level", "debug", "run", "plan.toml"])
        .passes()
        .stdout_lacks("DEBUG")
        .stderr_has("running plan");
}
