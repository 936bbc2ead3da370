//! `opq check` specs
//!
//! Verify plan validation and serial order output.

use crate::prelude::*;

#[test]
fn check_prints_serial_order() {
    let temp = Project::empty();
    temp.file("plan.toml", MINIMAL_PLAN);
    temp.opq()
        .args(&["check", "plan.toml"])
        .passes()
        .stdout_eq("plan ok: 2 operations\n1. first\n2. second\n");
}

#[test]
fn check_orders_ready_operations_by_priority() {
    let temp = Project::empty();
    temp.file(
        "plan.toml",
        r#"
[[operation]]
name = "background"
priority = "very-low"

[[operation]]
name = "urgent"
priority = "very-high"

[[operation]]
name = "skip"
cancel = true
"#,
    );
    temp.opq()
        .args(&["check", "plan.toml"])
        .passes()
        .stdout_eq("plan ok: 3 operations\n1. urgent\n2. background\ncancelled: skip\n");
}

#[test]
fn check_rejects_cycles() {
    let temp = Project::empty();
    temp.file(
        "plan.toml",
        r#"
[[operation]]
name = "a"
depends_on = ["b"]

[[operation]]
name = "b"
depends_on = ["a"]
"#,
    );
    temp.opq()
        .args(&["check", "plan.toml"])
        .fails()
        .stderr_has("dependency cycle");
}

#[test]
fn check_rejects_unknown_dependency() {
    let temp = Project::empty();
    temp.file(
        "plan.toml",
        r#"
[[operation]]
name = "a"
depends_on = ["ghost"]
"#,
    );
    temp.opq()
        .args(&["check", "plan.toml"])
        .fails()
        .stderr_has("ghost");
}
