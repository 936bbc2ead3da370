//! Help and completion specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    let temp = Project::empty();
    temp.opq()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("check")
        .stdout_has("completions");
}

#[test]
fn run_help_documents_overrides() {
    let temp = Project::empty();
    temp.opq()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--max-concurrent")
        .stdout_has("--name");
}

#[test]
fn completions_name_the_binary() {
    let temp = Project::empty();
    temp.opq()
        .args(&["completions", "bash"])
        .passes()
        .stdout_has("opq");
}
