use super::*;
use opq_core::MaxConcurrency;
use yare::parameterized;

fn names(order: &[&OperationSpec]) -> Vec<String> {
    order.iter().map(|s| s.name.clone()).collect()
}

#[test]
fn parses_full_plan() {
    let plan = Plan::parse(
        r#"
[queue]
name = "build"
max_concurrent_operations = 2

[[operation]]
name = "fetch"
priority = "high"
sleep_ms = 10

[[operation]]
name = "compile"
priority = -3
depends_on = ["fetch"]
fail = true

[[operation]]
name = "lint"
cancel = true
"#,
    )
    .unwrap();

    assert_eq!(plan.queue.name, "build");
    assert_eq!(plan.queue.max_concurrent_operations.as_limit(), Some(2));
    assert_eq!(plan.operations.len(), 3);

    let fetch = &plan.operations[0];
    assert_eq!(fetch.priority, QueuePriority::HIGH);
    assert_eq!(fetch.sleep_ms, 10);
    assert!(fetch.depends_on.is_empty());

    let compile = &plan.operations[1];
    assert_eq!(compile.priority, QueuePriority(-3));
    assert_eq!(compile.depends_on, vec!["fetch"]);
    assert!(compile.fail);

    assert!(plan.operations[2].cancel);
}

#[test]
fn empty_plan_uses_queue_defaults() {
    let plan = Plan::parse("").unwrap();
    assert_eq!(plan.queue, QueueConfig::default());
    assert!(plan.operations.is_empty());
    assert!(plan.serial_order().unwrap().is_empty());
}

#[test]
fn unbounded_keyword_is_accepted() {
    let plan = Plan::parse("[queue]\nmax_concurrent_operations = \"unbounded\"\n").unwrap();
    assert_eq!(plan.queue.max_concurrent_operations, MaxConcurrency::Unbounded);
}

#[parameterized(
    zero_concurrency = { "[queue]\nmax_concurrent_operations = 0\n" },
    unknown_priority = { "[[operation]]\nname = \"a\"\npriority = \"urgent\"\n" },
    unknown_field = { "[[operation]]\nname = \"a\"\nretries = 3\n" },
    missing_name = { "[[operation]]\nsleep_ms = 3\n" },
    unknown_section = { "[worker]\nname = \"w\"\n" },
)]
fn rejects_malformed_toml(content: &str) {
    assert!(matches!(Plan::parse(content), Err(PlanError::Toml(_))));
}

#[test]
fn rejects_empty_name() {
    let err = Plan::parse("[[operation]]\nname = \" \"\n").unwrap_err();
    assert!(matches!(err, PlanError::EmptyName));
}

#[test]
fn rejects_duplicate_names() {
    let err = Plan::parse("[[operation]]\nname = \"a\"\n[[operation]]\nname = \"a\"\n").unwrap_err();
    assert!(matches!(err, PlanError::DuplicateName(ref n) if n == "a"));
}

#[test]
fn rejects_unknown_dependency() {
    let err = Plan::parse("[[operation]]\nname = \"a\"\ndepends_on = [\"ghost\"]\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "operation a depends on unknown operation ghost"
    );
}

#[parameterized(
    self_loop = {
        "[[operation]]\nname = \"a\"\ndepends_on = [\"a\"]\n",
        &["a"],
    },
    pair = {
        "[[operation]]\nname = \"a\"\ndepends_on = [\"b\"]\n[[operation]]\nname = \"b\"\ndepends_on = [\"a\"]\n",
        &["a", "b"],
    },
    downstream_of_cycle = {
        "[[operation]]\nname = \"ok\"\n[[operation]]\nname = \"a\"\ndepends_on = [\"b\"]\n[[operation]]\nname = \"b\"\ndepends_on = [\"a\"]\n[[operation]]\nname = \"c\"\ndepends_on = [\"a\", \"ok\"]\n",
        &["a", "b", "c"],
    },
)]
fn rejects_cycles(content: &str, stuck: &[&str]) {
    match Plan::parse(content) {
        Err(PlanError::Cycle(names)) => assert_eq!(names, stuck),
        other => panic!("expected cycle, got {:?}", other),
    }
}

#[test]
fn cancelled_operation_breaks_cycle() {
    let plan = Plan::parse(
        "[[operation]]\nname = \"a\"\ndepends_on = [\"b\"]\n\
         [[operation]]\nname = \"b\"\ndepends_on = [\"a\"]\ncancel = true\n",
    )
    .unwrap();
    assert_eq!(names(&plan.serial_order().unwrap()), vec!["a"]);
}

#[test]
fn serial_order_ranks_ready_operations_by_priority() {
    let plan = Plan::parse(
        r#"
[[operation]]
name = "p5"
priority = 5
[[operation]]
name = "m2"
priority = -2
[[operation]]
name = "p8"
priority = 8
[[operation]]
name = "zero"
"#,
    )
    .unwrap();
    assert_eq!(
        names(&plan.serial_order().unwrap()),
        vec!["p8", "p5", "zero", "m2"]
    );
}

#[test]
fn serial_order_respects_dependencies() {
    let plan = Plan::parse(
        r#"
[[operation]]
name = "deploy"
priority = "very-high"
depends_on = ["test", "build"]
[[operation]]
name = "test"
depends_on = ["build"]
[[operation]]
name = "build"
priority = "low"
"#,
    )
    .unwrap();
    assert_eq!(
        names(&plan.serial_order().unwrap()),
        vec!["build", "test", "deploy"]
    );
}

#[test]
fn serial_order_reranks_after_each_completion() {
    // x becomes ready after a and outranks y by plan order at equal priority
    let plan = Plan::parse(
        r#"
[[operation]]
name = "x"
depends_on = ["a"]
[[operation]]
name = "y"
[[operation]]
name = "a"
priority = 1
"#,
    )
    .unwrap();
    assert_eq!(names(&plan.serial_order().unwrap()), vec!["a", "x", "y"]);
}

#[test]
fn duplicate_dependency_entries_count_once() {
    let plan = Plan::parse(
        "[[operation]]\nname = \"a\"\n[[operation]]\nname = \"b\"\ndepends_on = [\"a\", \"a\"]\n",
    )
    .unwrap();
    assert_eq!(names(&plan.serial_order().unwrap()), vec!["a", "b"]);
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");
    let err = Plan::load(&path).unwrap_err();
    assert!(matches!(err, PlanError::Io { .. }));
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.toml");
    std::fs::write(&path, "[[operation]]\nname = \"only\"\n").unwrap();
    let plan = Plan::load(&path).unwrap();
    assert_eq!(plan.operations[0].name, "only");
}
