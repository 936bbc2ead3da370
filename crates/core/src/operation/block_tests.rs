use super::*;
use std::sync::{Arc, Mutex};

fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> SyncBlock) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let make = move |label: &'static str| {
        let sink = Arc::clone(&sink);
        Block::from_fn(move |_: &BlockOperation| sink.lock().unwrap().push(label))
    };
    (log, make)
}

#[test]
fn runs_blocks_in_order_and_finishes() {
    let (log, block) = recorder();
    let op = BlockOperation::with_block(block("first"));
    op.add_execution_block(block("second")).unwrap();
    op.add_execution_block(block("third")).unwrap();

    op.start().unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    assert!(op.is_finished());
    assert!(!op.is_executing());
}

#[test]
fn empty_operation_finishes() {
    let op = BlockOperation::new();
    op.start().unwrap();
    assert!(op.is_finished());
}

#[test]
fn is_not_concurrent() {
    assert!(!BlockOperation::new().is_concurrent());
}

#[test]
fn from_fn_sees_itself_executing() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let op = BlockOperation::from_fn(move |op| {
        *sink.lock().unwrap() = Some(op.is_executing());
    });

    op.start().unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(true));
}

#[test]
fn add_block_after_start_fails() {
    let op = BlockOperation::new();
    op.start().unwrap();

    let err = op
        .add_execution_block(Block::from_fn(|_: &BlockOperation| {}))
        .unwrap_err();

    assert!(err.is_invalid_state());
    assert!(op.execution_blocks().is_empty());
}

#[test]
fn failing_block_stops_sequence_and_finishes() {
    let (log, block) = recorder();
    let op = BlockOperation::with_block(block("first"));
    op.add_execution_block(Block::new(|_: &BlockOperation, _: &SyncBlock| {
        Err("disk full".into())
    }))
    .unwrap();
    op.add_execution_block(block("never")).unwrap();

    let err = op.start().unwrap_err();

    assert!(matches!(err, OperationError::Block(_)));
    assert_eq!(*log.lock().unwrap(), vec!["first"]);
    assert!(op.is_finished());
}

#[test]
fn block_reads_its_own_context() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let block: SyncBlock = Block::new(move |_: &BlockOperation, me: &SyncBlock| {
        *sink.lock().unwrap() = me.context_value("path");
        Ok(())
    });
    block.set_context_value("path", "/tmp/out");
    let op = BlockOperation::with_block(block);

    op.start().unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        Some(serde_json::Value::from("/tmp/out"))
    );
}

#[test]
fn execution_block_is_first() {
    let (_, block) = recorder();
    let first = block("a");
    let op = BlockOperation::with_block(first.clone());
    op.add_execution_block(block("b")).unwrap();

    assert!(op.execution_block().unwrap().ptr_eq(&first));
    assert_eq!(op.execution_blocks().len(), 2);
    assert!(BlockOperation::new().execution_block().is_none());
}

#[test]
fn cancelled_before_start_never_runs() {
    let (log, block) = recorder();
    let op = BlockOperation::with_block(block("body"));

    op.cancel();

    assert!(op.is_finished());
    assert!(op.start().unwrap_err().is_invalid_state());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn context_is_first_block_context() {
    let op = BlockOperation::new();
    assert!(op.context().is_none());

    let (_, block) = recorder();
    let first = block("first");
    first.set_context_value("target", "release");
    op.add_execution_block(first).unwrap();
    let second = block("second");
    second.set_context_value("target", "debug");
    op.add_execution_block(second).unwrap();

    let context = op.context().unwrap();
    assert_eq!(context.get("target"), Some(&serde_json::json!("release")));
}
