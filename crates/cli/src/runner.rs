// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan execution
//!
//! Every plan entry becomes one operation: a `BlockOperation` when it does
//! no simulated work, an `AsyncBlockOperation` whose block arms a timer and
//! advances from the timer task otherwise. Lifecycle changes are reported
//! over a channel and printed by the caller as they arrive.

use crate::plan::{OperationSpec, Plan};
use opq_core::{
    AsyncBlock, AsyncBlockOperation, Block, BlockOperation, Operation, OperationChange,
    QueueConfig, SyncBlock,
};
use opq_engine::OperationQueue;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::io::Write;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;

/// Block context key holding the reason an operation failed
const ERROR_KEY: &str = "error";

const REQUESTED_FAILURE: &str = "failed on request";

/// One line of run output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Started(String),
    Finished(String),
    Cancelled(String),
    Failed { name: String, reason: String },
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Started(name) => write!(f, "start {}", name),
            Report::Finished(name) => write!(f, "finish {}", name),
            Report::Cancelled(name) => write!(f, "cancel {}", name),
            Report::Failed { name, reason } => write!(f, "fail {}: {}", name, reason),
        }
    }
}

/// Outcome counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub finished: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl Summary {
    pub fn record(&mut self, report: &Report) {
        match report {
            Report::Started(_) => {}
            Report::Finished(_) => self.finished += 1,
            Report::Cancelled(_) => self.cancelled += 1,
            Report::Failed { .. } => self.failed += 1,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "done: {} finished, {} failed", self.finished, self.failed)
    }
}

fn recorded_failure<T: ?Sized>(block: &Block<T>) -> Option<String> {
    block
        .context_value(ERROR_KEY)
        .and_then(|v| v.as_str().map(str::to_string))
}

/// Operation for an entry with no simulated work
fn immediate(spec: &OperationSpec) -> (
    Arc<dyn Operation>,
    impl Fn() -> Option<String> + Send + Sync + 'static,
) {
    let fail = spec.fail;
    let block: SyncBlock = Block::new(move |_: &BlockOperation, me: &SyncBlock| {
        if fail {
            me.set_context_value(ERROR_KEY, REQUESTED_FAILURE);
            return Err(REQUESTED_FAILURE.into());
        }
        Ok(())
    });
    let failure = {
        let block = block.clone();
        move || recorded_failure(&block)
    };
    let op: Arc<dyn Operation> = Arc::new(BlockOperation::with_block(block));
    (op, failure)
}

/// Operation for an entry that sleeps before completing
fn delayed(spec: &OperationSpec) -> (
    Arc<dyn Operation>,
    impl Fn() -> Option<String> + Send + Sync + 'static,
) {
    let delay = Duration::from_millis(spec.sleep_ms);
    let fail = spec.fail;
    let op = Arc::new_cyclic(|weak: &Weak<AsyncBlockOperation>| {
        let weak = weak.clone();
        let block: AsyncBlock = Block::new(move |_: &AsyncBlockOperation, me: &AsyncBlock| {
            let weak = weak.clone();
            let me = me.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let Some(op) = weak.upgrade() else {
                    return;
                };
                if op.is_cancelled() {
                    op.finish();
                } else if fail {
                    me.set_context_value(ERROR_KEY, REQUESTED_FAILURE);
                    op.finish();
                } else if let Err(e) = op.next() {
                    tracing::warn!(operation = %op.id(), error = %e, "could not advance");
                }
            });
            Ok(())
        });
        let op = AsyncBlockOperation::with_block(block);
        op.core()
            .set_cancellation_block(Some(Block::from_fn(|core: &opq_core::OperationCore| {
                core.finish()
            })));
        op
    });
    let failure = {
        let weak = Arc::downgrade(&op);
        move || recorded_failure(&weak.upgrade()?.execution_block()?)
    };
    let op: Arc<dyn Operation> = op;
    (op, failure)
}

/// Report `op`'s start and completion as `name`
fn watch(
    op: &Arc<dyn Operation>,
    name: &str,
    failure: impl Fn() -> Option<String> + Send + Sync + 'static,
    reports: &mpsc::UnboundedSender<Report>,
) {
    let tx = reports.clone();
    let started = name.to_string();
    op.core()
        .subscribe("operation:executing", move |change: &OperationChange| {
            if change.value.as_bool() == Some(true) {
                let _ = tx.send(Report::Started(started.clone()));
            }
        });

    let tx = reports.clone();
    let name = name.to_string();
    let weak = Arc::downgrade(op);
    op.core()
        .subscribe("operation:finished", move |_: &OperationChange| {
            let cancelled = weak.upgrade().is_some_and(|op| op.is_cancelled());
            let report = if cancelled {
                Report::Cancelled(name.clone())
            } else if let Some(reason) = failure() {
                Report::Failed {
                    name: name.clone(),
                    reason,
                }
            } else {
                Report::Finished(name.clone())
            };
            let _ = tx.send(report);
        });
}

/// Build one watched operation per plan entry, in plan order, with
/// priorities and dependencies applied. Entries marked `cancel` come back
/// already cancelled.
pub fn build_operations(
    plan: &Plan,
    reports: &mpsc::UnboundedSender<Report>,
) -> Vec<Arc<dyn Operation>> {
    let mut by_name: HashMap<&str, Arc<dyn Operation>> = HashMap::new();
    let mut ops = Vec::with_capacity(plan.operations.len());

    for spec in &plan.operations {
        let op = if spec.sleep_ms > 0 {
            let (op, failure) = delayed(spec);
            watch(&op, &spec.name, failure, reports);
            op
        } else {
            let (op, failure) = immediate(spec);
            watch(&op, &spec.name, failure, reports);
            op
        };
        op.set_queue_priority(spec.priority);
        tracing::debug!(operation = %op.id(), name = %spec.name, "built operation");
        by_name.insert(spec.name.as_str(), Arc::clone(&op));
        ops.push(op);
    }

    for (spec, op) in plan.operations.iter().zip(&ops) {
        for dependency in &spec.depends_on {
            if let Some(dep) = by_name.get(dependency.as_str()) {
                op.add_dependency(&**dep);
            }
        }
    }

    for (spec, op) in plan.operations.iter().zip(&ops) {
        if spec.cancel {
            op.cancel();
        }
    }
    ops
}

/// Run `plan` on a fresh queue, writing one line per report to `out`.
///
/// Resolving `interrupt` cancels everything still owned by the queue; the
/// run then ends once cancelled operations have wound down.
pub async fn run_plan(
    plan: &Plan,
    config: QueueConfig,
    interrupt: impl Future<Output = ()>,
    out: &mut impl Write,
) -> anyhow::Result<Summary> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ops = build_operations(plan, &tx);
    drop(tx);

    // Add everything before the first pass so admission sees the whole plan
    let queue = OperationQueue::new(config.with_suspended(true))?;
    queue.add_operations(ops);
    queue.set_suspended(false);

    let mut summary = Summary::default();
    let wait = queue.wait_until_all_operations_are_finished();
    tokio::pin!(wait);
    tokio::pin!(interrupt);
    let mut interrupted = false;

    loop {
        tokio::select! {
            biased;
            Some(report) = rx.recv() => {
                writeln!(out, "{}", report)?;
                summary.record(&report);
            }
            _ = &mut interrupt, if !interrupted => {
                interrupted = true;
                tracing::warn!(queue = %queue.name(), "interrupted, cancelling remaining operations");
                queue.cancel_all_operations();
            }
            _ = &mut wait => break,
        }
    }
    while let Ok(report) = rx.try_recv() {
        writeln!(out, "{}", report)?;
        summary.record(&report);
    }
    Ok(summary)
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
