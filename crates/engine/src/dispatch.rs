// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission pass
//!
//! One pass over a queue's owned operations:
//!
//! 1. finished operations are set aside for removal;
//! 2. executing operations are counted against the concurrency cap;
//! 3. the remaining ready operations form the candidate list, kept in
//!    descending priority order by binary-search insertion (equal priorities
//!    keep insertion order);
//! 4. candidates are admitted from the front while the cap leaves room.
//!
//! Admitted operations are started by the dispatcher task in admission
//! order; their bodies then run on the blocking pool.

use opq_core::{insert_by_priority, panic_message, MaxConcurrency, Operation, OperationId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Outcome of one admission pass
pub(crate) struct Admission {
    /// Owned operations that already finished
    pub finished: Vec<OperationId>,
    /// Operations to start, highest priority first
    pub admitted: Vec<Arc<dyn Operation>>,
    /// Operations executing when the pass began
    pub running: usize,
}

/// Select the operations to admit from `owned`, in insertion order
pub(crate) fn select(owned: &[Arc<dyn Operation>], max: MaxConcurrency) -> Admission {
    let mut finished = Vec::new();
    let mut candidates: Vec<Arc<dyn Operation>> = Vec::new();
    let mut running = 0;

    for op in owned {
        if op.is_finished() {
            finished.push(op.id());
        } else if op.is_executing() {
            running += 1;
        } else if op.is_ready() {
            insert_by_priority(&mut candidates, Arc::clone(op), |o| o.queue_priority());
        }
    }

    let room = match max.as_limit() {
        Some(limit) => limit.saturating_sub(running),
        None => candidates.len(),
    };
    candidates.truncate(room);

    Admission {
        finished,
        admitted: candidates,
        running,
    }
}

/// What happened when an admitted operation was handed its turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Begin {
    /// Marked executing; its body still has to run
    Started,
    /// A suspended operation picked up where it left off
    Resumed,
    /// Dependencies changed since selection; try again on a later pass
    NotReady,
    /// Finished, cancelled or started elsewhere since selection
    Skipped,
}

/// Give an admitted operation its turn: resume it if suspended, otherwise
/// mark it executing. Readiness is checked again first.
///
/// A panic raised while starting leaves the operation finished.
pub(crate) fn begin(op: &Arc<dyn Operation>) -> Begin {
    match panic::catch_unwind(AssertUnwindSafe(|| begin_unguarded(op))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            tracing::error!(operation = %op.id(), panic = %panic_message(&*payload), "operation panicked while starting");
            finish_quietly(op);
            Begin::Skipped
        }
    }
}

fn begin_unguarded(op: &Arc<dyn Operation>) -> Begin {
    if !op.is_ready() {
        return Begin::NotReady;
    }
    if op.is_suspended() {
        op.resume();
        return Begin::Resumed;
    }
    match op.core().begin_execution() {
        Ok(()) => Begin::Started,
        Err(e) => {
            tracing::debug!(operation = %op.id(), error = %e, "admitted operation not started");
            Begin::Skipped
        }
    }
}

/// Run the body of an operation marked executing by [`begin`].
///
/// Errors and panics are logged and never escape; a panicking body leaves
/// the operation finished.
pub(crate) fn execute(op: &Arc<dyn Operation>) {
    let id = op.id();
    match panic::catch_unwind(AssertUnwindSafe(|| op.execute())) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(operation = %id, error = %e, "dispatched operation failed");
        }
        Err(payload) => {
            tracing::error!(operation = %id, panic = %panic_message(&*payload), "dispatched operation panicked");
            finish_quietly(op);
        }
    }
}

/// Finish `op`, swallowing a second panic from its listeners
fn finish_quietly(op: &Arc<dyn Operation>) {
    if panic::catch_unwind(AssertUnwindSafe(|| op.finish())).is_err() {
        tracing::error!(operation = %op.id(), "operation panicked while finishing");
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
