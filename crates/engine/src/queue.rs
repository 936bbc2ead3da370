// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation queue
//!
//! A queue owns the operations added to it until they finish. It listens to
//! each operation's `executing` and `finished` changes, and to `finished` on
//! each of its dependencies, and answers every change with a wake-up of its
//! dispatcher task. The dispatcher coalesces back-to-back wake-ups into a
//! single admission pass (see `dispatch`).
//!
//! Lock order is queue before operation. The queue lock is never held while
//! an operation is mutated, since mutations notify listeners that take the
//! queue lock themselves.

use crate::dispatch::{self, Begin};
use crate::error::QueueError;
use crate::events::QueueChange;
use opq_core::{
    BlockOperation, EventPattern, ListenerId, MaxConcurrency, Observed, Operation,
    OperationChange, OperationHandle, OperationId, OperationProperty, PropertyBus, QueueConfig,
    SyncBlock,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Notify};

/// An owned operation and the listeners the queue registered for it
struct Entry {
    op: Arc<dyn Operation>,
    listeners: Vec<ListenerId>,
    dependency_listeners: Vec<(OperationHandle, ListenerId)>,
}

impl Entry {
    /// Release every listener and hand back the operation
    fn detach(self) -> Arc<dyn Operation> {
        for id in self.listeners {
            self.op.core().unsubscribe(id);
        }
        for (dependency, id) in self.dependency_listeners {
            dependency.unsubscribe(id);
        }
        self.op
    }
}

struct QueueState {
    name: Observed<String>,
    max_concurrency: Observed<MaxConcurrency>,
    suspended: Observed<bool>,
    /// Owned operations in insertion order
    entries: Vec<Entry>,
}

struct QueueShared {
    state: Mutex<QueueState>,
    bus: PropertyBus<QueueChange>,
    /// Signalled whenever the owned set becomes empty
    idle: Notify,
    wake: mpsc::UnboundedSender<()>,
}

impl QueueShared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Request an admission pass
    fn wake(&self) {
        // Fails only once the dispatcher is gone, i.e. while the queue drops
        let _ = self.wake.send(());
    }

    fn name(&self) -> String {
        self.lock().name.get().clone()
    }

    fn is_suspended(&self) -> bool {
        self.lock().suspended.value()
    }

    fn snapshot(&self) -> Vec<Arc<dyn Operation>> {
        self.lock()
            .entries
            .iter()
            .map(|e| Arc::clone(&e.op))
            .collect()
    }

    fn on_operation_change(&self, change: &OperationChange) {
        if change.property == OperationProperty::Finished {
            self.detach(&[change.operation]);
        }
        self.wake();
    }

    /// Remove the entries for `ids` and release their listeners
    fn detach(&self, ids: &[OperationId]) -> Vec<Arc<dyn Operation>> {
        let (removed, now_empty) = {
            let mut st = self.lock();
            let (removed, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut st.entries)
                .into_iter()
                .partition(|e| ids.contains(&e.op.id()));
            st.entries = kept;
            (removed, st.entries.is_empty())
        };
        if removed.is_empty() {
            return Vec::new();
        }

        let ops: Vec<Arc<dyn Operation>> = removed.into_iter().map(Entry::detach).collect();
        for op in &ops {
            tracing::debug!(operation = %op.id(), "operation left queue");
        }
        if now_empty {
            self.idle.notify_waiters();
        }
        ops
    }

    /// One admission pass. Only the dispatcher task calls this, so passes
    /// never overlap.
    fn dispatch(self: &Arc<Self>) {
        if self.is_suspended() {
            return;
        }
        let (owned, max, name) = {
            let st = self.lock();
            let owned: Vec<Arc<dyn Operation>> =
                st.entries.iter().map(|e| Arc::clone(&e.op)).collect();
            (owned, st.max_concurrency.value(), st.name.get().clone())
        };

        let admission = dispatch::select(&owned, max);
        if !admission.finished.is_empty() {
            self.detach(&admission.finished);
        }
        tracing::trace!(
            queue = %name,
            running = admission.running,
            admitted = admission.admitted.len(),
            "admission pass"
        );

        for op in admission.admitted {
            if self.is_suspended() {
                break;
            }
            match dispatch::begin(&op) {
                Begin::Started => {
                    tracing::debug!(queue = %name, operation = %op.id(), priority = %op.queue_priority(), "operation admitted");
                    self.hold_if_suspended(&op);
                    self.run_body(op);
                }
                Begin::Resumed => {
                    tracing::debug!(queue = %name, operation = %op.id(), "operation resumed by queue");
                    self.hold_if_suspended(&op);
                }
                Begin::NotReady => {
                    tracing::debug!(queue = %name, operation = %op.id(), "operation no longer ready");
                    self.wake();
                }
                Begin::Skipped => {}
            }
        }
    }

    /// A suspension that landed between the pass's check and `begin` missed
    /// `op` in its snapshot
    fn hold_if_suspended(&self, op: &Arc<dyn Operation>) {
        if self.is_suspended() && op.is_executing() {
            op.suspend();
        }
    }

    /// Run `op`'s body on the blocking pool, then request a pass whether or
    /// not its notifications got through
    fn run_body(self: &Arc<Self>, op: Arc<dyn Operation>) {
        let queue = Arc::downgrade(self);
        tokio::spawn(async move {
            let id = op.id();
            if let Err(e) = tokio::task::spawn_blocking(move || dispatch::execute(&op)).await {
                tracing::error!(operation = %id, error = %e, "operation body task failed");
            }
            if let Some(shared) = queue.upgrade() {
                shared.wake();
            }
        });
    }
}

impl Drop for QueueShared {
    fn drop(&mut self) {
        let st = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        for entry in std::mem::take(&mut st.entries) {
            entry.detach();
        }
    }
}

/// Dispatcher task: one admission pass per burst of wake-ups. Exits once the
/// queue is dropped.
async fn run_dispatcher(queue: Weak<QueueShared>, mut wake: mpsc::UnboundedReceiver<()>) {
    while wake.recv().await.is_some() {
        tokio::task::yield_now().await;
        while wake.try_recv().is_ok() {}

        let Some(shared) = queue.upgrade() else {
            break;
        };
        shared.dispatch();
    }
}

/// Runs operations as their dependencies finish, highest priority first,
/// with at most `max_concurrent_operation_count` executing at once.
pub struct OperationQueue {
    shared: Arc<QueueShared>,
}

impl OperationQueue {
    /// Create a queue on the current tokio runtime.
    ///
    /// Fails with [`QueueError::NoRuntime`] outside a runtime.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        let handle = Handle::try_current().map_err(|_| QueueError::NoRuntime)?;
        Ok(Self::with_handle(config, &handle))
    }

    /// Create a queue whose dispatcher runs on `handle`
    pub fn with_handle(config: QueueConfig, handle: &Handle) -> Self {
        let (wake, wake_rx) = mpsc::unbounded_channel();
        tracing::debug!(
            queue = %config.name,
            max = %config.max_concurrent_operations,
            suspended = config.suspended,
            "operation queue created"
        );
        let shared = Arc::new(QueueShared {
            state: Mutex::new(QueueState {
                name: Observed::new(config.name),
                max_concurrency: Observed::new(config.max_concurrent_operations),
                suspended: Observed::new(config.suspended),
                entries: Vec::new(),
            }),
            bus: PropertyBus::new(),
            idle: Notify::new(),
            wake,
        });
        handle.spawn(run_dispatcher(Arc::downgrade(&shared), wake_rx));
        Self { shared }
    }

    // ── Managing operations ─────────────────────────────────────────────

    /// Add one operation and return it
    pub fn add_operation<O: Operation>(&self, op: Arc<O>) -> Arc<O> {
        let dyn_op: Arc<dyn Operation> = op.clone();
        self.add_operations([dyn_op]);
        op
    }

    /// Add a batch of operations; a single admission pass covers all of them
    pub fn add_operations(&self, ops: impl IntoIterator<Item = Arc<dyn Operation>>) {
        let mut added = 0;
        for op in ops {
            if self.attach(op) {
                added += 1;
            }
        }
        if added > 0 {
            self.shared.wake();
        }
    }

    /// Wrap `block` in a [`BlockOperation`] and add it
    pub fn add_operation_with_block(&self, block: SyncBlock) -> Arc<BlockOperation> {
        self.add_operation(Arc::new(BlockOperation::with_block(block)))
    }

    /// Wrap a closure in a [`BlockOperation`] and add it
    pub fn add_operation_with_fn(
        &self,
        func: impl Fn(&BlockOperation) + Send + Sync + 'static,
    ) -> Arc<BlockOperation> {
        self.add_operation(Arc::new(BlockOperation::from_fn(func)))
    }

    fn attach(&self, op: Arc<dyn Operation>) -> bool {
        if op.is_finished() {
            tracing::debug!(queue = %self.name(), operation = %op.id(), "finished operation not added");
            return false;
        }
        let weak = Arc::downgrade(&self.shared);

        let listeners = [OperationProperty::Executing, OperationProperty::Finished]
            .into_iter()
            .map(|property| {
                let weak = weak.clone();
                op.core()
                    .subscribe(property.name(), move |change: &OperationChange| {
                        if let Some(shared) = weak.upgrade() {
                            shared.on_operation_change(change);
                        }
                    })
            })
            .collect();

        let dependency_listeners = op
            .dependencies()
            .into_iter()
            .filter_map(|dependency| {
                let weak = weak.clone();
                let id = dependency.subscribe(
                    OperationProperty::Finished.name(),
                    move |_: &OperationChange| {
                        if let Some(shared) = weak.upgrade() {
                            shared.wake();
                        }
                    },
                )?;
                Some((dependency, id))
            })
            .collect();

        let entry = Entry {
            op,
            listeners,
            dependency_listeners,
        };
        let id = entry.op.id();
        let rejected = {
            let mut st = self.shared.lock();
            if st.entries.iter().any(|e| e.op.id() == id) {
                Some(entry)
            } else {
                st.entries.push(entry);
                None
            }
        };

        match rejected {
            Some(entry) => {
                tracing::warn!(operation = %id, "operation is already in this queue");
                entry.detach();
                false
            }
            None => {
                tracing::debug!(queue = %self.name(), operation = %id, "operation added");
                true
            }
        }
    }

    /// Stop owning an operation without cancelling it. Returns the operation
    /// if it was in the queue.
    pub fn remove_operation(&self, id: OperationId) -> Option<Arc<dyn Operation>> {
        let removed = self.shared.detach(&[id]).pop();
        if removed.is_some() {
            self.shared.wake();
        }
        removed
    }

    /// Cancel every owned operation. Operations that have not started finish
    /// immediately; executing ones are asked to stop.
    pub fn cancel_all_operations(&self) {
        let owned = self.shared.snapshot();
        tracing::info!(queue = %self.name(), count = owned.len(), "cancelling all operations");
        for op in owned {
            op.cancel();
        }
    }

    /// Snapshot of the owned operations, in insertion order
    pub fn operations(&self) -> Vec<Arc<dyn Operation>> {
        self.shared.snapshot()
    }

    pub fn operation_count(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Wait until the queue owns no operations.
    ///
    /// Returns immediately for an empty queue; never returns while an owned
    /// operation stays unfinished.
    pub async fn wait_until_all_operations_are_finished(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.operation_count() == 0 {
                return;
            }
            notified.await;
        }
    }

    // ── Settings ────────────────────────────────────────────────────────

    pub fn max_concurrent_operation_count(&self) -> MaxConcurrency {
        self.shared.lock().max_concurrency.value()
    }

    pub fn set_max_concurrent_operation_count(&self, max: MaxConcurrency) {
        let changed = self.shared.lock().max_concurrency.set(max);
        if changed {
            tracing::debug!(queue = %self.name(), max = %max, "max concurrency changed");
            self.shared.bus.emit(&QueueChange::max_concurrency(max));
            self.shared.wake();
        }
    }

    /// Set a numeric cap. Zero is rejected.
    pub fn set_max_concurrent_operations(&self, count: usize) -> Result<(), QueueError> {
        self.set_max_concurrent_operation_count(MaxConcurrency::limited(count)?);
        Ok(())
    }

    pub fn name(&self) -> String {
        self.shared.name()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        let changed = self.shared.lock().name.set(name.clone());
        if changed {
            self.shared.bus.emit(&QueueChange::renamed(&name));
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.shared.is_suspended()
    }

    /// Suspend the queue
    pub fn suspend(&self) {
        self.set_suspended(true);
    }

    /// Suspending stops admissions and suspends every executing owned
    /// operation. Resuming resumes every suspended owned operation, then
    /// admissions continue.
    pub fn set_suspended(&self, suspended: bool) {
        let name = self.name();
        if suspended {
            if !self.shared.lock().suspended.set(true) {
                return;
            }
            tracing::info!(queue = %name, "queue suspended");
            for op in self.shared.snapshot() {
                if op.is_executing() {
                    op.suspend();
                }
            }
        } else {
            if !self.shared.is_suspended() {
                return;
            }
            // Resume while still flagged so no pass admits past the cap
            for op in self.shared.snapshot() {
                if op.is_suspended() {
                    op.resume();
                }
            }
            if !self.shared.lock().suspended.set(false) {
                return;
            }
            tracing::info!(queue = %name, "queue resumed");
        }
        self.shared.bus.emit(&QueueChange::suspended(suspended));
        self.shared.wake();
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Listen for queue property changes whose name matches `pattern`
    pub fn subscribe(
        &self,
        pattern: impl Into<EventPattern>,
        listener: impl Fn(&QueueChange) + Send + Sync + 'static,
    ) -> ListenerId {
        self.shared.bus.subscribe(pattern, listener)
    }

    pub fn unsubscribe(&self, listener: ListenerId) -> bool {
        self.shared.bus.unsubscribe(listener)
    }
}

impl fmt::Debug for OperationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.shared.lock();
        f.debug_struct("OperationQueue")
            .field("name", st.name.get())
            .field("max_concurrency", &st.max_concurrency.value())
            .field("suspended", &st.suspended.value())
            .field("operations", &st.entries.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
