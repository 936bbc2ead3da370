// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation lifecycle state machine
//!
//! `OperationCore` owns the lifecycle flags, dependency set, lifecycle
//! callbacks and property bus of one operation. Every transition updates the
//! flags under the lock, releases it, then runs callbacks and emits the
//! changed property names, so listeners observe settled state and may call
//! back into the operation.
//!
//! States: Pending -> Executing -> Finished, with Executing <-> Suspended and
//! cancellation finishing a non-executing operation immediately. Finished is
//! absorbing.

use crate::block::Block;
use crate::error::OperationError;
use crate::events::{
    panic_message, EventPattern, Observed, OperationChange, OperationProperty, PropertyBus,
    PropertyValue,
};
use crate::id::{ListenerId, OperationId};
use crate::priority::QueuePriority;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Callback fired on a lifecycle transition
pub type LifecycleBlock = Block<OperationCore>;

/// Coarse lifecycle position derived from the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Pending,
    Executing,
    Suspended,
    /// Cancelled while executing; the operation's own work must finish it
    CancelledPendingFinish,
    Finished,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Finished)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationState::Pending => "pending",
            OperationState::Executing => "executing",
            OperationState::Suspended => "suspended",
            OperationState::CancelledPendingFinish => "cancelled",
            OperationState::Finished => "finished",
        };
        write!(f, "{}", s)
    }
}

#[derive(Default)]
struct Callbacks {
    completion: Option<LifecycleBlock>,
    suspension: Option<LifecycleBlock>,
    resumption: Option<LifecycleBlock>,
    cancellation: Option<LifecycleBlock>,
}

#[derive(Default)]
struct State {
    executing: Observed<bool>,
    finished: Observed<bool>,
    suspended: Observed<bool>,
    cancelled: Observed<bool>,
    priority: Observed<QueuePriority>,
    dependencies: Vec<OperationHandle>,
    callbacks: Callbacks,
}

struct Shared {
    id: OperationId,
    state: Mutex<State>,
    bus: PropertyBus<OperationChange>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Non-owning reference to an operation, by identity.
///
/// Used for dependency sets: holding a handle never keeps the operation
/// alive. A handle whose operation has been dropped reports finished, since
/// nothing can run it any more.
#[derive(Clone)]
pub struct OperationHandle {
    id: OperationId,
    shared: Weak<Shared>,
}

impl OperationHandle {
    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        match self.shared.upgrade() {
            Some(shared) => shared.lock().finished.value(),
            None => true,
        }
    }

    /// Whether the referenced operation still exists
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    /// Subscribe to the referenced operation's property changes
    pub fn subscribe(
        &self,
        pattern: impl Into<EventPattern>,
        listener: impl Fn(&OperationChange) + Send + Sync + 'static,
    ) -> Option<ListenerId> {
        self.shared
            .upgrade()
            .map(|shared| shared.bus.subscribe(pattern, listener))
    }

    pub fn unsubscribe(&self, listener: ListenerId) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.bus.unsubscribe(listener))
    }
}

impl fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Lifecycle state shared by every operation variant
pub struct OperationCore {
    shared: Arc<Shared>,
}

impl OperationCore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                id: OperationId::next(),
                state: Mutex::new(State::default()),
                bus: PropertyBus::new(),
            }),
        }
    }

    pub fn with_priority(priority: QueuePriority) -> Self {
        let core = Self::new();
        core.shared.lock().priority = Observed::new(priority);
        core
    }

    pub fn id(&self) -> OperationId {
        self.shared.id
    }

    /// Weak, identity-only reference to this operation
    pub fn handle(&self) -> OperationHandle {
        OperationHandle {
            id: self.shared.id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    // ── Status ──────────────────────────────────────────────────────────

    pub fn is_executing(&self) -> bool {
        self.shared.lock().executing.value()
    }

    pub fn is_finished(&self) -> bool {
        self.shared.lock().finished.value()
    }

    pub fn is_suspended(&self) -> bool {
        self.shared.lock().suspended.value()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().cancelled.value()
    }

    /// True iff every dependency has finished. Computed fresh on every call.
    pub fn is_ready(&self) -> bool {
        self.dependencies().iter().all(OperationHandle::is_finished)
    }

    pub fn state(&self) -> OperationState {
        let st = self.shared.lock();
        if st.finished.value() {
            OperationState::Finished
        } else if st.cancelled.value() {
            OperationState::CancelledPendingFinish
        } else if st.suspended.value() {
            OperationState::Suspended
        } else if st.executing.value() {
            OperationState::Executing
        } else {
            OperationState::Pending
        }
    }

    pub fn queue_priority(&self) -> QueuePriority {
        self.shared.lock().priority.value()
    }

    pub fn set_queue_priority(&self, priority: impl Into<QueuePriority>) {
        let priority = priority.into();
        let changed = self.shared.lock().priority.set(priority);
        if changed {
            self.shared.bus.emit(&OperationChange {
                operation: self.id(),
                property: OperationProperty::QueuePriority,
                value: PropertyValue::Int(i64::from(priority.value())),
            });
        }
    }

    // ── Dependencies ────────────────────────────────────────────────────

    /// Make this operation wait for `dependency` to finish.
    ///
    /// Dependencies should be added before the operation is submitted; a
    /// queue only watches the dependencies present at submission time.
    pub fn add_dependency(&self, dependency: &OperationCore) {
        if dependency.id() == self.id() {
            tracing::warn!(operation = %self.id(), "ignoring dependency on itself");
            return;
        }
        let mut st = self.shared.lock();
        if st.dependencies.iter().any(|d| d.id == dependency.id()) {
            return;
        }
        st.dependencies.push(dependency.handle());
    }

    pub fn remove_dependency(&self, dependency: OperationId) -> bool {
        let mut st = self.shared.lock();
        let before = st.dependencies.len();
        st.dependencies.retain(|d| d.id != dependency);
        st.dependencies.len() != before
    }

    /// Snapshot of the dependency set, in insertion order
    pub fn dependencies(&self) -> Vec<OperationHandle> {
        self.shared.lock().dependencies.clone()
    }

    // ── Lifecycle callbacks ─────────────────────────────────────────────

    pub fn completion_block(&self) -> Option<LifecycleBlock> {
        self.shared.lock().callbacks.completion.clone()
    }

    pub fn set_completion_block(&self, block: Option<LifecycleBlock>) {
        self.shared.lock().callbacks.completion = block;
    }

    pub fn suspension_block(&self) -> Option<LifecycleBlock> {
        self.shared.lock().callbacks.suspension.clone()
    }

    pub fn set_suspension_block(&self, block: Option<LifecycleBlock>) {
        self.shared.lock().callbacks.suspension = block;
    }

    pub fn resumption_block(&self) -> Option<LifecycleBlock> {
        self.shared.lock().callbacks.resumption.clone()
    }

    pub fn set_resumption_block(&self, block: Option<LifecycleBlock>) {
        self.shared.lock().callbacks.resumption = block;
    }

    pub fn cancellation_block(&self) -> Option<LifecycleBlock> {
        self.shared.lock().callbacks.cancellation.clone()
    }

    pub fn set_cancellation_block(&self, block: Option<LifecycleBlock>) {
        self.shared.lock().callbacks.cancellation = block;
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Listen for property changes whose name matches `pattern`
    pub fn subscribe(
        &self,
        pattern: impl Into<EventPattern>,
        listener: impl Fn(&OperationChange) + Send + Sync + 'static,
    ) -> ListenerId {
        self.shared.bus.subscribe(pattern, listener)
    }

    pub fn unsubscribe(&self, listener: ListenerId) -> bool {
        self.shared.bus.unsubscribe(listener)
    }

    /// Number of listeners currently subscribed to this operation
    pub fn listener_count(&self) -> usize {
        self.shared.bus.listener_count()
    }

    fn emit_flag(&self, property: OperationProperty, value: bool) {
        self.shared
            .bus
            .emit(&OperationChange::flag(self.id(), property, value));
    }

    fn run_callback(&self, kind: &'static str, block: Option<LifecycleBlock>) {
        let Some(block) = block else {
            return;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| block.invoke(self))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(operation = %self.id(), callback = kind, error = %e, "lifecycle callback failed");
            }
            Err(payload) => {
                tracing::error!(operation = %self.id(), callback = kind, panic = %panic_message(&*payload), "lifecycle callback panicked");
            }
        }
    }

    // ── Transitions ─────────────────────────────────────────────────────

    /// Enter the executing state. Fails unless ready, not executing and not
    /// finished; the state is left untouched on failure.
    pub fn begin_execution(&self) -> Result<(), OperationError> {
        let ready = self.is_ready();
        {
            let mut st = self.shared.lock();
            if st.finished.value() {
                return Err(OperationError::invalid_state(format!(
                    "start: {} is already finished",
                    self.id()
                )));
            }
            if st.executing.value() {
                return Err(OperationError::invalid_state(format!(
                    "start: {} is already executing",
                    self.id()
                )));
            }
            if !ready {
                return Err(OperationError::invalid_state(format!(
                    "start: {} is not yet ready to execute",
                    self.id()
                )));
            }
            st.executing.set(true);
        }
        tracing::debug!(operation = %self.id(), "operation executing");
        self.emit_flag(OperationProperty::Executing, true);
        Ok(())
    }

    /// Mark the operation finished.
    ///
    /// Only the first call has an effect: it fires the completion callback,
    /// then reports `finished` and the cleared `executing` flag.
    pub fn finish(&self) {
        let (was_executing, completion) = {
            let mut st = self.shared.lock();
            if !st.finished.set(true) {
                return;
            }
            let was_executing = st.executing.set(false);
            (was_executing, st.callbacks.completion.clone())
        };
        tracing::debug!(operation = %self.id(), "operation finished");
        self.run_callback("completion", completion);
        self.emit_flag(OperationProperty::Finished, true);
        if was_executing {
            self.emit_flag(OperationProperty::Executing, false);
        }
    }

    /// Request cancellation.
    ///
    /// A non-executing operation finishes immediately. An executing one only
    /// gets its cancellation callback; its own work must observe
    /// `is_cancelled` and call `finish`.
    pub fn cancel(&self) {
        let (executing, cancellation) = {
            let mut st = self.shared.lock();
            if st.finished.value() || !st.cancelled.set(true) {
                return;
            }
            let executing = st.executing.value();
            (executing, st.callbacks.cancellation.clone())
        };
        tracing::debug!(operation = %self.id(), executing, "operation cancelled");
        self.emit_flag(OperationProperty::Cancelled, true);
        if executing {
            self.run_callback("cancellation", cancellation);
        } else {
            self.finish();
        }
    }

    /// Pause an executing operation. No effect unless executing.
    pub fn suspend(&self) {
        let suspension = {
            let mut st = self.shared.lock();
            if st.finished.value() || !st.executing.value() {
                return;
            }
            st.suspended.set(true);
            st.executing.set(false);
            st.callbacks.suspension.clone()
        };
        tracing::debug!(operation = %self.id(), "operation suspended");
        self.emit_flag(OperationProperty::Suspended, true);
        self.emit_flag(OperationProperty::Executing, false);
        self.run_callback("suspension", suspension);
    }

    /// Resume a suspended operation. Resuming one that was never suspended
    /// changes nothing.
    pub fn resume(&self) {
        let (resumed, resumption) = {
            let mut st = self.shared.lock();
            if !st.suspended.set(false) {
                return;
            }
            let resumed = !st.finished.value() && st.executing.set(true);
            (resumed, st.callbacks.resumption.clone())
        };
        self.emit_flag(OperationProperty::Suspended, false);
        if resumed {
            tracing::debug!(operation = %self.id(), "operation resumed");
            self.emit_flag(OperationProperty::Executing, true);
            self.run_callback("resumption", resumption);
        }
    }
}

impl Default for OperationCore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperationCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationCore")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("priority", &self.queue_priority())
            .finish()
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
