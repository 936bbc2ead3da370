// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations: units of work with a dependency-gated lifecycle
//!
//! Every variant embeds an [`OperationCore`] and implements [`Operation`],
//! overriding `main` with its work body. `start` is shared:
//!
//! 1. fail with `InvalidState` unless ready (all dependencies finished);
//! 2. mark executing and run `main`;
//! 3. a non-concurrent operation is finished as soon as `main` returns,
//!    and a failing `main` finishes the operation before the error is
//!    returned, so dependents are never blocked by a failed upstream.

mod async_block;
mod basic;
mod block;
mod blocks;
mod lifecycle;

pub use self::async_block::{AsyncBlock, AsyncBlockOperation};
pub use self::basic::BasicOperation;
pub use self::block::{BlockOperation, SyncBlock};
pub use self::lifecycle::{LifecycleBlock, OperationCore, OperationHandle, OperationState};

use crate::error::OperationError;
use crate::id::OperationId;
use crate::priority::QueuePriority;

/// The capability set shared by all operation variants
pub trait Operation: Send + Sync + 'static {
    /// Lifecycle state of this operation
    fn core(&self) -> &OperationCore;

    /// The work body. No-op by default.
    ///
    /// A concurrent operation returns after initiating its work and calls
    /// `finish` itself once the work completes.
    fn main(&self) -> Result<(), OperationError> {
        Ok(())
    }

    /// Whether the operation may outlive its `main` call. Decided by the
    /// operation type, never by the caller.
    fn is_concurrent(&self) -> bool {
        false
    }

    /// Execute the operation. Not meant to be overridden.
    fn start(&self) -> Result<(), OperationError> {
        self.core().begin_execution()?;
        self.execute()
    }

    /// Second half of `start`: run `main` on an operation already marked
    /// executing by `OperationCore::begin_execution`. Not meant to be
    /// overridden.
    fn execute(&self) -> Result<(), OperationError> {
        let core = self.core();
        if let Err(e) = self.main() {
            tracing::warn!(operation = %core.id(), error = %e, "operation main failed");
            core.finish();
            return Err(e);
        }

        if !self.is_concurrent() {
            core.finish();
        }
        Ok(())
    }

    fn id(&self) -> OperationId {
        self.core().id()
    }

    fn cancel(&self) {
        self.core().cancel()
    }

    fn suspend(&self) {
        self.core().suspend()
    }

    fn resume(&self) {
        self.core().resume()
    }

    fn finish(&self) {
        self.core().finish()
    }

    fn is_ready(&self) -> bool {
        self.core().is_ready()
    }

    fn is_executing(&self) -> bool {
        self.core().is_executing()
    }

    fn is_finished(&self) -> bool {
        self.core().is_finished()
    }

    fn is_suspended(&self) -> bool {
        self.core().is_suspended()
    }

    fn is_cancelled(&self) -> bool {
        self.core().is_cancelled()
    }

    fn queue_priority(&self) -> QueuePriority {
        self.core().queue_priority()
    }

    fn set_queue_priority(&self, priority: QueuePriority) {
        self.core().set_queue_priority(priority)
    }

    fn add_dependency(&self, dependency: &dyn Operation) {
        self.core().add_dependency(dependency.core())
    }

    fn remove_dependency(&self, dependency: &dyn Operation) -> bool {
        self.core().remove_dependency(dependency.id())
    }

    fn dependencies(&self) -> Vec<OperationHandle> {
        self.core().dependencies()
    }
}
