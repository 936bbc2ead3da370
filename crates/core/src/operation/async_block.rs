// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous sequential-block operation
//!
//! A concurrent operation that runs its blocks one at a time behind a
//! cursor. `main` calls [`AsyncBlockOperation::next`], which moves the cursor
//! forward and invokes the block there. Each block is expected to call
//! `next` again (now or later, from any thread) once its work is done;
//! a block that never does leaves the operation executing forever.
//! Advancing past the last block finishes the operation.
//!
//! `seek`, `goto` and `reset` move the cursor non-linearly, which lets a
//! block sequence express retries and loops.

use super::blocks::ExecutionBlocks;
use super::lifecycle::OperationCore;
use super::Operation;
use crate::block::Block;
use crate::error::OperationError;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Execution unit of an [`AsyncBlockOperation`]
pub type AsyncBlock = Block<AsyncBlockOperation>;

pub struct AsyncBlockOperation {
    core: OperationCore,
    blocks: ExecutionBlocks<AsyncBlockOperation>,
    /// `None` until the first block has been reached
    cursor: Mutex<Option<usize>>,
}

impl AsyncBlockOperation {
    pub fn new() -> Self {
        Self {
            core: OperationCore::new(),
            blocks: ExecutionBlocks::new(None),
            cursor: Mutex::new(None),
        }
    }

    pub fn with_block(block: AsyncBlock) -> Self {
        Self {
            core: OperationCore::new(),
            blocks: ExecutionBlocks::new(Some(block)),
            cursor: Mutex::new(None),
        }
    }

    /// Build an operation from an ordered list of blocks
    pub fn with_blocks(blocks: impl IntoIterator<Item = AsyncBlock>) -> Self {
        Self {
            core: OperationCore::new(),
            blocks: ExecutionBlocks::new(blocks),
            cursor: Mutex::new(None),
        }
    }

    /// Append a block. Fails with `InvalidState` once the operation has
    /// started or finished.
    pub fn add_execution_block(&self, block: AsyncBlock) -> Result<(), OperationError> {
        self.blocks.push(&self.core, block)
    }

    pub fn execution_blocks(&self) -> Vec<AsyncBlock> {
        self.blocks.snapshot()
    }

    pub fn execution_block(&self) -> Option<AsyncBlock> {
        self.blocks.get(0)
    }

    /// Cursor position; one past the last block once the sequence is done
    pub fn current_index(&self) -> Option<usize> {
        *self.lock_cursor()
    }

    /// Advance to the next block and invoke it, or finish the operation if
    /// the cursor moves past the end.
    pub fn next(&self) -> Result<(), OperationError> {
        self.ensure_not_finished("next")?;
        let index = {
            let mut cursor = self.lock_cursor();
            let index = cursor.map_or(0, |c| c + 1);
            *cursor = Some(index);
            index
        };
        match self.blocks.get(index) {
            Some(block) => self.invoke(index, block),
            None => {
                tracing::debug!(operation = %self.core.id(), index, "block sequence complete");
                self.core.finish();
                Ok(())
            }
        }
    }

    /// Move the cursor by `delta` and invoke the block there
    pub fn seek(&self, delta: isize) -> Result<(), OperationError> {
        self.ensure_not_finished("seek")?;
        let base = self.current_index().map_or(-1, |c| c as isize);
        let target = base + delta;
        if target < 0 {
            return Err(OperationError::invalid_state(format!(
                "seek: cursor {} is out of range",
                target
            )));
        }
        self.invoke_at(target as usize, "seek")
    }

    /// Move the cursor to `block` and invoke it
    pub fn goto(&self, block: &AsyncBlock) -> Result<(), OperationError> {
        self.ensure_not_finished("goto")?;
        let index = self.blocks.position(block).ok_or_else(|| {
            OperationError::invalid_state("goto: block is not part of this operation")
        })?;
        self.invoke_at(index, "goto")
    }

    /// Move the cursor back to the first block and invoke it
    pub fn reset(&self) -> Result<(), OperationError> {
        self.ensure_not_finished("reset")?;
        self.invoke_at(0, "reset")
    }

    /// Invoke the block under the cursor again
    pub fn current(&self) -> Result<(), OperationError> {
        self.ensure_not_finished("current")?;
        let index = self
            .current_index()
            .ok_or_else(|| OperationError::invalid_state("current: cursor has not moved yet"))?;
        self.invoke_at(index, "current")
    }

    fn invoke_at(&self, index: usize, call: &str) -> Result<(), OperationError> {
        let block = self.blocks.get(index).ok_or_else(|| {
            OperationError::invalid_state(format!(
                "{}: cursor {} is out of range ({} blocks)",
                call,
                index,
                self.blocks.len()
            ))
        })?;
        *self.lock_cursor() = Some(index);
        self.invoke(index, block)
    }

    /// A failing block finishes the operation so dependents are not blocked
    fn invoke(&self, index: usize, block: AsyncBlock) -> Result<(), OperationError> {
        tracing::trace!(operation = %self.core.id(), index, "invoking block");
        block.invoke(self).map_err(|e| {
            tracing::warn!(operation = %self.core.id(), index, error = %e, "block failed");
            self.core.finish();
            OperationError::Block(e)
        })
    }

    fn ensure_not_finished(&self, call: &str) -> Result<(), OperationError> {
        if self.core.is_finished() {
            return Err(OperationError::invalid_state(format!(
                "{}: {} is already finished",
                call,
                self.core.id()
            )));
        }
        Ok(())
    }

    fn lock_cursor(&self) -> MutexGuard<'_, Option<usize>> {
        self.cursor.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for AsyncBlockOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for AsyncBlockOperation {
    fn core(&self) -> &OperationCore {
        &self.core
    }

    fn main(&self) -> Result<(), OperationError> {
        self.next()
    }

    fn is_concurrent(&self) -> bool {
        true
    }
}

impl fmt::Debug for AsyncBlockOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncBlockOperation")
            .field("core", &self.core)
            .field("blocks", &self.blocks.len())
            .field("cursor", &self.current_index())
            .finish()
    }
}

#[cfg(test)]
#[path = "async_block_tests.rs"]
mod tests;
