// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous multi-block operation
//!
//! Runs every execution block, in order, inside a single `main` call. The
//! operation is not concurrent, so it finishes as soon as the last block
//! returns. A failing block stops the sequence.

use super::blocks::ExecutionBlocks;
use super::lifecycle::OperationCore;
use super::Operation;
use crate::block::{Block, Context};
use crate::error::OperationError;
use std::fmt;

/// Execution unit of a [`BlockOperation`]
pub type SyncBlock = Block<BlockOperation>;

pub struct BlockOperation {
    core: OperationCore,
    blocks: ExecutionBlocks<BlockOperation>,
}

impl BlockOperation {
    /// An operation with no blocks yet
    pub fn new() -> Self {
        Self {
            core: OperationCore::new(),
            blocks: ExecutionBlocks::new(None),
        }
    }

    /// An operation running a single block
    pub fn with_block(block: SyncBlock) -> Self {
        Self {
            core: OperationCore::new(),
            blocks: ExecutionBlocks::new(Some(block)),
        }
    }

    /// An operation running a single infallible closure
    pub fn from_fn(func: impl Fn(&BlockOperation) + Send + Sync + 'static) -> Self {
        Self::with_block(Block::from_fn(func))
    }

    /// Append a block. Fails with `InvalidState` once the operation has
    /// started or finished.
    pub fn add_execution_block(&self, block: SyncBlock) -> Result<(), OperationError> {
        self.blocks.push(&self.core, block)
    }

    pub fn execution_blocks(&self) -> Vec<SyncBlock> {
        self.blocks.snapshot()
    }

    /// The first block, whose context stands for the operation's context
    pub fn execution_block(&self) -> Option<SyncBlock> {
        self.blocks.get(0)
    }

    /// Context of the first block, if there is one
    pub fn context(&self) -> Option<Context> {
        self.execution_block().map(|block| block.context())
    }
}

impl Default for BlockOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl Operation for BlockOperation {
    fn core(&self) -> &OperationCore {
        &self.core
    }

    fn main(&self) -> Result<(), OperationError> {
        for block in self.blocks.snapshot() {
            block.invoke(self)?;
        }
        Ok(())
    }
}

impl fmt::Debug for BlockOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockOperation")
            .field("core", &self.core)
            .field("blocks", &self.blocks.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "block_tests.rs"]
mod tests;
