// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered execution-unit list shared by the block operation variants

use super::lifecycle::OperationCore;
use crate::block::Block;
use crate::error::OperationError;
use std::sync::{Mutex, MutexGuard};

pub(crate) struct ExecutionBlocks<T: ?Sized> {
    blocks: Mutex<Vec<Block<T>>>,
}

impl<T: ?Sized> ExecutionBlocks<T> {
    pub(crate) fn new(initial: impl IntoIterator<Item = Block<T>>) -> Self {
        Self {
            blocks: Mutex::new(initial.into_iter().collect()),
        }
    }

    /// Append a unit; only legal before the owning operation starts
    pub(crate) fn push(&self, core: &OperationCore, block: Block<T>) -> Result<(), OperationError> {
        if core.is_executing() || core.is_finished() {
            return Err(OperationError::invalid_state(format!(
                "add execution block: {} is already executing or finished",
                core.id()
            )));
        }
        self.lock().push(block);
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Vec<Block<T>> {
        self.lock().clone()
    }

    pub(crate) fn get(&self, index: usize) -> Option<Block<T>> {
        self.lock().get(index).cloned()
    }

    pub(crate) fn position(&self, block: &Block<T>) -> Option<usize> {
        self.lock().iter().position(|b| b.ptr_eq(block))
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Block<T>>> {
        self.blocks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
