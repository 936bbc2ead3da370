// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation with no work body of its own
//!
//! Useful as a barrier: give it dependencies and hang a completion block
//! on it to learn when a whole group has finished.

use super::lifecycle::OperationCore;
use super::Operation;
use crate::priority::QueuePriority;

#[derive(Debug, Default)]
pub struct BasicOperation {
    core: OperationCore,
}

impl BasicOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(priority: QueuePriority) -> Self {
        Self {
            core: OperationCore::with_priority(priority),
        }
    }
}

impl Operation for BasicOperation {
    fn core(&self) -> &OperationCore {
        &self.core
    }
}
