// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for operations and configuration

use thiserror::Error;

/// Error raised from inside an invocable unit
pub type BlockError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by operation lifecycle calls
#[derive(Debug, Error)]
pub enum OperationError {
    /// The call is not legal in the operation's current state
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// An execution unit failed while the operation was running
    #[error("execution block failed: {0}")]
    Block(#[from] BlockError),
}

impl OperationError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        OperationError::InvalidState(message.into())
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, OperationError::InvalidState(_))
    }
}

/// Errors produced while building a queue configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max concurrent operations must be positive")]
    ZeroConcurrency,
    #[error("unknown concurrency keyword: {0} (expected a positive integer or \"unbounded\")")]
    UnknownConcurrency(String),
    #[error("unknown priority keyword: {0}")]
    UnknownPriority(String),
}
