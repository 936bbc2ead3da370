// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the operation queue

use opq_core::ConfigError;
use thiserror::Error;

/// Errors that can occur when building or configuring a queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("operation queue must be created inside a tokio runtime")]
    NoRuntime,
    #[error("invalid queue configuration: {0}")]
    Config(#[from] ConfigError),
}
