// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! opq-core: operation model for the opq task scheduler
//!
//! This crate provides:
//! - The operation lifecycle state machine with dependency gating
//! - Basic, synchronous-block and asynchronous-block operation variants
//! - Context-carrying blocks used as work bodies and lifecycle callbacks
//! - Property-change notification with pattern subscriptions
//! - Queue priority levels and queue configuration
//!
//! Scheduling itself lives in `opq-engine`.

pub mod block;
pub mod config;
pub mod error;
pub mod events;
pub mod id;
pub mod operation;
pub mod priority;

pub use block::{Block, Context};
pub use config::{
    MaxConcurrency, QueueConfig, DEFAULT_MAX_CONCURRENT_OPERATIONS, DEFAULT_QUEUE_NAME,
};
pub use error::{BlockError, ConfigError, OperationError};
pub use events::{
    panic_message, EventPattern, Listener, Observed, OperationChange, OperationProperty,
    PropertyBus, PropertyEvent, PropertyValue,
};
pub use id::{ListenerId, OperationId};
pub use operation::{
    AsyncBlock, AsyncBlockOperation, BasicOperation, BlockOperation, LifecycleBlock, Operation,
    OperationCore, OperationHandle, OperationState, SyncBlock,
};
pub use priority::{insert_by_priority, insertion_index, QueuePriority};
