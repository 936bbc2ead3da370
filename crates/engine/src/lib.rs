// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! opq dispatch engine
//!
//! [`OperationQueue`] owns a set of operations and starts them as their
//! dependencies finish, highest priority first, never running more than its
//! concurrency cap at once. Admission passes run on a tokio task; operation
//! bodies run on the blocking pool.

mod dispatch;
mod error;
mod events;
mod queue;

pub use error::QueueError;
pub use events::{QueueChange, QueueProperty};
pub use queue::OperationQueue;
