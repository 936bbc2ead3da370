// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property-change notification
//!
//! This module provides:
//! - `PropertyBus` - Deliver named property changes to subscribed listeners
//! - `EventPattern` - Pattern matching for listener subscriptions
//! - `Observed` - A value wrapper that reports whether a write changed it

mod bus;
mod property;
mod subscription;

pub use bus::{panic_message, Listener, PropertyBus, PropertyEvent};
pub use property::{Observed, OperationChange, OperationProperty, PropertyValue};
pub use subscription::EventPattern;
