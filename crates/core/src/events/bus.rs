// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property bus for routing change notifications to listeners
//!
//! Delivery is synchronous and in-process: `emit` calls every matching
//! listener, in subscription order, before it returns. Listeners are invoked
//! without the bus lock held, so a listener may subscribe, unsubscribe or
//! trigger further emits. A panicking listener is logged and skipped; the
//! remaining listeners still receive the event.

use super::subscription::EventPattern;
use crate::id::ListenerId;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

/// A payload that knows the name it is published under
pub trait PropertyEvent: Clone + Send + Sync + 'static {
    fn name(&self) -> &'static str;
}

/// Callback registered for a property name or pattern
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registration<E> {
    id: ListenerId,
    pattern: EventPattern,
    listener: Listener<E>,
}

/// Routes named property changes to matching listeners
pub struct PropertyBus<E> {
    listeners: Arc<RwLock<Vec<Registration<E>>>>,
}

impl<E: PropertyEvent> PropertyBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Subscribe to events whose name matches `pattern`
    pub fn subscribe(
        &self,
        pattern: impl Into<EventPattern>,
        listener: impl Fn(&E) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId::next();
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.push(Registration {
            id,
            pattern: pattern.into(),
            listener: Arc::new(listener),
        });
        id
    }

    /// Remove a listener, returning whether it was registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    /// Deliver an event to every listener whose pattern matches its name
    pub fn emit(&self, event: &E) {
        let name = event.name();
        let matching: Vec<Listener<E>> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.pattern.matches(name))
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in matching {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                tracing::error!(event = name, panic = %panic_message(&*payload), "listener panicked");
            }
        }
    }

    /// Get count of active listeners
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Text of a caught panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<E: PropertyEvent> Default for PropertyBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for PropertyBus<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<E> std::fmt::Debug for PropertyBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .listeners
            .read()
            .map(|l| l.len())
            .unwrap_or_default();
        f.debug_struct("PropertyBus")
            .field("listeners", &count)
            .finish()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
