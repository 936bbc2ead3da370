// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invocable units bound to a context
//!
//! A `Block<T>` wraps a function together with a free-form context bag.
//! Invoking it calls the function with the target object (`T`) and the block
//! itself, so the function can read or update its own context. Clones share
//! both the function and the context; two blocks are the same unit only if
//! one is a clone of the other.

use crate::error::BlockError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Free-form key/value context carried by a block
pub type Context = HashMap<String, Value>;

type BlockFn<T> = dyn Fn(&T, &Block<T>) -> Result<(), BlockError> + Send + Sync;

/// A callable bound to a context, invoked against a target of type `T`
pub struct Block<T: ?Sized> {
    func: Arc<BlockFn<T>>,
    context: Arc<Mutex<Context>>,
}

impl<T: ?Sized> Block<T> {
    /// Create a block with an empty context
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&T, &Block<T>) -> Result<(), BlockError> + Send + Sync + 'static,
    {
        Self::with_context(func, Context::new())
    }

    /// Create a block bound to the given context
    pub fn with_context<F>(func: F, context: Context) -> Self
    where
        F: Fn(&T, &Block<T>) -> Result<(), BlockError> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            context: Arc::new(Mutex::new(context)),
        }
    }

    /// Create a block from an infallible closure that ignores the block itself
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::new(move |target, _| {
            func(target);
            Ok(())
        })
    }

    /// Run the function against `target`
    pub fn invoke(&self, target: &T) -> Result<(), BlockError> {
        (self.func)(target, self)
    }

    /// Snapshot of the whole context
    pub fn context(&self) -> Context {
        self.lock().clone()
    }

    /// Replace the whole context
    pub fn set_context(&self, context: Context) {
        *self.lock() = context;
    }

    pub fn context_value(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    pub fn set_context_value(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().insert(key.into(), value.into());
    }

    pub fn remove_context_value(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    /// Whether both handles refer to the same unit
    pub fn ptr_eq(&self, other: &Block<T>) -> bool {
        Arc::ptr_eq(&self.context, &other.context)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Context> {
        self.context.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: ?Sized> Clone for Block<T> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            context: Arc::clone(&self.context),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Block<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("context", &*self.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "block_tests.rs"]
mod tests;
