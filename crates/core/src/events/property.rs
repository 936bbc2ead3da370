// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-notifying attributes and the payloads they emit

use super::bus::PropertyEvent;
use crate::id::OperationId;
use std::fmt;

/// A value that reports whether a write actually changed it.
///
/// State structs hold their notifying attributes in `Observed` so the
/// owning entity can decide, after releasing its lock, which names to emit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observed<T> {
    value: T,
}

impl<T: PartialEq> Observed<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Store `value`, returning true if it differs from the previous value
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }
}

impl<T: Copy> Observed<T> {
    pub fn value(&self) -> T {
        self.value
    }
}

/// New value carried by a property change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Notifying attributes of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationProperty {
    Executing,
    Finished,
    Suspended,
    Cancelled,
    QueuePriority,
}

impl OperationProperty {
    pub fn name(&self) -> &'static str {
        match self {
            OperationProperty::Executing => "operation:executing",
            OperationProperty::Finished => "operation:finished",
            OperationProperty::Suspended => "operation:suspended",
            OperationProperty::Cancelled => "operation:cancelled",
            OperationProperty::QueuePriority => "operation:priority",
        }
    }
}

/// Payload emitted when an operation attribute changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationChange {
    pub operation: OperationId,
    pub property: OperationProperty,
    pub value: PropertyValue,
}

impl OperationChange {
    pub fn flag(operation: OperationId, property: OperationProperty, value: bool) -> Self {
        Self {
            operation,
            property,
            value: PropertyValue::Bool(value),
        }
    }
}

impl PropertyEvent for OperationChange {
    fn name(&self) -> &'static str {
        self.property.name()
    }
}
