// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property changes emitted by a queue

use opq_core::{MaxConcurrency, PropertyEvent, PropertyValue};

/// Notifying attributes of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueProperty {
    Suspended,
    MaxConcurrency,
    Name,
}

impl QueueProperty {
    pub fn name(&self) -> &'static str {
        match self {
            QueueProperty::Suspended => "queue:suspended",
            QueueProperty::MaxConcurrency => "queue:max_concurrency",
            QueueProperty::Name => "queue:name",
        }
    }
}

/// Payload emitted when a queue attribute changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueChange {
    pub property: QueueProperty,
    pub value: PropertyValue,
}

impl QueueChange {
    pub(crate) fn suspended(value: bool) -> Self {
        Self {
            property: QueueProperty::Suspended,
            value: PropertyValue::Bool(value),
        }
    }

    /// Limited caps carry their count, `Unbounded` carries the keyword
    pub(crate) fn max_concurrency(max: MaxConcurrency) -> Self {
        let value = match max.as_limit() {
            Some(limit) => PropertyValue::Int(i64::try_from(limit).unwrap_or(i64::MAX)),
            None => PropertyValue::Text(max.to_string()),
        };
        Self {
            property: QueueProperty::MaxConcurrency,
            value,
        }
    }

    pub(crate) fn renamed(name: &str) -> Self {
        Self {
            property: QueueProperty::Name,
            value: PropertyValue::Text(name.to_string()),
        }
    }
}

impl PropertyEvent for QueueChange {
    fn name(&self) -> &'static str {
        self.property.name()
    }
}
