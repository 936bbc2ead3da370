// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue priority and priority-ordered placement

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Admission priority of an operation within a queue.
///
/// The named bands are conventions only; any `i32` is legal and higher
/// values are admitted first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QueuePriority(pub i32);

impl QueuePriority {
    pub const VERY_LOW: QueuePriority = QueuePriority(-8);
    pub const LOW: QueuePriority = QueuePriority(-4);
    pub const NORMAL: QueuePriority = QueuePriority(0);
    pub const HIGH: QueuePriority = QueuePriority(4);
    pub const VERY_HIGH: QueuePriority = QueuePriority(8);

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for QueuePriority {
    fn from(value: i32) -> Self {
        QueuePriority(value)
    }
}

impl fmt::Display for QueuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueuePriority {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "very-low" | "very_low" => Ok(Self::VERY_LOW),
            "low" => Ok(Self::LOW),
            "normal" => Ok(Self::NORMAL),
            "high" => Ok(Self::HIGH),
            "very-high" | "very_high" => Ok(Self::VERY_HIGH),
            other => other
                .parse::<i32>()
                .map(QueuePriority)
                .map_err(|_| ConfigError::UnknownPriority(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for QueuePriority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Value(i32),
            Keyword(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Value(v) => Ok(QueuePriority(v)),
            Repr::Keyword(k) => k.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Position at which an item of `priority` goes into a list kept in
/// descending priority order.
///
/// Binary search; an item lands after every existing item of equal
/// priority, so repeated insertion keeps first-in-first-out order within a
/// priority level.
pub fn insertion_index<T>(
    sorted: &[T],
    priority: QueuePriority,
    priority_of: impl Fn(&T) -> QueuePriority,
) -> usize {
    sorted.partition_point(|item| priority_of(item) >= priority)
}

/// Insert `item` into a descending-priority list at its binary-searched slot
pub fn insert_by_priority<T>(
    sorted: &mut Vec<T>,
    item: T,
    priority_of: impl Fn(&T) -> QueuePriority,
) {
    let index = insertion_index(sorted, priority_of(&item), &priority_of);
    sorted.insert(index, item);
}

#[cfg(test)]
#[path = "priority_tests.rs"]
mod tests;
