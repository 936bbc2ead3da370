// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Default cap on simultaneously executing operations
pub const DEFAULT_MAX_CONCURRENT_OPERATIONS: usize = 8;

/// Default informational queue name
pub const DEFAULT_QUEUE_NAME: &str = "OperationQueue";

/// Upper bound on operations a queue runs at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConcurrencyRepr", into = "ConcurrencyRepr")]
pub enum MaxConcurrency {
    Limited(NonZeroUsize),
    Unbounded,
}

impl MaxConcurrency {
    /// Build a limited cap, rejecting zero
    pub fn limited(count: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(count)
            .map(MaxConcurrency::Limited)
            .ok_or(ConfigError::ZeroConcurrency)
    }

    /// Whether `running` operations leave room for one more
    pub fn admits(&self, running: usize) -> bool {
        match self {
            MaxConcurrency::Limited(max) => running < max.get(),
            MaxConcurrency::Unbounded => true,
        }
    }

    pub fn as_limit(&self) -> Option<usize> {
        match self {
            MaxConcurrency::Limited(max) => Some(max.get()),
            MaxConcurrency::Unbounded => None,
        }
    }
}

impl Default for MaxConcurrency {
    fn default() -> Self {
        NonZeroUsize::new(DEFAULT_MAX_CONCURRENT_OPERATIONS)
            .map(MaxConcurrency::Limited)
            .unwrap_or(MaxConcurrency::Unbounded)
    }
}

impl fmt::Display for MaxConcurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxConcurrency::Limited(max) => write!(f, "{}", max),
            MaxConcurrency::Unbounded => write!(f, "unbounded"),
        }
    }
}

impl FromStr for MaxConcurrency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unbounded") {
            return Ok(MaxConcurrency::Unbounded);
        }
        let count = s
            .parse::<usize>()
            .map_err(|_| ConfigError::UnknownConcurrency(s.to_string()))?;
        MaxConcurrency::limited(count)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConcurrencyRepr {
    Count(usize),
    Keyword(String),
}

impl TryFrom<ConcurrencyRepr> for MaxConcurrency {
    type Error = ConfigError;

    fn try_from(repr: ConcurrencyRepr) -> Result<Self, Self::Error> {
        match repr {
            ConcurrencyRepr::Count(n) => MaxConcurrency::limited(n),
            ConcurrencyRepr::Keyword(k) => k.parse(),
        }
    }
}

impl From<MaxConcurrency> for ConcurrencyRepr {
    fn from(max: MaxConcurrency) -> Self {
        match max {
            MaxConcurrency::Limited(n) => ConcurrencyRepr::Count(n.get()),
            MaxConcurrency::Unbounded => ConcurrencyRepr::Keyword("unbounded".to_string()),
        }
    }
}

/// Settings an operation queue is constructed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Informational name, used in logs
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub max_concurrent_operations: MaxConcurrency,
    /// Start suspended: nothing is admitted until resumed
    #[serde(default)]
    pub suspended: bool,
}

fn default_name() -> String {
    DEFAULT_QUEUE_NAME.to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_concurrent_operations: MaxConcurrency::default(),
            suspended: false,
        }
    }
}

impl QueueConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_max_concurrency(mut self, max: MaxConcurrency) -> Self {
        self.max_concurrent_operations = max;
        self
    }

    pub fn with_suspended(mut self, suspended: bool) -> Self {
        self.suspended = suspended;
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
