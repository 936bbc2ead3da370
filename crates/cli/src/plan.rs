// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan files
//!
//! A plan is a TOML document holding the queue settings and a list of
//! operations with names, priorities and dependencies:
//!
//! ```toml
//! [queue]
//! name = "build"
//! max_concurrent_operations = 2
//!
//! [[operation]]
//! name = "fetch"
//! priority = "high"
//! sleep_ms = 10
//!
//! [[operation]]
//! name = "compile"
//! depends_on = ["fetch"]
//! ```

use opq_core::{insert_by_priority, QueueConfig, QueuePriority};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading or validating a plan
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("operation name must not be empty")]
    EmptyName,
    #[error("duplicate operation name: {0}")]
    DuplicateName(String),
    #[error("operation {operation} depends on unknown operation {dependency}")]
    UnknownDependency {
        operation: String,
        dependency: String,
    },
    #[error("dependency cycle, these operations can never start: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// One operation entry of a plan
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationSpec {
    pub name: String,
    #[serde(default)]
    pub priority: QueuePriority,
    /// Simulated work; a non-zero delay runs as an asynchronous operation
    #[serde(default)]
    pub sleep_ms: u64,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Fail instead of completing
    #[serde(default)]
    pub fail: bool,
    /// Cancel before the queue ever sees it
    #[serde(default)]
    pub cancel: bool,
}

/// A validated plan
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default, rename = "operation")]
    pub operations: Vec<OperationSpec>,
}

impl Plan {
    /// Read and validate a plan file
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate plan content
    pub fn parse(content: &str) -> Result<Self, PlanError> {
        let plan: Plan = toml::from_str(content)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Check names, dependency references and reachability
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut seen = HashSet::new();
        for spec in &self.operations {
            if spec.name.trim().is_empty() {
                return Err(PlanError::EmptyName);
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(PlanError::DuplicateName(spec.name.clone()));
            }
        }
        for spec in &self.operations {
            if let Some(missing) = spec.depends_on.iter().find(|d| !seen.contains(d.as_str())) {
                return Err(PlanError::UnknownDependency {
                    operation: spec.name.clone(),
                    dependency: missing.clone(),
                });
            }
        }
        self.serial_order().map(|_| ())
    }

    /// Order in which a queue limited to one operation at a time would start
    /// the plan's operations.
    ///
    /// Cancelled operations finish before anything starts and are left out.
    /// After each completion the ready operations are ranked the way an
    /// admission pass ranks them: priority first, then plan order. Fails with
    /// [`PlanError::Cycle`] when some operations can never become ready.
    pub fn serial_order(&self) -> Result<Vec<&OperationSpec>, PlanError> {
        let index: HashMap<&str, usize> = self
            .operations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), i))
            .collect();

        // Distinct unfinished dependencies per operation
        let mut waiting: Vec<HashSet<usize>> = self
            .operations
            .iter()
            .map(|s| {
                s.depends_on
                    .iter()
                    .filter_map(|d| index.get(d.as_str()).copied())
                    .filter(|&d| !self.operations[d].cancel)
                    .collect()
            })
            .collect();
        let mut done: Vec<bool> = self.operations.iter().map(|s| s.cancel).collect();

        let mut order = Vec::new();
        loop {
            let mut ready: Vec<usize> = Vec::new();
            for (i, deps) in waiting.iter().enumerate() {
                if !done[i] && deps.is_empty() {
                    insert_by_priority(&mut ready, i, |&c| self.operations[c].priority);
                }
            }
            let Some(&next) = ready.first() else {
                break;
            };
            done[next] = true;
            order.push(&self.operations[next]);
            for deps in &mut waiting {
                deps.remove(&next);
            }
        }

        let stuck: Vec<String> = self
            .operations
            .iter()
            .zip(&done)
            .filter(|(_, finished)| !**finished)
            .map(|(s, _)| s.name.clone())
            .collect();
        if stuck.is_empty() {
            Ok(order)
        } else {
            Err(PlanError::Cycle(stuck))
        }
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
