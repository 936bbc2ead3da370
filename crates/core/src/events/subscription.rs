// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener patterns over property-change names
//!
//! Names are `:`-separated, e.g. `operation:finished` or `queue:suspended`.
//! A pattern segment is a literal, `*` (exactly one segment) or `**` (all
//! remaining segments). A lone `*` or `**` matches every name; an empty
//! pattern matches none.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    One,
    Rest,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Shape {
    Nothing,
    Everything,
    Segments(Vec<Segment>),
}

/// Compiled pattern matched against every emitted change name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventPattern {
    source: String,
    shape: Shape,
}

impl EventPattern {
    pub fn new(pattern: &str) -> Self {
        let shape = match pattern {
            "" => Shape::Nothing,
            "*" | "**" => Shape::Everything,
            _ => Shape::Segments(
                pattern
                    .split(':')
                    .map(|s| match s {
                        "*" => Segment::One,
                        "**" => Segment::Rest,
                        lit => Segment::Literal(lit.to_string()),
                    })
                    .collect(),
            ),
        };
        Self {
            source: pattern.to_string(),
            shape,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let segments = match &self.shape {
            Shape::Nothing => return false,
            Shape::Everything => return true,
            Shape::Segments(segments) => segments,
        };

        let mut parts = name.split(':');
        for segment in segments {
            match (segment, parts.next()) {
                (Segment::Rest, _) => return true,
                (Segment::One, Some(_)) => {}
                (Segment::Literal(lit), Some(part)) if lit == part => {}
                _ => return false,
            }
        }
        parts.next().is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl From<&str> for EventPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

impl From<String> for EventPattern {
    fn from(pattern: String) -> Self {
        Self::new(&pattern)
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
