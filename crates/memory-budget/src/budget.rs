// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory budget representation and parsing.
//!
//! A [`MemoryBudget`] is the byte ceiling a streamed pipeline is expected
//! to stay under. It supports human-readable string parsing for config
//! files and command lines.

use crate::{MemoryError, MemorySource};
use std::fmt;

const KB: usize = 1024;
const MB: usize = 1024 * 1024;
const GB: usize = 1024 * 1024 * 1024;

/// A non-negative byte quantity.
///
/// Zero is not "no memory": it is the *auto* sentinel, meaning the budget
/// is taken from a [`MemorySource`] when it is [resolved](Self::resolve).
///
/// # Parsing
/// Supports human-readable strings with binary suffixes:
/// - `K`/`KB`, `M`/`MB`, `G`/`GB` (powers of 1024), case-insensitive,
///   optionally separated from the number by spaces
/// - `B` or no suffix for a raw byte count
/// - `"auto"` or any zero amount for the auto sentinel
///
/// # Examples
/// ```
/// use memory_budget::MemoryBudget;
///
/// assert_eq!(MemoryBudget::parse("1g").unwrap(), MemoryBudget::from_mb(1024));
/// assert_eq!(MemoryBudget::parse("300 KB").unwrap().as_bytes(), 300 * 1024);
///
/// assert!(MemoryBudget::parse("auto").unwrap().is_auto());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct MemoryBudget {
    /// Budget in bytes; `0` means auto.
    bytes: usize,
}

impl MemoryBudget {
    /// The auto sentinel: resolve from the configured source at planning time.
    pub const fn auto() -> Self {
        Self { bytes: 0 }
    }

    /// Creates a budget from a byte count.
    pub const fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from megabytes.
    pub const fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MB }
    }

    /// Creates a budget from gigabytes.
    pub const fn from_gb(gb: usize) -> Self {
        Self { bytes: gb * GB }
    }

    /// Returns `true` for the auto sentinel.
    pub fn is_auto(&self) -> bool {
        self.bytes == 0
    }

    /// Returns the budget in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in megabytes (truncated).
    pub fn as_mb(&self) -> usize {
        self.bytes / MB
    }

    /// Returns `bytes × factor`, rounded down.
    ///
    /// Used to apply the planner's safety bias.
    pub fn scaled(&self, factor: f64) -> usize {
        (self.bytes as f64 * factor).floor() as usize
    }

    /// Resolves the auto sentinel against `source`.
    ///
    /// Explicit budgets are returned unchanged without consulting the
    /// source. The source is read on every call.
    pub fn resolve(&self, source: &dyn MemorySource) -> Result<MemoryBudget, MemoryError> {
        if !self.is_auto() {
            return Ok(*self);
        }
        let bytes = source.available_bytes()?;
        if bytes == 0 {
            return Err(MemoryError::Unavailable {
                source_name: source.name().to_string(),
                detail: "source reported zero available bytes".to_string(),
            });
        }
        tracing::debug!(source = source.name(), bytes, "resolved auto memory budget");
        Ok(Self { bytes })
    }

    /// Parses an amount with an optional unit suffix, or `"auto"`.
    ///
    /// See the type docs for the accepted suffixes. Fractions and negative
    /// amounts are rejected.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MemoryError::InvalidBudget {
                input: s.to_string(),
                detail: "empty string".to_string(),
            });
        }
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::auto());
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (num_str, unit) = s.split_at(split);
        let multiplier = unit_multiplier(unit.trim()).ok_or_else(|| MemoryError::InvalidBudget {
            input: s.to_string(),
            detail: format!("unknown unit '{}'; expected B, K, M or G", unit.trim()),
        })?;

        let value: usize = num_str
            .trim()
            .parse()
            .map_err(|_| MemoryError::InvalidBudget {
                input: s.to_string(),
                detail: "expected a non-negative number followed by an optional suffix (K, M, G)"
                    .to_string(),
            })?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| MemoryError::Overflow(s.to_string()))?;

        Ok(Self { bytes })
    }
}

/// Binary multiplier for a unit suffix, case-insensitive. An empty suffix
/// is a raw byte count.
fn unit_multiplier(unit: &str) -> Option<usize> {
    const UNITS: [(&str, usize); 8] = [
        ("", 1),
        ("B", 1),
        ("K", KB),
        ("KB", KB),
        ("M", MB),
        ("MB", MB),
        ("G", GB),
        ("GB", GB),
    ];
    UNITS
        .iter()
        .find(|(suffix, _)| suffix.eq_ignore_ascii_case(unit))
        .map(|&(_, m)| m)
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes == 0 {
            write!(f, "auto")
        } else if self.bytes >= GB && self.bytes % GB == 0 {
            write!(f, "{} GB", self.bytes / GB)
        } else if self.bytes >= MB && self.bytes % MB == 0 {
            write!(f, "{} MB", self.bytes / MB)
        } else if self.bytes >= KB && self.bytes % KB == 0 {
            write!(f, "{} KB", self.bytes / KB)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}
