// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sources for the process-wide available-memory value.
//!
//! The planner never looks memory up on its own: it is handed a
//! [`MemorySource`] and asks it whenever an auto budget needs resolving.
//! Tests inject a [`FixedMemory`]; production code typically uses
//! [`RamHint`] or [`crate::SystemMemory`].

use crate::{MemoryBudget, MemoryError};

/// Environment variable holding the process-wide RAM hint.
pub const RAM_HINT_ENV: &str = "STREAM_MAX_RAM_HINT";

/// RAM hint used when the environment variable is unset, in megabytes.
pub const DEFAULT_RAM_HINT_MB: usize = 256;

/// Something that can tell how many bytes a streamed pipeline may use.
pub trait MemorySource: Send + Sync {
    /// Human-readable name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Returns the number of bytes currently available.
    fn available_bytes(&self) -> Result<usize, MemoryError>;
}

/// Reads the RAM hint from an environment variable on every call.
///
/// The variable holds a number of megabytes (`"512"`) or a suffixed
/// budget string (`"2G"`). When it is unset, [`DEFAULT_RAM_HINT_MB`] is
/// used.
#[derive(Debug, Clone)]
pub struct RamHint {
    var: String,
    default_mb: usize,
}

impl Default for RamHint {
    fn default() -> Self {
        Self::new()
    }
}

impl RamHint {
    /// Reads [`RAM_HINT_ENV`], defaulting to [`DEFAULT_RAM_HINT_MB`].
    pub fn new() -> Self {
        Self::with_var(RAM_HINT_ENV)
    }

    /// Reads a custom environment variable.
    pub fn with_var(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            default_mb: DEFAULT_RAM_HINT_MB,
        }
    }

    /// Overrides the fallback used when the variable is unset.
    pub fn with_default_mb(mut self, default_mb: usize) -> Self {
        self.default_mb = default_mb;
        self
    }

    /// Returns the environment variable this source reads.
    pub fn var(&self) -> &str {
        &self.var
    }

    fn parse_hint(&self, raw: &str) -> Result<usize, MemoryError> {
        let raw = raw.trim();
        let budget = if raw.bytes().all(|b| b.is_ascii_digit()) && !raw.is_empty() {
            let mb: usize = raw.parse().map_err(|_| MemoryError::Overflow(raw.to_string()))?;
            let bytes = mb
                .checked_mul(1024 * 1024)
                .ok_or_else(|| MemoryError::Overflow(raw.to_string()))?;
            MemoryBudget::from_bytes(bytes)
        } else {
            MemoryBudget::parse(raw)?
        };

        if budget.is_auto() {
            return Err(MemoryError::Unavailable {
                source_name: self.name().to_string(),
                detail: format!("{} must be a positive amount, got '{raw}'", self.var),
            });
        }
        Ok(budget.as_bytes())
    }
}

impl MemorySource for RamHint {
    fn name(&self) -> &str {
        "ram-hint"
    }

    fn available_bytes(&self) -> Result<usize, MemoryError> {
        match std::env::var(&self.var) {
            Ok(raw) => self.parse_hint(&raw),
            Err(std::env::VarError::NotPresent) => Ok(self.default_mb * 1024 * 1024),
            Err(std::env::VarError::NotUnicode(_)) => Err(MemoryError::Unavailable {
                source_name: self.name().to_string(),
                detail: format!("{} is not valid unicode", self.var),
            }),
        }
    }
}

/// A source that always reports the same amount.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory {
    budget: MemoryBudget,
}

impl FixedMemory {
    pub fn new(budget: MemoryBudget) -> Self {
        Self { budget }
    }
}

impl MemorySource for FixedMemory {
    fn name(&self) -> &str {
        "fixed"
    }

    fn available_bytes(&self) -> Result<usize, MemoryError> {
        Ok(self.budget.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable name so parallel tests never race.

    #[test]
    fn test_ram_hint_default_when_unset() {
        let hint = RamHint::with_var("STREAM_TEST_HINT_UNSET");
        assert_eq!(hint.available_bytes().unwrap(), 256 * 1024 * 1024);

        let hint = hint.with_default_mb(64);
        assert_eq!(hint.available_bytes().unwrap(), 64 * 1024 * 1024);
    }

    #[test]
    fn test_ram_hint_plain_megabytes() {
        std::env::set_var("STREAM_TEST_HINT_MB", "512");
        let hint = RamHint::with_var("STREAM_TEST_HINT_MB");
        assert_eq!(hint.available_bytes().unwrap(), 512 * 1024 * 1024);
    }

    #[test]
    fn test_ram_hint_suffixed() {
        std::env::set_var("STREAM_TEST_HINT_SUFFIX", "2G");
        let hint = RamHint::with_var("STREAM_TEST_HINT_SUFFIX");
        assert_eq!(hint.available_bytes().unwrap(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_ram_hint_reread_every_call() {
        std::env::set_var("STREAM_TEST_HINT_REREAD", "100");
        let hint = RamHint::with_var("STREAM_TEST_HINT_REREAD");
        assert_eq!(hint.available_bytes().unwrap(), 100 * 1024 * 1024);
        std::env::set_var("STREAM_TEST_HINT_REREAD", "200");
        assert_eq!(hint.available_bytes().unwrap(), 200 * 1024 * 1024);
    }

    #[test]
    fn test_ram_hint_rejects_zero_and_garbage() {
        std::env::set_var("STREAM_TEST_HINT_ZERO", "0");
        assert!(RamHint::with_var("STREAM_TEST_HINT_ZERO")
            .available_bytes()
            .is_err());

        std::env::set_var("STREAM_TEST_HINT_BAD", "lots");
        assert!(RamHint::with_var("STREAM_TEST_HINT_BAD")
            .available_bytes()
            .is_err());
    }

    #[test]
    fn test_fixed_memory() {
        let fixed = FixedMemory::new(MemoryBudget::from_mb(8));
        assert_eq!(fixed.name(), "fixed");
        assert_eq!(fixed.available_bytes().unwrap(), 8 * 1024 * 1024);
    }
}
