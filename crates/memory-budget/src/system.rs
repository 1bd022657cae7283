// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Available system memory via `/proc/meminfo`.
//!
//! Uses the kernel's `MemAvailable` estimate: free memory plus buffers and
//! reclaimable cache, i.e. what a new allocation can use without swapping.

use crate::{MemoryError, MemorySource};
use std::path::{Path, PathBuf};

/// Default path to the kernel memory info file.
const MEMINFO_PATH: &str = "/proc/meminfo";

/// Reads the kernel's available-memory estimate on every call.
#[derive(Debug, Clone)]
pub struct SystemMemory {
    path: PathBuf,
}

impl Default for SystemMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMemory {
    /// Reads from `/proc/meminfo`.
    pub fn new() -> Self {
        Self::from_path(MEMINFO_PATH)
    }

    /// Reads from a specific file (for testing).
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parses `MemAvailable` out of `/proc/meminfo`-formatted text.
    pub(crate) fn parse(content: &str, source_path: &Path) -> Result<usize, MemoryError> {
        let parse_error = |detail: String| MemoryError::ParseError {
            path: source_path.display().to_string(),
            detail,
        };

        let value = content
            .lines()
            .find_map(|line| line.strip_prefix("MemAvailable:"))
            .ok_or_else(|| parse_error("no MemAvailable line".to_string()))?;

        let kb: usize = value
            .trim()
            .trim_end_matches("kB")
            .trim()
            .parse()
            .map_err(|_| parse_error(format!("MemAvailable is not a kB count: '{}'", value.trim())))?;
        kb.checked_mul(1024)
            .ok_or_else(|| parse_error(format!("MemAvailable overflows: {kb} kB")))
    }
}

impl MemorySource for SystemMemory {
    fn name(&self) -> &str {
        "system"
    }

    fn available_bytes(&self) -> Result<usize, MemoryError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| MemoryError::ReadError {
            path: self.path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "\
MemTotal:       16303412 kB
MemFree:         1211636 kB
MemAvailable:    9876543 kB
Buffers:          402120 kB
Cached:          7721184 kB
SwapTotal:       2097148 kB
";

    fn parse(content: &str) -> Result<usize, MemoryError> {
        SystemMemory::parse(content, Path::new("meminfo"))
    }

    #[test]
    fn test_parse_mem_available() {
        assert_eq!(parse(MEMINFO).unwrap(), 9876543 * 1024);
    }

    #[test]
    fn test_parse_errors() {
        let no_available = "MemTotal:       16303412 kB\nMemFree:         1211636 kB\n";
        assert!(matches!(parse(no_available), Err(MemoryError::ParseError { .. })));
        assert!(matches!(parse("MemAvailable:    many kB\n"), Err(MemoryError::ParseError { .. })));
        assert!(matches!(parse(""), Err(MemoryError::ParseError { .. })));
    }

    #[test]
    fn test_reads_file_each_call() {
        let path = std::env::temp_dir().join(format!("memory-budget-meminfo-{}", std::process::id()));
        let source = SystemMemory::from_path(&path);

        std::fs::write(&path, "MemAvailable: 100 kB\n").unwrap();
        assert_eq!(source.available_bytes().unwrap(), 100 * 1024);
        std::fs::write(&path, "MemAvailable: 300 kB\n").unwrap();
        assert_eq!(source.available_bytes().unwrap(), 300 * 1024);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(source.available_bytes(), Err(MemoryError::ReadError { .. })));
    }

    #[test]
    fn test_host_meminfo_if_present() {
        if Path::new(MEMINFO_PATH).exists() {
            assert!(SystemMemory::new().available_bytes().unwrap() > 0);
        }
    }
}
