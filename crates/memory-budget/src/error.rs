// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for memory budgets and sources.

/// Errors that can occur when parsing or resolving a memory budget.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// A budget string could not be parsed.
    #[error("invalid budget string '{input}': {detail}")]
    InvalidBudget { input: String, detail: String },

    /// A budget value does not fit in the platform's address space.
    #[error("budget overflow: '{0}'")]
    Overflow(String),

    /// A memory source was asked for a value it cannot provide.
    #[error("memory source '{source_name}' unavailable: {detail}")]
    Unavailable { source_name: String, detail: String },

    /// Failed to read a procfs file.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse a value from a procfs file.
    #[error("failed to parse value from {path}: {detail}")]
    ParseError { path: String, detail: String },
}
