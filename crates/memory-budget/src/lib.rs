// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-budget
//!
//! Byte budgets for memory-bounded raster streaming, and the sources that
//! resolve "use whatever is configured" into a concrete byte count.
//!
//! # Key Components
//!
//! - [`MemoryBudget`]: a byte quantity with human-readable parsing
//!   (`"512M"`, `"1G"`, `"auto"`). A budget of zero is the *auto* sentinel:
//!   it is resolved against a [`MemorySource`] at planning time.
//! - [`MemorySource`]: where the auto sentinel gets its value:
//!   - [`RamHint`] reads the process-wide RAM hint from the environment.
//!   - [`SystemMemory`] reads `MemAvailable` from `/proc/meminfo`.
//!   - [`FixedMemory`] always reports the same value.
//!
//! Sources are consulted on every resolution, never cached, so that a
//! configuration change between two planning calls is honoured.
//!
//! # Example
//! ```
//! use memory_budget::{FixedMemory, MemoryBudget};
//!
//! let source = FixedMemory::new(MemoryBudget::from_mb(128));
//!
//! let explicit = MemoryBudget::parse("64M").unwrap();
//! assert_eq!(explicit.resolve(&source).unwrap().as_mb(), 64);
//!
//! let auto = MemoryBudget::auto();
//! assert_eq!(auto.resolve(&source).unwrap().as_mb(), 128);
//! ```

mod budget;
mod error;
mod source;
mod system;

pub use budget::MemoryBudget;
pub use error::MemoryError;
pub use source::{FixedMemory, MemorySource, RamHint, DEFAULT_RAM_HINT_MB, RAM_HINT_ENV};
pub use system::SystemMemory;
