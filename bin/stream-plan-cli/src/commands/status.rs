// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `stream-plan status` command: display the memory auto budgets resolve to.
//!
//! Reads every memory source. Sources that fail (for example
//! `/proc/meminfo` on non-Linux hosts) are reported, not fatal.

use memory_budget::{MemorySource, RamHint, SystemMemory, RAM_HINT_ENV};
use std::path::Path;
use streaming_planner::{StreamingConfig, DEFAULT_BIAS};

pub fn execute(config: Option<&Path>) -> anyhow::Result<()> {
    println!("  Memory sources");
    let hint = RamHint::new();
    let system = SystemMemory::new();
    let sources: [&dyn MemorySource; 2] = [&hint, &system];
    for source in sources {
        match source.available_bytes() {
            Ok(bytes) => println!(
                "   {:<10} {:>12}  (limit {} at bias {DEFAULT_BIAS})",
                source.name(),
                super::human_bytes(bytes),
                super::human_bytes((bytes as f64 * DEFAULT_BIAS) as usize),
            ),
            Err(e) => println!("   {:<10} {:>12}  ({e})", source.name(), "unavailable"),
        }
    }
    match std::env::var(RAM_HINT_ENV) {
        Ok(raw) => println!("   {RAM_HINT_ENV}={raw}"),
        Err(_) => println!("   {RAM_HINT_ENV} unset, default hint applies"),
    }
    println!();

    if let Some(path) = config {
        let config = StreamingConfig::from_file(path)?;
        let mode = config.to_mode()?;
        println!("  Configuration ({})", path.display());
        println!("   Mode:  {mode}");
        println!("   Bias:  {}", config.bias.unwrap_or(DEFAULT_BIAS));
        println!();
    }

    Ok(())
}
