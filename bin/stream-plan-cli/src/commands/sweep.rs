// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `stream-plan sweep` command: split counts across memory budgets.
//!
//! Stricter budgets never yield fewer splits; the table makes that visible.

use crate::PipelineArgs;
use memory_budget::MemoryBudget;
use streaming_planner::{ProfileEstimator, StreamingMode};

pub fn execute(
    region: &str,
    budgets: &str,
    tiled: bool,
    pipeline_args: &PipelineArgs,
) -> anyhow::Result<()> {
    let region = super::parse_region(region)?;
    let pipeline = super::pipeline_profile(pipeline_args)?;

    let mut budgets: Vec<MemoryBudget> = budgets
        .split(',')
        .map(|s| {
            MemoryBudget::parse(s.trim())
                .map_err(|e| anyhow::anyhow!("invalid budget '{}': {e}", s.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    budgets.sort_by(|a, b| b.cmp(a));

    println!("  Region: {region}");
    println!("  Pipeline: {} B/pixel, halo {}", pipeline_args.bytes_per_pixel, pipeline_args.halo);
    println!();
    println!(
        "  {:<12} {:>8} {:>14} {:>9}",
        "Budget", "Splits", "Per split", "Fits",
    );
    println!("  {}", "-".repeat(46));

    let mut manager = super::manager(&pipeline_args.memory_source)?;
    for budget in budgets {
        let mode = if tiled {
            StreamingMode::tiled_by_budget(budget)
        } else {
            StreamingMode::stripped_by_budget(budget)
        };
        manager.set_mode(mode)?;
        match manager.prepare_streaming(&ProfileEstimator::new(), &pipeline, &region) {
            Ok(n) => {
                let table = manager.split_table()?;
                let per_split = table
                    .estimated_footprint_bytes()
                    .map(super::human_bytes)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {:<12} {:>8} {:>14} {:>9}",
                    budget.to_string(),
                    n,
                    per_split,
                    if table.budget_exceeded() { "no" } else { "yes" },
                );
            }
            Err(e) => {
                tracing::warn!(%budget, "sweep point failed: {e}");
                println!("  {:<12} {:>8}", budget.to_string(), "error");
            }
        }
    }
    println!();

    Ok(())
}
