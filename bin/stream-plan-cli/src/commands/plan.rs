// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `stream-plan plan` command: prepare a plan and print its split table.

use crate::PipelineArgs;
use streaming_planner::{ProfileEstimator, StreamingConfig};

pub fn execute(
    region: &str,
    config: &StreamingConfig,
    pipeline_args: &PipelineArgs,
    json: bool,
) -> anyhow::Result<()> {
    let region = super::parse_region(region)?;
    let pipeline = super::pipeline_profile(pipeline_args)?;
    let mut manager = super::manager(&pipeline_args.memory_source)?;
    config.apply_to(&mut manager)?;

    manager.prepare_streaming(&ProfileEstimator::new(), &pipeline, &region)?;
    let table = manager.split_table()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*table)?);
        return Ok(());
    }

    println!("  {}", table.summary());
    if let (Some(budget), Some(limit)) = (table.budget_bytes(), table.limit_bytes()) {
        println!(
            "  Budget: {} (limit {} at bias {:.2}, source {})",
            super::human_bytes(budget),
            super::human_bytes(limit),
            manager.bias(),
            manager.memory_source_name(),
        );
    }
    if let Some(footprint) = table.estimated_footprint_bytes() {
        println!("  Estimated footprint per split: {}", super::human_bytes(footprint));
    }
    if table.budget_exceeded() {
        println!("  WARNING: budget not attainable; streaming at finest granularity");
    }
    println!();

    println!(
        "  {:>6}  {:>10} {:>10}  {:>8} {:>8}",
        "Index", "X", "Y", "Width", "Height",
    );
    println!("  {}", "-".repeat(50));
    for (i, split) in table.iter().enumerate() {
        println!(
            "  {:>6}  {:>10} {:>10}  {:>8} {:>8}",
            i,
            split.origin()[0],
            split.origin()[1],
            split.width(),
            split.height(),
        );
    }

    Ok(())
}
