// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared helpers.

pub mod plan;
pub mod status;
pub mod sweep;

use crate::PipelineArgs;
use memory_budget::{MemoryBudget, SystemMemory};
use raster_region::Region;
use streaming_planner::{PipelineProfile, StreamingManager};
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise verbosity maps to
/// warn / info / debug / trace.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses `"x,y,width,height"`.
pub fn parse_region(s: &str) -> anyhow::Result<Region> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        anyhow::bail!("region '{s}' must be 'x,y,width,height'");
    }
    let x: i64 = parts[0]
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid x in '{s}': {e}"))?;
    let y: i64 = parts[1]
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid y in '{s}': {e}"))?;
    let width: usize = parts[2]
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid width in '{s}': {e}"))?;
    let height: usize = parts[3]
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid height in '{s}': {e}"))?;
    Ok(Region::new(vec![x, y], vec![width, height])?)
}

/// Builds a one-stage pipeline profile from the command line.
pub fn pipeline_profile(args: &PipelineArgs) -> anyhow::Result<PipelineProfile> {
    let overhead = MemoryBudget::parse(&args.overhead)
        .map_err(|e| anyhow::anyhow!("invalid overhead '{}': {e}", args.overhead))?;
    Ok(PipelineProfile::new("cli").stage(
        "pipeline",
        args.bytes_per_pixel,
        args.halo,
        overhead.as_bytes(),
    ))
}

/// Creates a manager reading auto budgets from the named source.
pub fn manager(memory_source: &str) -> anyhow::Result<StreamingManager> {
    match memory_source.to_lowercase().as_str() {
        "ram-hint" | "hint" => Ok(StreamingManager::new()),
        "system" => Ok(StreamingManager::with_memory_source(SystemMemory::new())),
        other => anyhow::bail!("unknown memory source '{other}'; expected 'ram-hint' or 'system'"),
    }
}

/// Formats a byte count with a binary unit.
pub fn human_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() {
        assert_eq!(parse_region("10, -5,100,20").unwrap(), Region::from_xywh(10, -5, 100, 20));
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("1,2,-3,4").is_err());
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1536), "1.5 KB");
        assert_eq!(human_bytes(64 << 20), "64.0 MB");
    }

    #[test]
    fn test_unknown_memory_source() {
        assert!(manager("swap").is_err());
        assert!(manager("system").is_ok());
    }
}
