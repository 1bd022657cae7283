// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # stream-plan
//!
//! Command-line interface for the raster streaming planner.
//!
//! ## Usage
//! ```bash
//! # Split a 10000x8000 region into strips that fit 64 MB
//! stream-plan plan --region 0,0,10000,8000 --mode stripped-by-budget --memory-budget 64M
//!
//! # Same, with the mode taken from a TOML file, as JSON
//! stream-plan --config streaming.toml plan --region 0,0,10000,8000 --json
//!
//! # Split counts across budgets
//! stream-plan sweep --region 0,0,10000,8000 --budgets 16M,64M,256M,1G
//!
//! # Memory available to auto budgets
//! stream-plan status
//! ```

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stream-plan",
    about = "Plans memory-bounded streaming of large raster regions",
    version,
    author
)]
struct Cli {
    /// Path to a TOML streaming configuration (overrides mode arguments).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// The pipeline whose footprint is estimated for budget modes.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Bytes buffered per pixel across the whole pipeline.
    #[arg(long, default_value_t = 4)]
    pub bytes_per_pixel: usize,

    /// Neighbourhood radius of the pipeline's filter, in pixels.
    #[arg(long, default_value_t = 0)]
    pub halo: usize,

    /// Region-independent memory of the pipeline (e.g. "2M").
    #[arg(long, default_value = "0")]
    pub overhead: String,

    /// Where auto budgets come from: ram-hint, system.
    #[arg(long, default_value = "ram-hint")]
    pub memory_source: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the split table for a region.
    Plan {
        /// Region to split, as "x,y,width,height".
        #[arg(short, long)]
        region: String,

        /// Streaming mode: stripped-by-budget, stripped-by-line-count,
        /// tiled-by-budget, tiled-by-dimension.
        #[arg(short, long, default_value = "stripped-by-budget")]
        mode: String,

        /// Memory budget (e.g., "512M", "1G", "auto").
        #[arg(short = 'b', long, default_value = "auto")]
        memory_budget: String,

        /// Lines per strip for stripped-by-line-count.
        #[arg(long)]
        lines: Option<usize>,

        /// Tile width for tiled-by-dimension.
        #[arg(long)]
        tile_width: Option<usize>,

        /// Tile height for tiled-by-dimension.
        #[arg(long)]
        tile_height: Option<usize>,

        /// Edge alignment for tiled-by-budget (default 16).
        #[arg(long)]
        tile_alignment: Option<usize>,

        /// Safety factor applied to the budget, in (0, 1].
        #[arg(long)]
        bias: Option<f64>,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Print the table as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print split counts for a list of budgets.
    Sweep {
        /// Region to split, as "x,y,width,height".
        #[arg(short, long)]
        region: String,

        /// Comma-separated memory budgets to sweep (e.g., "16M,64M,256M").
        #[arg(long)]
        budgets: String,

        /// Sweep tiles instead of strips.
        #[arg(long)]
        tiled: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Display the memory available to auto budgets.
    Status,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Plan {
            region,
            mode,
            memory_budget,
            lines,
            tile_width,
            tile_height,
            tile_alignment,
            bias,
            pipeline,
            json,
        } => {
            let config = match &cli.config {
                Some(path) => streaming_planner::StreamingConfig::from_file(path)?,
                None => streaming_planner::StreamingConfig {
                    mode,
                    memory_budget,
                    lines_per_split: lines,
                    tile_width,
                    tile_height,
                    tile_alignment,
                    bias,
                },
            };
            commands::plan::execute(&region, &config, &pipeline, json)
        }
        Commands::Sweep {
            region,
            budgets,
            tiled,
            pipeline,
        } => commands::sweep::execute(&region, &budgets, tiled, &pipeline),
        Commands::Status => commands::status::execute(cli.config.as_deref()),
    }
}
