// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the streaming planner.

/// Errors that can occur while configuring or querying the planner.
///
/// Configuration errors are raised when a mode or parameter is set;
/// usage errors are programming mistakes on the caller's side. Use
/// [`is_config_error`](Self::is_config_error) and
/// [`is_usage_error`](Self::is_usage_error) to tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The number of lines per split must be positive.
    #[error("lines per split must be positive, got {0}")]
    InvalidLineCount(usize),

    /// Tile dimensions must both be positive.
    #[error("tile dimensions must be positive, got {width}x{height}")]
    InvalidTileDimension { width: usize, height: usize },

    /// Tile alignment must be positive.
    #[error("tile alignment must be positive, got {0}")]
    InvalidTileAlignment(usize),

    /// The safety bias must lie in `(0, 1]`.
    #[error("bias must lie in (0, 1], got {0}")]
    InvalidBias(f64),

    /// A configuration file or string was malformed.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// The memory budget could not be resolved.
    #[error("memory budget error: {0}")]
    Memory(#[from] memory_budget::MemoryError),

    /// No streaming mode has been selected.
    #[error("no streaming mode selected")]
    NotConfigured,

    /// Split queries were made before a successful preparation.
    #[error("streaming has not been prepared")]
    NotPrepared,

    /// A split index outside `[0, count)` was requested.
    #[error("split index {index} out of range: plan has {count} splits")]
    SplitIndexOutOfRange { index: usize, count: usize },

    /// The region has too few axes for the chosen splitter.
    #[error("splitter '{splitter}' needs a region with at least {required} axes, got {rank}")]
    UnsupportedRank {
        splitter: String,
        rank: usize,
        required: usize,
    },

    /// A region could not be built.
    #[error("region error: {0}")]
    Region(#[from] raster_region::RegionError),

    /// A produced split table broke the tiling invariant.
    #[error("invalid split table for '{mode}': {detail}")]
    InvalidPlan { mode: String, detail: String },
}

impl PlannerError {
    /// Returns `true` for errors raised while selecting a mode or parameter.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidLineCount(_)
                | Self::InvalidTileDimension { .. }
                | Self::InvalidTileAlignment(_)
                | Self::InvalidBias(_)
                | Self::InvalidConfig(_)
                | Self::Memory(_)
        )
    }

    /// Returns `true` for caller misuse: querying too early, bad indices,
    /// or regions the splitter cannot handle.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured
                | Self::NotPrepared
                | Self::SplitIndexOutOfRange { .. }
                | Self::UnsupportedRank { .. }
                | Self::Region(_)
        )
    }
}
