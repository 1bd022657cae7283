// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for region construction.

/// Errors that can occur when building or combining regions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    /// Origin and size disagree on the number of axes.
    #[error("rank mismatch: origin has {origin_rank} axes, size has {size_rank}")]
    RankMismatch {
        origin_rank: usize,
        size_rank: usize,
    },

    /// A region must have at least one axis.
    #[error("a region needs at least one axis")]
    ZeroRank,

    /// `origin + size` does not fit in the signed index space.
    #[error("region overflows the index space on axis {axis}: origin {origin}, size {size}")]
    Overflow { axis: usize, origin: i64, size: usize },
}
