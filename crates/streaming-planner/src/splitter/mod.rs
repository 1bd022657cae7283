// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`RegionSplitter`] trait and its strip and tile implementations.

pub mod strip;
pub mod tile;

use crate::PlannerError;
use raster_region::Region;

pub use strip::StripSplitter;
pub use tile::TileSplitter;

/// Decomposes a region into disjoint pieces whose union is the region.
///
/// For a fixed region and requested count, the mapping from index to
/// piece is a pure function, so callers may memoise it. Splitters are
/// purely geometric: no I/O, no estimator calls.
pub trait RegionSplitter {
    /// Human-readable name of this splitter.
    fn name(&self) -> &str;

    /// Returns how many pieces a request for `requested` pieces actually
    /// yields. Zero for an empty region.
    fn num_splits(&self, region: &Region, requested: usize) -> Result<usize, PlannerError>;

    /// Returns piece `index` of the decomposition into
    /// [`num_splits`](Self::num_splits) pieces.
    ///
    /// `index` outside `[0, num_splits)` is an error, never clamped.
    fn split(&self, index: usize, requested: usize, region: &Region) -> Result<Region, PlannerError>;

    /// Returns the number of pieces at the finest granularity this
    /// splitter can produce. Bounds the division search.
    fn max_splits(&self, region: &Region) -> Result<usize, PlannerError>;
}

/// The closed set of splitters the planner dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Splitter {
    Strip(StripSplitter),
    Tile(TileSplitter),
}

impl RegionSplitter for Splitter {
    fn name(&self) -> &str {
        match self {
            Self::Strip(s) => s.name(),
            Self::Tile(t) => t.name(),
        }
    }

    fn num_splits(&self, region: &Region, requested: usize) -> Result<usize, PlannerError> {
        match self {
            Self::Strip(s) => s.num_splits(region, requested),
            Self::Tile(t) => t.num_splits(region, requested),
        }
    }

    fn split(&self, index: usize, requested: usize, region: &Region) -> Result<Region, PlannerError> {
        match self {
            Self::Strip(s) => s.split(index, requested, region),
            Self::Tile(t) => t.split(index, requested, region),
        }
    }

    fn max_splits(&self, region: &Region) -> Result<usize, PlannerError> {
        match self {
            Self::Strip(s) => s.max_splits(region),
            Self::Tile(t) => t.max_splits(region),
        }
    }
}

/// Collects every piece of a decomposition, in index order.
pub fn split_all(
    splitter: &dyn RegionSplitter,
    region: &Region,
    requested: usize,
) -> Result<Vec<Region>, PlannerError> {
    let n = splitter.num_splits(region, requested)?;
    (0..n)
        .map(|i| splitter.split(i, requested, region))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_util {
    use raster_region::Region;

    /// Asserts the tiling invariant cell by cell on a small region.
    pub fn assert_exact_cover(region: &Region, splits: &[Region]) {
        assert_eq!(region.rank(), 2, "helper handles 2-D regions only");
        let (x0, y0) = (region.origin()[0], region.origin()[1]);
        for y in y0..y0 + region.height() as i64 {
            for x in x0..x0 + region.width() as i64 {
                let owners = splits.iter().filter(|s| s.contains_index(&[x, y])).count();
                assert_eq!(owners, 1, "cell ({x}, {y}) covered {owners} times");
            }
        }
        for s in splits {
            assert!(s.is_inside(region), "{s} escapes {region}");
            assert!(!s.is_empty(), "empty split {s}");
        }
    }
}
