// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Strip splitter: contiguous bands along one axis.
//!
//! By default the split axis is the slowest varying one (rows of a 2-D
//! image), so each strip is a run of whole lines.
//!
//! # Band layouts
//!
//! - **Balanced** (default): `requested` bands whose heights differ by at
//!   most one. The first `extent % n` bands get the extra line:
//!
//!   ```text
//!   extent = 10, n = 4  →  3, 3, 2, 2
//!   ```
//!
//!   A request for more bands than lines is clamped to one line per band.
//!
//! - **Fixed height**: every band has exactly `lines_per_strip` lines
//!   except the last, which takes the remainder. The requested count is
//!   ignored; the count is `ceil(extent / lines_per_strip)`.

use crate::splitter::RegionSplitter;
use crate::PlannerError;
use raster_region::Region;

/// Splits a region into contiguous bands along a single axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripSplitter {
    /// Split axis; `None` means the last axis of whatever region is split.
    axis: Option<usize>,
    /// Fixed band height, or `None` for balanced bands.
    lines_per_strip: Option<usize>,
}

impl StripSplitter {
    /// Balanced bands along the last axis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed-height bands along the last axis.
    pub fn with_lines_per_strip(lines: usize) -> Self {
        Self {
            axis: None,
            lines_per_strip: Some(lines.max(1)),
        }
    }

    /// Splits along an explicit axis instead of the last one.
    pub fn along_axis(mut self, axis: usize) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Returns the fixed band height, if any.
    pub fn lines_per_strip(&self) -> Option<usize> {
        self.lines_per_strip
    }

    fn resolve_axis(&self, region: &Region) -> Result<usize, PlannerError> {
        let axis = self.axis.unwrap_or(region.rank().saturating_sub(1));
        if axis >= region.rank() {
            return Err(PlannerError::UnsupportedRank {
                splitter: self.name().to_string(),
                rank: region.rank(),
                required: axis + 1,
            });
        }
        Ok(axis)
    }

    /// Returns `(offset, length)` of band `index` out of `n` along an
    /// axis of length `extent`.
    fn band(&self, index: usize, n: usize, extent: usize) -> (usize, usize) {
        match self.lines_per_strip {
            Some(lines) => {
                let start = index * lines;
                (start, lines.min(extent - start))
            }
            None => {
                let base = extent / n;
                let rem = extent % n;
                let start = index * base + index.min(rem);
                let len = base + usize::from(index < rem);
                (start, len)
            }
        }
    }
}

impl RegionSplitter for StripSplitter {
    fn name(&self) -> &str {
        "strip"
    }

    fn num_splits(&self, region: &Region, requested: usize) -> Result<usize, PlannerError> {
        let axis = self.resolve_axis(region)?;
        if region.is_empty() {
            return Ok(0);
        }
        let extent = region.size()[axis];
        Ok(match self.lines_per_strip {
            Some(lines) => extent.div_ceil(lines),
            None => requested.clamp(1, extent),
        })
    }

    fn split(&self, index: usize, requested: usize, region: &Region) -> Result<Region, PlannerError> {
        let n = self.num_splits(region, requested)?;
        if index >= n {
            return Err(PlannerError::SplitIndexOutOfRange { index, count: n });
        }
        let axis = self.resolve_axis(region)?;
        let extent = region.size()[axis];
        let (offset, len) = self.band(index, n, extent);
        Ok(region.with_axis(axis, region.origin()[axis] + offset as i64, len))
    }

    fn max_splits(&self, region: &Region) -> Result<usize, PlannerError> {
        let axis = self.resolve_axis(region)?;
        if region.is_empty() {
            return Ok(0);
        }
        let extent = region.size()[axis];
        Ok(match self.lines_per_strip {
            Some(lines) => extent.div_ceil(lines),
            None => extent,
        })
    }
}
