// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tile splitter: a 2-D grid of rectangular blocks.
//!
//! Tiles cover axes 0 and 1 (`x`, `y`); any further axes are kept whole in
//! every tile. A one-axis region is tiled along `x` only.
//!
//! # Tile size
//!
//! - **Fixed**: an explicit `width × height`. The request count is ignored.
//! - **Auto**: the nominal edge is chosen so that the grid has roughly
//!   `requested` tiles:
//!
//!   ```text
//!   edge = ceil(sqrt(W × H / requested))
//!   ```
//!
//!   When the edge would exceed the region's height (or width), tiles span
//!   that whole axis and the other axis is divided instead. The edge is then
//!   rounded up to a multiple of the alignment. The nominal edge never grows
//!   as `requested` grows.
//!
//! # Enumeration
//!
//! Row-major: `row = i / columns`, `col = i % columns`. Tiles in the last
//! row and column are clipped to the region.

use crate::splitter::RegionSplitter;
use crate::PlannerError;
use raster_region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TileSize {
    Fixed { width: usize, height: usize },
    Auto { alignment: usize },
}

/// Splits a region into a row-major grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSplitter {
    tile: TileSize,
}

/// Geometry of one tiling: nominal tile size and grid shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grid {
    tile_width: usize,
    tile_height: usize,
    columns: usize,
    rows: usize,
}

impl Grid {
    fn len(&self) -> usize {
        self.columns * self.rows
    }
}

impl TileSplitter {
    /// Tiles of an explicit size. Zero dimensions are raised to one.
    pub fn fixed(width: usize, height: usize) -> Self {
        Self {
            tile: TileSize::Fixed {
                width: width.max(1),
                height: height.max(1),
            },
        }
    }

    /// Tiles sized from the requested count, edges rounded up to a multiple
    /// of `alignment` (`1` for none).
    pub fn auto(alignment: usize) -> Self {
        Self {
            tile: TileSize::Auto {
                alignment: alignment.max(1),
            },
        }
    }

    /// Returns the nominal `(width, height)` for a request.
    pub fn tile_size(&self, region: &Region, requested: usize) -> (usize, usize) {
        let (w_ext, h_ext) = (region.width(), region.height());
        match self.tile {
            TileSize::Fixed { width, height } => (width, height),
            TileSize::Auto { alignment } => {
                let n = requested.max(1);
                let area = w_ext as f64 * h_ext as f64;
                let edge = ((area / n as f64).sqrt().ceil() as usize).max(1);
                let (w, h) = if edge >= h_ext {
                    (w_ext.div_ceil(n), h_ext)
                } else if edge >= w_ext {
                    (w_ext, h_ext.div_ceil(n))
                } else {
                    (edge, edge)
                };
                (
                    align_up(w, alignment).clamp(1, w_ext.max(1)),
                    align_up(h, alignment).clamp(1, h_ext.max(1)),
                )
            }
        }
    }

    fn check_rank(&self, region: &Region) -> Result<(), PlannerError> {
        if region.rank() == 0 {
            return Err(PlannerError::UnsupportedRank {
                splitter: self.name().to_string(),
                rank: 0,
                required: 1,
            });
        }
        Ok(())
    }

    fn grid(&self, region: &Region, requested: usize) -> Result<Grid, PlannerError> {
        self.check_rank(region)?;
        let (tile_width, tile_height) = self.tile_size(region, requested);
        if region.is_empty() {
            return Ok(Grid {
                tile_width,
                tile_height,
                columns: 0,
                rows: 0,
            });
        }
        Ok(Grid {
            tile_width,
            tile_height,
            columns: region.width().div_ceil(tile_width),
            rows: region.height().div_ceil(tile_height),
        })
    }
}

/// Rounds `value` up to the next multiple of `alignment`.
fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment).saturating_mul(alignment)
}

impl RegionSplitter for TileSplitter {
    fn name(&self) -> &str {
        "tile"
    }

    fn num_splits(&self, region: &Region, requested: usize) -> Result<usize, PlannerError> {
        Ok(self.grid(region, requested)?.len())
    }

    fn split(&self, index: usize, requested: usize, region: &Region) -> Result<Region, PlannerError> {
        let grid = self.grid(region, requested)?;
        if index >= grid.len() {
            return Err(PlannerError::SplitIndexOutOfRange {
                index,
                count: grid.len(),
            });
        }

        let row = index / grid.columns;
        let col = index % grid.columns;

        let x_off = col * grid.tile_width;
        let width = grid.tile_width.min(region.width() - x_off);
        let mut tile = region.with_axis(0, region.origin()[0] + x_off as i64, width);

        if region.rank() >= 2 {
            let y_off = row * grid.tile_height;
            let height = grid.tile_height.min(region.height() - y_off);
            tile = tile.with_axis(1, region.origin()[1] + y_off as i64, height);
        }
        Ok(tile)
    }

    fn max_splits(&self, region: &Region) -> Result<usize, PlannerError> {
        self.check_rank(region)?;
        if region.is_empty() {
            return Ok(0);
        }
        let (w, h) = match self.tile {
            TileSize::Fixed { width, height } => (width, height),
            TileSize::Auto { alignment } => (alignment, alignment),
        };
        Ok(region
            .width()
            .div_ceil(w)
            .saturating_mul(region.height().div_ceil(h)))
    }
}
