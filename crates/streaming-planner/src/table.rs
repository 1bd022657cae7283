// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Split table: the output of the streaming planner.
//!
//! A table is the ordered list of regions produced by one preparation.
//! Once built it is never mutated; the manager hands it out behind an
//! `Arc`, so workers processing splits in parallel can hold it while the
//! manager is reconfigured and re-prepared.

use crate::PlannerError;
use raster_region::Region;

/// Cap on boundary-grid cells for the linear coverage check, unless the
/// split count is larger.
const GRID_CELL_LIMIT: usize = 1 << 20;

/// The memoised result of a preparation.
///
/// Fields are read through accessors; only the planner builds tables.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SplitTable {
    mode: String,
    region: Region,
    splits: Vec<Region>,
    budget_bytes: Option<usize>,
    limit_bytes: Option<usize>,
    estimated_footprint_bytes: Option<usize>,
    budget_exceeded: bool,
}

impl SplitTable {
    /// Name of the streaming mode that produced this table.
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// The prepared region.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Splits in index order.
    pub fn splits(&self) -> &[Region] {
        &self.splits
    }

    /// Resolved budget in bytes, for budget-driven modes.
    pub fn budget_bytes(&self) -> Option<usize> {
        self.budget_bytes
    }

    /// Budget after the safety bias, for budget-driven modes.
    pub fn limit_bytes(&self) -> Option<usize> {
        self.limit_bytes
    }

    /// Estimated footprint of the largest split, for budget-driven modes.
    pub fn estimated_footprint_bytes(&self) -> Option<usize> {
        self.estimated_footprint_bytes
    }

    /// `true` when even the finest granularity exceeded the limit.
    pub fn budget_exceeded(&self) -> bool {
        self.budget_exceeded
    }

    /// Returns the number of splits.
    pub fn num_splits(&self) -> usize {
        self.splits.len()
    }

    /// Returns `true` if there is nothing to process.
    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Returns split `index`.
    pub fn get(&self, index: usize) -> Result<&Region, PlannerError> {
        self.splits
            .get(index)
            .ok_or(PlannerError::SplitIndexOutOfRange {
                index,
                count: self.splits.len(),
            })
    }

    /// Iterates over the splits in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.splits.iter()
    }

    /// Checks the tiling invariant.
    ///
    /// Checks:
    /// - An empty region has no splits; a non-empty one has at least one.
    /// - Every split is non-empty, has the region's rank, and lies inside it.
    /// - Every cell of the region belongs to exactly one split.
    ///
    /// Coverage is checked on the grid formed by all split boundaries, which
    /// for strip and tile layouts has one cell per split. Layouts whose
    /// boundary grid is much larger fall back to a sweep along axis 0.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.region.is_empty() {
            if !self.splits.is_empty() {
                return Err(self.invalid(format!(
                    "empty region has {} splits",
                    self.splits.len()
                )));
            }
            return Ok(());
        }
        if self.splits.is_empty() {
            return Err(self.invalid("non-empty region has no splits".to_string()));
        }

        for (i, split) in self.splits.iter().enumerate() {
            if split.is_empty() {
                return Err(self.invalid(format!("split {i} is empty")));
            }
            if !split.is_inside(&self.region) {
                return Err(self.invalid(format!("split {i} ({split}) escapes the region")));
            }
        }

        self.check_cover(GRID_CELL_LIMIT.max(4 * self.splits.len()))
    }

    fn check_cover(&self, grid_cell_limit: usize) -> Result<(), PlannerError> {
        let rank = self.region.rank();
        let bounds: Vec<Vec<i64>> = (0..rank)
            .map(|axis| {
                let mut b: Vec<i64> = self
                    .splits
                    .iter()
                    .flat_map(|r| [r.origin()[axis], end(r, axis)])
                    .chain([self.region.origin()[axis], end(&self.region, axis)])
                    .collect();
                b.sort_unstable();
                b.dedup();
                b
            })
            .collect();

        let cells = bounds
            .iter()
            .try_fold(1usize, |acc, b| acc.checked_mul(b.len() - 1))
            .filter(|&c| c <= grid_cell_limit);
        match cells {
            Some(cells) => self.check_cover_on_grid(&bounds, cells),
            None => self.check_cover_by_sweep(),
        }
    }

    /// Marks each boundary-grid cell with the split covering it.
    fn check_cover_on_grid(&self, bounds: &[Vec<i64>], cells: usize) -> Result<(), PlannerError> {
        const FREE: usize = usize::MAX;
        let rank = bounds.len();
        let mut strides = vec![1usize; rank];
        for axis in 1..rank {
            strides[axis] = strides[axis - 1] * (bounds[axis - 1].len() - 1);
        }

        let mut owner = vec![FREE; cells];
        for (k, split) in self.splits.iter().enumerate() {
            let lo: Vec<usize> = (0..rank)
                .map(|a| bounds[a].partition_point(|&b| b < split.origin()[a]))
                .collect();
            let hi: Vec<usize> = (0..rank)
                .map(|a| bounds[a].partition_point(|&b| b < end(split, a)))
                .collect();

            // Odometer over the split's box of grid cells.
            let mut idx = lo.clone();
            'cells: loop {
                let cell: usize = idx.iter().zip(&strides).map(|(i, s)| i * s).sum();
                if owner[cell] != FREE {
                    return Err(self.invalid(format!("splits {} and {k} overlap", owner[cell])));
                }
                owner[cell] = k;

                let mut axis = 0;
                loop {
                    if axis == rank {
                        break 'cells;
                    }
                    idx[axis] += 1;
                    if idx[axis] < hi[axis] {
                        break;
                    }
                    idx[axis] = lo[axis];
                    axis += 1;
                }
            }
        }

        if let Some(cell) = owner.iter().position(|&o| o == FREE) {
            let corner: Vec<i64> = (0..rank)
                .map(|a| bounds[a][(cell / strides[a]) % (bounds[a].len() - 1)])
                .collect();
            return Err(self.invalid(format!("cells at {corner:?} are not covered")));
        }
        Ok(())
    }

    /// Sorts splits along axis 0 and compares each only with the splits
    /// still open at its start, then checks volumes for gaps.
    fn check_cover_by_sweep(&self) -> Result<(), PlannerError> {
        let mut order: Vec<usize> = (0..self.splits.len()).collect();
        order.sort_unstable_by_key(|&i| self.splits[i].origin()[0]);

        let mut open: Vec<usize> = Vec::new();
        for &j in &order {
            let b = &self.splits[j];
            open.retain(|&i| end(&self.splits[i], 0) > b.origin()[0]);
            if let Some(&i) = open.iter().find(|&&i| self.splits[i].intersects(b)) {
                return Err(self.invalid(format!("splits {} and {} overlap", i.min(j), i.max(j))));
            }
            open.push(j);
        }

        let covered: u128 = self.splits.iter().map(Region::volume).sum();
        if covered != self.region.volume() {
            return Err(self.invalid(format!(
                "splits cover {covered} cells, region has {}",
                self.region.volume()
            )));
        }
        Ok(())
    }

    fn invalid(&self, detail: String) -> PlannerError {
        PlannerError::InvalidPlan {
            mode: self.mode.clone(),
            detail,
        }
    }

    /// Returns a human-readable summary of the table.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "Plan '{}': {} splits over {}",
            self.mode,
            self.num_splits(),
            self.region,
        );
        if let Some(first) = self.splits.first() {
            s.push_str(&format!(", largest {first}"));
        }
        if let (Some(budget), Some(limit), Some(est)) = (
            self.budget_bytes,
            self.limit_bytes,
            self.estimated_footprint_bytes,
        ) {
            let mb = |b: usize| b as f64 / (1024.0 * 1024.0);
            s.push_str(&format!(
                ", est. {:.2} MB/split vs limit {:.2} MB (budget {:.2} MB)",
                mb(est),
                mb(limit),
                mb(budget),
            ));
        }
        if self.budget_exceeded {
            s.push_str(", BUDGET EXCEEDED at finest granularity");
        }
        s
    }
}

/// Exclusive upper bound of `region` on `axis`.
fn end(region: &Region, axis: usize) -> i64 {
    region.origin()[axis].saturating_add(region.size()[axis] as i64)
}

impl<'a> IntoIterator for &'a SplitTable {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.splits.iter()
    }
}

/// Builder helper for constructing a `SplitTable`.
///
/// Used internally by the manager.
pub(crate) struct SplitTableBuilder {
    mode: String,
    region: Region,
    splits: Vec<Region>,
    budget_bytes: Option<usize>,
    limit_bytes: Option<usize>,
    estimated_footprint_bytes: Option<usize>,
    budget_exceeded: bool,
}

impl SplitTableBuilder {
    pub fn new(mode: &str, region: &Region) -> Self {
        Self {
            mode: mode.to_string(),
            region: region.clone(),
            splits: Vec::new(),
            budget_bytes: None,
            limit_bytes: None,
            estimated_footprint_bytes: None,
            budget_exceeded: false,
        }
    }

    pub fn splits(mut self, splits: Vec<Region>) -> Self {
        self.splits = splits;
        self
    }

    /// Records the budget accounting of a search.
    pub fn budget(
        mut self,
        budget_bytes: usize,
        limit_bytes: usize,
        estimated_footprint_bytes: usize,
        budget_exceeded: bool,
    ) -> Self {
        self.budget_bytes = Some(budget_bytes);
        self.limit_bytes = Some(limit_bytes);
        self.estimated_footprint_bytes = Some(estimated_footprint_bytes);
        self.budget_exceeded = budget_exceeded;
        self
    }

    pub fn build(self) -> SplitTable {
        SplitTable {
            mode: self.mode,
            region: self.region,
            splits: self.splits,
            budget_bytes: self.budget_bytes,
            limit_bytes: self.limit_bytes,
            estimated_footprint_bytes: self.estimated_footprint_bytes,
            budget_exceeded: self.budget_exceeded,
        }
    }
}
