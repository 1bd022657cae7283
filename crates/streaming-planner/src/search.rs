// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optimal-division search for the budget-driven modes.
//!
//! Finds the smallest requested division count whose largest piece, as
//! estimated end to end through the pipeline, fits under the limit
//! (`budget × bias`).
//!
//! # Algorithm
//!
//! ```text
//! n = 1
//! loop:
//!     piece = splitter.split(0, n, region)      // first piece is the largest
//!     if estimate(piece) <= limit: break
//!     if n == ceiling: accept ceiling, report shortfall
//!     n = min(2n, ceiling)
//! bisect between the last failing n and the first fitting n
//! ```
//!
//! Both splitters shrink their pieces as `n` grows, so the fit predicate
//! is monotone and the bisection needs no backtracking. The ceiling is the
//! splitter's finest granularity, so the loop terminates for any estimator,
//! using `O(log ceiling)` estimator calls.

use crate::estimator::FootprintEstimator;
use crate::splitter::RegionSplitter;
use crate::PlannerError;
use raster_region::Region;
use std::cell::Cell;

/// Result of a division search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Division count to request from the splitter.
    pub requested: usize,
    /// Number of splits that request actually yields.
    pub num_splits: usize,
    /// Estimated footprint of the largest split.
    pub footprint_bytes: usize,
    /// `true` when even the finest granularity exceeds the limit.
    pub budget_exceeded: bool,
    /// Number of estimator invocations made.
    pub estimator_calls: usize,
}

/// Searches for the smallest division count that fits `limit_bytes`.
///
/// `region` must be non-empty. If nothing fits, the finest granularity is
/// returned with `budget_exceeded` set and a warning is logged; this is
/// not an error.
pub fn find_optimal_divisions<P, E, S>(
    splitter: &S,
    estimator: &E,
    pipeline: &P,
    region: &Region,
    limit_bytes: usize,
) -> Result<SearchOutcome, PlannerError>
where
    P: ?Sized,
    E: FootprintEstimator<P> + ?Sized,
    S: RegionSplitter + ?Sized,
{
    let ceiling = splitter.max_splits(region)?.max(1);
    let calls = Cell::new(0usize);
    let probe = |n: usize| -> Result<usize, PlannerError> {
        let piece = splitter.split(0, n, region)?;
        calls.set(calls.get() + 1);
        let bytes = estimator.estimate_footprint(pipeline, &piece);
        tracing::debug!(divisions = n, piece = %piece, bytes, limit_bytes, "probed division count");
        Ok(bytes)
    };

    // Exponential phase: find a fitting n, or hit the ceiling.
    let mut last_fail = 0usize;
    let mut n = 1usize;
    let mut fitting_bytes = loop {
        let bytes = probe(n)?;
        if bytes <= limit_bytes {
            break bytes;
        }
        if n >= ceiling {
            tracing::warn!(
                "budget of {limit_bytes} bytes is not attainable: finest granularity \
                 ({ceiling} splits) still needs {bytes} bytes per split; streaming anyway",
            );
            return Ok(SearchOutcome {
                requested: ceiling,
                num_splits: splitter.num_splits(region, ceiling)?,
                footprint_bytes: bytes,
                budget_exceeded: true,
                estimator_calls: calls.get(),
            });
        }
        last_fail = n;
        n = n.saturating_mul(2).min(ceiling);
    };

    // Bisection phase: smallest fitting n in (last_fail, n].
    let mut lo = last_fail;
    let mut hi = n;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        let bytes = probe(mid)?;
        if bytes <= limit_bytes {
            hi = mid;
            fitting_bytes = bytes;
        } else {
            lo = mid;
        }
    }

    Ok(SearchOutcome {
        requested: hi,
        num_splits: splitter.num_splits(region, hi)?,
        footprint_bytes: fitting_bytes,
        budget_exceeded: false,
        estimator_calls: calls.get(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::{StripSplitter, TileSplitter};

    /// One byte per cell plus a fixed overhead.
    fn cells_plus(overhead: usize) -> impl Fn(&(), &Region) -> usize {
        move |_: &(), r: &Region| r.volume() as usize + overhead
    }

    #[test]
    fn test_whole_region_fits() {
        let region = Region::from_xywh(0, 0, 100, 100);
        let out = find_optimal_divisions(
            &StripSplitter::new(),
            &cells_plus(0),
            &(),
            &region,
            10_000,
        )
        .unwrap();
        assert_eq!(out.requested, 1);
        assert_eq!(out.num_splits, 1);
        assert_eq!(out.estimator_calls, 1);
        assert!(!out.budget_exceeded);
    }

    #[test]
    fn test_finds_smallest_strip_count() {
        // 100 rows of 100 cells; limit 2_600 → strips of at most 26 rows.
        // ceil(100 / n) <= 26 first holds at n = 4.
        let region = Region::from_xywh(0, 0, 100, 100);
        let out = find_optimal_divisions(
            &StripSplitter::new(),
            &cells_plus(0),
            &(),
            &region,
            2_600,
        )
        .unwrap();
        assert_eq!(out.requested, 4);
        assert_eq!(out.num_splits, 4);
        assert_eq!(out.footprint_bytes, 2_500);
    }

    #[test]
    fn test_is_smallest_by_exhaustion() {
        let region = Region::from_xywh(0, 0, 37, 211);
        let est = cells_plus(500);
        let s = StripSplitter::new();
        for limit in [600, 1_000, 2_000, 5_000, 8_000] {
            let out = find_optimal_divisions(&s, &est, &(), &region, limit).unwrap();
            let brute = (1..=211)
                .find(|&n| est(&(), &s.split(0, n, &region).unwrap()) <= limit)
                .unwrap();
            assert_eq!(out.requested, brute, "limit {limit}");
        }
    }

    #[test]
    fn test_shortfall_accepts_finest() {
        let region = Region::from_xywh(0, 0, 50, 64);
        let out = find_optimal_divisions(
            &StripSplitter::new(),
            &cells_plus(1_000_000),
            &(),
            &region,
            10,
        )
        .unwrap();
        assert!(out.budget_exceeded);
        assert_eq!(out.requested, 64);
        assert_eq!(out.num_splits, 64);
    }

    #[test]
    fn test_terminates_against_hostile_estimator() {
        let region = Region::from_xywh(0, 0, 5000, 5000);
        let calls = Cell::new(0usize);
        let always_too_big = |_: &(), _: &Region| {
            calls.set(calls.get() + 1);
            usize::MAX
        };
        let out = find_optimal_divisions(
            &TileSplitter::auto(1),
            &always_too_big,
            &(),
            &region,
            1,
        )
        .unwrap();
        assert!(out.budget_exceeded);
        assert_eq!(out.num_splits, 25_000_000);
        // 1, 2, 4, ... up to the ceiling of 25M: 26 probes.
        assert!(calls.get() <= 26, "made {} calls", calls.get());
        assert_eq!(calls.get(), out.estimator_calls);
    }

    #[test]
    fn test_call_count_is_logarithmic() {
        let region = Region::from_xywh(0, 0, 10, 100_000);
        let out = find_optimal_divisions(
            &StripSplitter::new(),
            &cells_plus(0),
            &(),
            &region,
            1_230,
        )
        .unwrap();
        // ceil(100_000 / n) * 10 <= 1_230 → n >= 813.
        assert_eq!(out.requested, 814);
        assert!(out.estimator_calls <= 2 * 17 + 2);
    }

    #[test]
    fn test_tile_search() {
        let region = Region::from_xywh(0, 0, 1024, 1024);
        let out = find_optimal_divisions(
            &TileSplitter::auto(1),
            &cells_plus(0),
            &(),
            &region,
            256 * 256,
        )
        .unwrap();
        assert!(!out.budget_exceeded);
        assert!(out.footprint_bytes <= 256 * 256);
        assert_eq!(out.num_splits, 16);
    }
}
