// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pipeline memory footprint estimation.
//!
//! The planner treats the estimator as an external collaborator: given an
//! opaque pipeline handle and a candidate region, it returns the expected
//! peak memory, in bytes, of running the whole pipeline over exactly that
//! region. The estimate must depend only on its inputs, because the
//! division search compares repeated calls.
//!
//! Any `Fn(&P, &Region) -> usize` is an estimator, which keeps tests
//! short. [`ProfileEstimator`] is a reference implementation over a
//! [`PipelineProfile`].
//!
//! # Reference cost model
//!
//! A pipeline is a chain of stages, source first. Each stage buffers its
//! output for the region its consumer asks for, and asks its own producer
//! for that region grown by its neighbourhood radius (halo):
//!
//! ```text
//! requested(last)  = candidate
//! requested(k - 1) = grow(requested(k), halo(k))
//! footprint        = Σ_k  cells(requested(k)) × bytes_per_pixel(k)
//!                  + Σ_k  fixed_overhead(k)
//! ```
//!
//! Fixed overheads and halos are why per-split cost is not the whole-region
//! cost divided by the number of splits.

use raster_region::Region;

/// Estimates peak memory for running a pipeline over a region.
pub trait FootprintEstimator<P: ?Sized> {
    /// Returns the estimated peak footprint in bytes.
    fn estimate_footprint(&self, pipeline: &P, region: &Region) -> usize;
}

impl<P: ?Sized, F> FootprintEstimator<P> for F
where
    F: Fn(&P, &Region) -> usize,
{
    fn estimate_footprint(&self, pipeline: &P, region: &Region) -> usize {
        self(pipeline, region)
    }
}

/// One processing stage in a [`PipelineProfile`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StageProfile {
    /// Stage name, for diagnostics.
    pub name: String,
    /// Bytes buffered per output cell.
    pub bytes_per_pixel: usize,
    /// Neighbourhood radius read around each output cell on axes 0 and 1.
    #[serde(default)]
    pub halo_radius: usize,
    /// Region-independent memory: lookup tables, kernels, scratch buffers.
    #[serde(default)]
    pub fixed_overhead_bytes: usize,
}

/// Description of a processing graph, as seen by [`ProfileEstimator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PipelineProfile {
    pub name: String,
    /// Stages in execution order, source first.
    pub stages: Vec<StageProfile>,
}

impl PipelineProfile {
    /// Creates an empty pipeline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Appends a stage and returns the pipeline (builder style).
    ///
    /// # Examples
    /// ```
    /// use streaming_planner::PipelineProfile;
    /// let p = PipelineProfile::new("ndvi")
    ///     .stage("reader", 8, 0, 0)
    ///     .stage("smooth", 4, 2, 4096);
    /// assert_eq!(p.stages.len(), 2);
    /// ```
    pub fn stage(
        mut self,
        name: impl Into<String>,
        bytes_per_pixel: usize,
        halo_radius: usize,
        fixed_overhead_bytes: usize,
    ) -> Self {
        self.stages.push(StageProfile {
            name: name.into(),
            bytes_per_pixel,
            halo_radius,
            fixed_overhead_bytes,
        });
        self
    }

    /// Returns the sum of every stage's fixed overhead.
    pub fn fixed_overhead_bytes(&self) -> usize {
        self.stages
            .iter()
            .fold(0usize, |acc, s| acc.saturating_add(s.fixed_overhead_bytes))
    }
}

/// Estimates footprints from a [`PipelineProfile`] using the reference cost
/// model described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileEstimator;

impl ProfileEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl FootprintEstimator<PipelineProfile> for ProfileEstimator {
    fn estimate_footprint(&self, pipeline: &PipelineProfile, region: &Region) -> usize {
        let mut extents: Vec<u128> = region.size().iter().map(|&s| s as u128).collect();
        let mut total: u128 = pipeline.fixed_overhead_bytes() as u128;

        for stage in pipeline.stages.iter().rev() {
            let cells: u128 = extents.iter().product();
            total = total.saturating_add(cells.saturating_mul(stage.bytes_per_pixel as u128));
            let grow = 2 * stage.halo_radius as u128;
            for e in extents.iter_mut().take(2) {
                *e = e.saturating_add(grow);
            }
        }

        usize::try_from(total).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_estimator() {
        let per_cell = |bpp: &usize, r: &Region| r.volume() as usize * *bpp;
        let region = Region::from_xywh(0, 0, 10, 10);
        assert_eq!(per_cell.estimate_footprint(&4, &region), 400);
    }

    #[test]
    fn test_single_stage() {
        let p = PipelineProfile::new("copy").stage("reader", 4, 0, 100);
        let region = Region::from_xywh(0, 0, 10, 20);
        assert_eq!(ProfileEstimator.estimate_footprint(&p, &region), 10 * 20 * 4 + 100);
    }

    #[test]
    fn test_halo_grows_upstream_requests() {
        // reader buffers the region grown by smooth's halo; smooth buffers
        // exactly the candidate.
        let p = PipelineProfile::new("blur")
            .stage("reader", 2, 0, 0)
            .stage("smooth", 4, 1, 0);
        let region = Region::from_xywh(0, 0, 10, 10);
        let expected = 10 * 10 * 4 + 12 * 12 * 2;
        assert_eq!(ProfileEstimator.estimate_footprint(&p, &region), expected);
    }

    #[test]
    fn test_not_linear_in_region_size() {
        let p = PipelineProfile::new("lut")
            .stage("reader", 1, 0, 0)
            .stage("classify", 1, 3, 1_000_000);
        let whole = Region::from_xywh(0, 0, 100, 100);
        let half = Region::from_xywh(0, 0, 100, 50);
        let est = ProfileEstimator;
        assert!(est.estimate_footprint(&p, &half) > est.estimate_footprint(&p, &whole) / 2);
    }

    #[test]
    fn test_extra_axes_not_grown() {
        let p = PipelineProfile::new("bands")
            .stage("reader", 1, 0, 0)
            .stage("filter", 1, 1, 0);
        let region = Region::with_size(vec![4, 4, 3]).unwrap();
        // filter: 4*4*3, reader: 6*6*3
        assert_eq!(ProfileEstimator.estimate_footprint(&p, &region), 48 + 108);
    }

    #[test]
    fn test_monotone_in_region() {
        let p = PipelineProfile::new("p")
            .stage("a", 3, 2, 10)
            .stage("b", 5, 1, 20);
        let est = ProfileEstimator;
        let mut prev = 0;
        for h in 1..50 {
            let f = est.estimate_footprint(&p, &Region::from_xywh(0, 0, 30, h));
            assert!(f >= prev);
            prev = f;
        }
    }
}
