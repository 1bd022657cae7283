// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The streaming manager: mode selection, preparation, and split queries.
//!
//! # State Machine
//!
//! ```text
//!                  set_mode / set_bias
//!  Unconfigured ─────────────────────────► Configured(mode)
//!                                            │      ▲
//!                         prepare_streaming  │      │  set_mode / set_bias
//!                                            ▼      │
//!                                   Prepared(mode, Arc<SplitTable>)
//! ```
//!
//! Selecting a mode or bias from any state discards the prepared table.
//! Preparing again replaces it. Split queries outside `Prepared` are usage
//! errors.

use crate::estimator::FootprintEstimator;
use crate::search::find_optimal_divisions;
use crate::splitter::{split_all, RegionSplitter, Splitter, StripSplitter, TileSplitter};
use crate::table::{SplitTable, SplitTableBuilder};
use crate::{PlannerError, StreamingMode};
use memory_budget::{MemoryBudget, MemorySource, RamHint};
use raster_region::Region;
use std::sync::Arc;

/// Default safety factor applied to budgets.
///
/// Leaves a quarter of the budget as headroom for estimation error and
/// memory the pipeline uses outside the streamed buffers.
pub const DEFAULT_BIAS: f64 = 0.75;

#[derive(Debug, Clone)]
enum PlannerState {
    Unconfigured,
    Configured(StreamingMode),
    Prepared {
        mode: StreamingMode,
        table: Arc<SplitTable>,
    },
}

/// Plans the decomposition of a region into memory-bounded splits.
///
/// # Example
/// ```
/// use memory_budget::{FixedMemory, MemoryBudget};
/// use raster_region::Region;
/// use streaming_planner::{StreamingManager, StreamingMode};
///
/// let mut manager = StreamingManager::with_memory_source(FixedMemory::new(MemoryBudget::from_mb(64)));
/// manager.set_mode(StreamingMode::stripped_by_line_count(100)).unwrap();
///
/// let no_estimate = |_: &(), _: &Region| 0usize;
/// let n = manager
///     .prepare_streaming(&no_estimate, &(), &Region::from_xywh(0, 0, 1000, 500))
///     .unwrap();
/// assert_eq!(n, 5);
/// assert_eq!(manager.split(4).unwrap(), Region::from_xywh(0, 400, 1000, 100));
/// ```
pub struct StreamingManager {
    state: PlannerState,
    bias: f64,
    memory: Box<dyn MemorySource>,
}

impl std::fmt::Debug for StreamingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingManager")
            .field("state", &self.state)
            .field("bias", &self.bias)
            .field("memory", &self.memory.name())
            .finish()
    }
}

impl Default for StreamingManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingManager {
    /// Creates a manager in the default mode, resolving auto budgets from
    /// the process-wide [`RamHint`].
    pub fn new() -> Self {
        Self::with_memory_source(RamHint::new())
    }

    /// Creates a manager in the default mode with an injected memory source.
    pub fn with_memory_source(source: impl MemorySource + 'static) -> Self {
        Self {
            state: PlannerState::Configured(StreamingMode::default()),
            bias: DEFAULT_BIAS,
            memory: Box::new(source),
        }
    }

    /// Creates a manager with no mode selected.
    pub fn unconfigured(source: impl MemorySource + 'static) -> Self {
        Self {
            state: PlannerState::Unconfigured,
            bias: DEFAULT_BIAS,
            memory: Box::new(source),
        }
    }

    // ── Configuration ──────────────────────────────────────────

    /// Selects a streaming mode, discarding any prepared plan.
    ///
    /// The parameter is validated here; an invalid mode leaves the manager
    /// untouched.
    pub fn set_mode(&mut self, mode: StreamingMode) -> Result<(), PlannerError> {
        mode.validate()?;
        tracing::debug!(mode = %mode, "streaming mode selected");
        self.state = PlannerState::Configured(mode);
        Ok(())
    }

    /// Budget-driven strips. A zero budget means "use the memory source".
    pub fn set_stripped_budget_mode(&mut self, budget: MemoryBudget) -> Result<(), PlannerError> {
        self.set_mode(StreamingMode::stripped_by_budget(budget))
    }

    /// Strips of `lines_per_split` lines.
    pub fn set_stripped_line_count_mode(&mut self, lines_per_split: usize) -> Result<(), PlannerError> {
        self.set_mode(StreamingMode::stripped_by_line_count(lines_per_split))
    }

    /// Budget-driven tiles. A zero budget means "use the memory source".
    pub fn set_tiled_budget_mode(&mut self, budget: MemoryBudget) -> Result<(), PlannerError> {
        self.set_mode(StreamingMode::tiled_by_budget(budget))
    }

    /// Tiles of an explicit size.
    pub fn set_tiled_dimension_mode(&mut self, width: usize, height: usize) -> Result<(), PlannerError> {
        self.set_mode(StreamingMode::tiled_by_dimension(width, height))
    }

    /// Sets the safety factor applied to budgets, in `(0, 1]`.
    ///
    /// Discards any prepared plan, since the plan depends on it.
    pub fn set_bias(&mut self, bias: f64) -> Result<(), PlannerError> {
        if !(bias > 0.0 && bias <= 1.0) {
            return Err(PlannerError::InvalidBias(bias));
        }
        self.bias = bias;
        if let PlannerState::Prepared { mode, .. } = &self.state {
            self.state = PlannerState::Configured(*mode);
        }
        Ok(())
    }

    /// Returns the safety factor applied to budgets.
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Returns the selected mode, if any.
    pub fn mode(&self) -> Option<&StreamingMode> {
        match &self.state {
            PlannerState::Unconfigured => None,
            PlannerState::Configured(mode) | PlannerState::Prepared { mode, .. } => Some(mode),
        }
    }

    /// Returns `true` once a plan is available.
    pub fn is_prepared(&self) -> bool {
        matches!(self.state, PlannerState::Prepared { .. })
    }

    /// Returns the name of the memory source used for auto budgets.
    pub fn memory_source_name(&self) -> &str {
        self.memory.name()
    }

    // ── Preparation ────────────────────────────────────────────

    /// Computes the split table for `region` under the current mode.
    ///
    /// `pipeline` is passed through to `estimator` untouched, and only in
    /// budget-driven modes. Any previous table is discarded first, so a
    /// failed preparation leaves the manager `Configured`.
    ///
    /// Returns the number of splits; zero for an empty region.
    pub fn prepare_streaming<P, E>(
        &mut self,
        estimator: &E,
        pipeline: &P,
        region: &Region,
    ) -> Result<usize, PlannerError>
    where
        P: ?Sized,
        E: FootprintEstimator<P> + ?Sized,
    {
        let mode = match &self.state {
            PlannerState::Unconfigured => return Err(PlannerError::NotConfigured),
            PlannerState::Configured(mode) | PlannerState::Prepared { mode, .. } => *mode,
        };
        self.state = PlannerState::Configured(mode);

        let table = self.plan(mode, estimator, pipeline, region)?;

        if cfg!(debug_assertions) {
            table.validate()?;
        }

        tracing::info!("{}", table.summary());
        let n = table.num_splits();
        self.state = PlannerState::Prepared {
            mode,
            table: Arc::new(table),
        };
        Ok(n)
    }

    fn plan<P, E>(
        &self,
        mode: StreamingMode,
        estimator: &E,
        pipeline: &P,
        region: &Region,
    ) -> Result<SplitTable, PlannerError>
    where
        P: ?Sized,
        E: FootprintEstimator<P> + ?Sized,
    {
        let builder = SplitTableBuilder::new(mode.name(), region);

        match mode {
            StreamingMode::StrippedByLineCount { lines_per_split } => {
                let splitter = StripSplitter::with_lines_per_strip(lines_per_split);
                let requested = splitter.max_splits(region)?;
                Ok(builder.splits(split_all(&splitter, region, requested)?).build())
            }
            StreamingMode::TiledByDimension {
                tile_width,
                tile_height,
            } => {
                let splitter = TileSplitter::fixed(tile_width, tile_height);
                let requested = splitter.max_splits(region)?;
                Ok(builder.splits(split_all(&splitter, region, requested)?).build())
            }
            StreamingMode::StrippedByBudget { budget } => self.plan_by_budget(
                builder,
                Splitter::Strip(StripSplitter::new()),
                budget,
                estimator,
                pipeline,
                region,
            ),
            StreamingMode::TiledByBudget {
                budget,
                tile_alignment,
            } => self.plan_by_budget(
                builder,
                Splitter::Tile(TileSplitter::auto(tile_alignment)),
                budget,
                estimator,
                pipeline,
                region,
            ),
        }
    }

    fn plan_by_budget<P, E>(
        &self,
        builder: SplitTableBuilder,
        splitter: Splitter,
        budget: MemoryBudget,
        estimator: &E,
        pipeline: &P,
        region: &Region,
    ) -> Result<SplitTable, PlannerError>
    where
        P: ?Sized,
        E: FootprintEstimator<P> + ?Sized,
    {
        // Validate the splitter against the region even when it is empty.
        splitter.max_splits(region)?;
        if region.is_empty() {
            return Ok(builder.build());
        }

        let budget = budget.resolve(self.memory.as_ref())?;
        let limit_bytes = budget.scaled(self.bias);
        let outcome = find_optimal_divisions(&splitter, estimator, pipeline, region, limit_bytes)?;

        tracing::debug!(
            splitter = splitter.name(),
            requested = outcome.requested,
            splits = outcome.num_splits,
            calls = outcome.estimator_calls,
            "division search finished",
        );

        let splits = split_all(&splitter, region, outcome.requested)?;
        Ok(builder
            .splits(splits)
            .budget(
                budget.as_bytes(),
                limit_bytes,
                outcome.footprint_bytes,
                outcome.budget_exceeded,
            )
            .build())
    }

    // ── Queries ────────────────────────────────────────────────

    /// Returns the shared, immutable table from the last preparation.
    pub fn split_table(&self) -> Result<Arc<SplitTable>, PlannerError> {
        match &self.state {
            PlannerState::Unconfigured => Err(PlannerError::NotConfigured),
            PlannerState::Configured(_) => Err(PlannerError::NotPrepared),
            PlannerState::Prepared { table, .. } => Ok(Arc::clone(table)),
        }
    }

    /// Returns the number of splits from the last preparation.
    pub fn number_of_splits(&self) -> Result<usize, PlannerError> {
        self.with_table(|t| Ok(t.num_splits()))
    }

    /// Returns split `index` from the last preparation.
    pub fn split(&self, index: usize) -> Result<Region, PlannerError> {
        self.with_table(|t| t.get(index).cloned())
    }

    fn with_table<T>(
        &self,
        f: impl FnOnce(&SplitTable) -> Result<T, PlannerError>,
    ) -> Result<T, PlannerError> {
        match &self.state {
            PlannerState::Unconfigured => Err(PlannerError::NotConfigured),
            PlannerState::Configured(_) => Err(PlannerError::NotPrepared),
            PlannerState::Prepared { table, .. } => f(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_budget::FixedMemory;

    fn manager() -> StreamingManager {
        StreamingManager::with_memory_source(FixedMemory::new(MemoryBudget::from_mb(1)))
    }

    /// One byte per cell.
    fn cells(_: &(), r: &Region) -> usize {
        r.volume() as usize
    }

    #[test]
    fn test_default_mode_is_conservative() {
        let m = manager();
        assert_eq!(m.mode(), Some(&StreamingMode::default()));
        assert_eq!(m.bias(), DEFAULT_BIAS);
        assert!(!m.is_prepared());
    }

    #[test]
    fn test_queries_before_prepare_are_usage_errors() {
        let m = manager();
        assert!(matches!(m.number_of_splits(), Err(PlannerError::NotPrepared)));
        assert!(matches!(m.split(0), Err(PlannerError::NotPrepared)));
        assert!(m.split_table().unwrap_err().is_usage_error());
    }

    #[test]
    fn test_unconfigured() {
        let mut m = StreamingManager::unconfigured(FixedMemory::new(MemoryBudget::from_mb(1)));
        assert!(m.mode().is_none());
        assert!(matches!(m.number_of_splits(), Err(PlannerError::NotConfigured)));
        let result = m.prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 4, 4));
        assert!(matches!(result, Err(PlannerError::NotConfigured)));

        m.set_stripped_line_count_mode(2).unwrap();
        assert_eq!(
            m.prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 4, 4)).unwrap(),
            2
        );
    }

    #[test]
    fn test_invalid_mode_rejected_and_state_kept() {
        let mut m = manager();
        m.set_stripped_line_count_mode(10).unwrap();
        m.prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 10, 30))
            .unwrap();

        let err = m.set_stripped_line_count_mode(0).unwrap_err();
        assert!(err.is_config_error());
        assert!(m.set_tiled_dimension_mode(0, 5).is_err());
        // The previous plan survives a rejected configuration.
        assert_eq!(m.number_of_splits().unwrap(), 3);
    }

    #[test]
    fn test_set_mode_invalidates_plan() {
        let mut m = manager();
        m.set_tiled_dimension_mode(5, 5).unwrap();
        m.prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 10, 10))
            .unwrap();
        assert!(m.is_prepared());

        m.set_tiled_dimension_mode(5, 5).unwrap();
        assert!(!m.is_prepared());
        assert!(matches!(m.split(0), Err(PlannerError::NotPrepared)));
    }

    #[test]
    fn test_set_bias() {
        let mut m = manager();
        assert!(matches!(m.set_bias(0.0), Err(PlannerError::InvalidBias(_))));
        assert!(m.set_bias(1.5).is_err());
        assert!(m.set_bias(f64::NAN).is_err());
        m.set_bias(1.0).unwrap();

        m.prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 4, 4))
            .unwrap();
        m.set_bias(0.5).unwrap();
        assert!(!m.is_prepared());
        assert_eq!(m.bias(), 0.5);
    }

    #[test]
    fn test_line_count_example() {
        let mut m = manager();
        m.set_stripped_line_count_mode(100).unwrap();
        let n = m
            .prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 1000, 500))
            .unwrap();
        assert_eq!(n, 5);
        assert_eq!(m.split(0).unwrap(), Region::from_xywh(0, 0, 1000, 100));
        assert_eq!(m.split(4).unwrap(), Region::from_xywh(0, 400, 1000, 100));
        assert!(matches!(
            m.split(5),
            Err(PlannerError::SplitIndexOutOfRange { index: 5, count: 5 })
        ));
    }

    #[test]
    fn test_tile_dimension_example() {
        let mut m = manager();
        m.set_tiled_dimension_mode(256, 256).unwrap();
        let n = m
            .prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 1000, 500))
            .unwrap();
        assert_eq!(n, 8);
        // Row 1, column 3.
        assert_eq!(m.split(7).unwrap(), Region::from_xywh(768, 256, 232, 244));
    }

    #[test]
    fn test_non_budget_modes_skip_estimator() {
        let mut m = manager();
        let panicking = |_: &(), _: &Region| -> usize { panic!("estimator must not run") };
        m.set_stripped_line_count_mode(7).unwrap();
        m.prepare_streaming(&panicking, &(), &Region::from_xywh(0, 0, 20, 20))
            .unwrap();
        m.set_tiled_dimension_mode(7, 7).unwrap();
        m.prepare_streaming(&panicking, &(), &Region::from_xywh(0, 0, 20, 20))
            .unwrap();
    }

    #[test]
    fn test_budget_mode_uses_bias() {
        // 100x100 region, 1 byte per cell, budget 4000 bytes.
        // bias 1.0 → limit 4000 → 40-row strips fit at n = 3 (34 rows).
        // bias 0.5 → limit 2000 → needs rows <= 20 → n = 5.
        let region = Region::from_xywh(0, 0, 100, 100);
        let mut m = manager();
        m.set_stripped_budget_mode(MemoryBudget::from_bytes(4000)).unwrap();
        m.set_bias(1.0).unwrap();
        assert_eq!(m.prepare_streaming(&cells, &(), &region).unwrap(), 3);

        m.set_bias(0.5).unwrap();
        assert_eq!(m.prepare_streaming(&cells, &(), &region).unwrap(), 5);

        let table = m.split_table().unwrap();
        assert_eq!(table.budget_bytes(), Some(4000));
        assert_eq!(table.limit_bytes(), Some(2000));
        assert_eq!(table.estimated_footprint_bytes(), Some(2000));
        assert!(!table.budget_exceeded());
    }

    #[test]
    fn test_auto_budget_resolved_from_source() {
        // Source reports 10_000 bytes; bias 1.0; 1 byte per cell.
        let mut m = StreamingManager::with_memory_source(FixedMemory::new(
            MemoryBudget::from_bytes(10_000),
        ));
        m.set_bias(1.0).unwrap();
        m.set_stripped_budget_mode(MemoryBudget::auto()).unwrap();
        let n = m
            .prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 100, 1000))
            .unwrap();
        assert_eq!(n, 10);
        assert_eq!(m.split_table().unwrap().budget_bytes(), Some(10_000));
    }

    #[test]
    fn test_shortfall_is_not_an_error() {
        let mut m = manager();
        m.set_stripped_budget_mode(MemoryBudget::from_bytes(1)).unwrap();
        let n = m
            .prepare_streaming(
                &|_: &(), _: &Region| 1_000_000usize,
                &(),
                &Region::from_xywh(0, 0, 10, 40),
            )
            .unwrap();
        assert_eq!(n, 40);
        assert!(m.split_table().unwrap().budget_exceeded());
    }

    #[test]
    fn test_tiled_shortfall_stops_at_aligned_tiles() {
        let mut m = manager();
        m.set_tiled_budget_mode(MemoryBudget::from_mb(1)).unwrap();
        // The fixed 2 MiB overhead never fits a 1 MiB budget.
        let heavy = |_: &(), r: &Region| (2usize << 20) + r.volume() as usize;
        let n = m
            .prepare_streaming(&heavy, &(), &Region::from_xywh(0, 0, 400, 400))
            .unwrap();
        assert_eq!(n, 625);
        let table = m.split_table().unwrap();
        assert!(table.budget_exceeded());
        assert!(table.iter().all(|t| t.width() == 16 && t.height() == 16));
    }

    #[test]
    fn test_large_tile_grid_prepares() {
        let mut m = manager();
        m.set_tiled_dimension_mode(32, 32).unwrap();
        let n = m
            .prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 8192, 8192))
            .unwrap();
        assert_eq!(n, 65_536);
        assert_eq!(m.split(n - 1).unwrap(), Region::from_xywh(8160, 8160, 32, 32));
    }

    #[test]
    fn test_empty_region_every_mode() {
        let modes = [
            StreamingMode::stripped_by_budget(MemoryBudget::from_mb(1)),
            StreamingMode::stripped_by_line_count(3),
            StreamingMode::tiled_by_budget(MemoryBudget::auto()),
            StreamingMode::tiled_by_dimension(4, 4),
        ];
        for mode in modes {
            let mut m = manager();
            m.set_mode(mode).unwrap();
            let n = m
                .prepare_streaming(&cells, &(), &Region::from_xywh(5, 5, 0, 100))
                .unwrap();
            assert_eq!(n, 0, "{mode}");
            assert_eq!(m.number_of_splits().unwrap(), 0);
            assert!(m.split_table().unwrap().is_empty());
            assert!(m.split(0).is_err());
        }
    }

    #[test]
    fn test_failed_budget_resolution_discards_plan() {
        struct Broken;
        impl MemorySource for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn available_bytes(&self) -> Result<usize, memory_budget::MemoryError> {
                Err(memory_budget::MemoryError::Unavailable {
                    source_name: "broken".into(),
                    detail: "test".into(),
                })
            }
        }

        let mut m = StreamingManager::with_memory_source(Broken);
        m.set_stripped_line_count_mode(5).unwrap();
        m.prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 5, 5))
            .unwrap();

        m.set_stripped_budget_mode(MemoryBudget::auto()).unwrap();
        let err = m
            .prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 5, 5))
            .unwrap_err();
        assert!(err.is_config_error());
        assert!(matches!(m.number_of_splits(), Err(PlannerError::NotPrepared)));
    }

    #[test]
    fn test_table_outlives_reconfiguration() {
        let mut m = manager();
        m.set_stripped_line_count_mode(10).unwrap();
        m.prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 10, 100))
            .unwrap();
        let held = m.split_table().unwrap();

        m.set_tiled_dimension_mode(3, 3).unwrap();
        m.prepare_streaming(&cells, &(), &Region::from_xywh(0, 0, 9, 9))
            .unwrap();

        assert_eq!(held.num_splits(), 10);
        assert_eq!(held.mode(), "stripped-by-line-count");
        assert_eq!(m.number_of_splits().unwrap(), 9);
    }

    #[test]
    fn test_pipeline_handle_passed_through() {
        let mut m = manager();
        m.set_bias(1.0).unwrap();
        m.set_stripped_budget_mode(MemoryBudget::from_bytes(100)).unwrap();
        // The estimator scales by the handle; the planner never inspects it.
        let scaled = |bpp: &usize, r: &Region| r.volume() as usize * *bpp;
        let region = Region::from_xywh(0, 0, 10, 40);
        assert_eq!(m.prepare_streaming(&scaled, &1usize, &region).unwrap(), 4);
        assert_eq!(m.prepare_streaming(&scaled, &2usize, &region).unwrap(), 8);
    }
}
