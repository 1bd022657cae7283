// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # streaming-planner
//!
//! Decides how a raster region is cut into pieces so that each piece can be
//! processed within a memory budget.
//!
//! The planner takes:
//! - A [`Region`](raster_region::Region) to produce.
//! - A [`StreamingMode`]: strips or tiles, sized by a memory budget or by
//!   explicit dimensions.
//! - For budget modes, a [`FootprintEstimator`] and an opaque pipeline
//!   handle it understands.
//!
//! And produces an immutable [`SplitTable`]: an ordered list of disjoint
//! regions whose union is exactly the requested region.
//!
//! # Budget Modes
//! The planner searches for the smallest number of divisions whose largest
//! piece is estimated to fit in `budget × bias`. When no granularity fits,
//! it streams at the finest granularity and logs a warning.
//!
//! # Example
//! ```
//! use memory_budget::{FixedMemory, MemoryBudget};
//! use raster_region::Region;
//! use streaming_planner::{PipelineProfile, ProfileEstimator, StreamingManager, StreamingMode};
//!
//! let pipeline = PipelineProfile::new("ndvi").stage("read", 8, 0, 0).stage("ratio", 4, 0, 0);
//! let mut manager = StreamingManager::with_memory_source(FixedMemory::new(MemoryBudget::from_mb(64)));
//! manager.set_mode(StreamingMode::tiled_by_budget(MemoryBudget::from_mb(4))).unwrap();
//!
//! let n = manager
//!     .prepare_streaming(&ProfileEstimator::new(), &pipeline, &Region::from_xywh(0, 0, 4096, 4096))
//!     .unwrap();
//! assert!(n > 1);
//! for split in manager.split_table().unwrap().iter() {
//!     assert!(split.volume() > 0);
//! }
//! ```

pub mod splitter;

mod config;
mod error;
mod estimator;
mod manager;
mod mode;
mod search;
mod table;

pub use config::StreamingConfig;
pub use error::PlannerError;
pub use estimator::{FootprintEstimator, PipelineProfile, ProfileEstimator, StageProfile};
pub use manager::{StreamingManager, DEFAULT_BIAS};
pub use mode::{StreamingMode, DEFAULT_TILE_ALIGNMENT};
pub use search::{find_optimal_divisions, SearchOutcome};
pub use splitter::{split_all, RegionSplitter, Splitter, StripSplitter, TileSplitter};
pub use table::SplitTable;
