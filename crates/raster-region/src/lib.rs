// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # raster-region
//!
//! Axis-aligned boxes over the index space of a raster dataset.
//!
//! A [`Region`] is an *origin* (signed integer coordinates) plus a *size*
//! (non-negative extents), one entry per axis. Axis `0` is the fastest
//! varying one (columns, `x`); the last axis is the slowest varying one
//! (rows, `y`, for a 2-D image).
//!
//! Regions carry no pixel data. They are the currency exchanged between
//! the streaming planner, the memory estimator, and whatever processes the
//! resulting splits.
//!
//! # Example
//! ```
//! use raster_region::Region;
//!
//! let image = Region::from_xywh(0, 0, 1000, 500);
//! let band = Region::from_xywh(0, 100, 1000, 100);
//! assert!(band.is_inside(&image));
//! assert_eq!(band.volume(), 100_000);
//! ```

mod error;
mod region;

pub use error::RegionError;
pub use region::Region;
