// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Region descriptors and geometric queries.

use crate::RegionError;
use std::fmt;

/// An axis-aligned box over a raster's index space.
///
/// Regions are immutable once created. Every axis has an origin and an
/// extent; a region with a zero extent on any axis is *empty* and covers
/// no index cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawRegion")]
pub struct Region {
    origin: Vec<i64>,
    size: Vec<usize>,
}

/// Unchecked wire form, validated through [`Region::new`] on deserialisation.
#[derive(serde::Deserialize)]
struct RawRegion {
    origin: Vec<i64>,
    size: Vec<usize>,
}

impl TryFrom<RawRegion> for Region {
    type Error = RegionError;

    fn try_from(raw: RawRegion) -> Result<Self, Self::Error> {
        Region::new(raw.origin, raw.size)
    }
}

impl Region {
    /// Creates a region from an origin and a size.
    ///
    /// # Examples
    /// ```
    /// use raster_region::Region;
    /// let r = Region::new(vec![0, 0, 0], vec![64, 32, 3]).unwrap();
    /// assert_eq!(r.rank(), 3);
    /// assert_eq!(r.volume(), 64 * 32 * 3);
    /// ```
    pub fn new(origin: Vec<i64>, size: Vec<usize>) -> Result<Self, RegionError> {
        if origin.len() != size.len() {
            return Err(RegionError::RankMismatch {
                origin_rank: origin.len(),
                size_rank: size.len(),
            });
        }
        if origin.is_empty() {
            return Err(RegionError::ZeroRank);
        }
        for (axis, (&o, &s)) in origin.iter().zip(&size).enumerate() {
            let fits = i64::try_from(s)
                .ok()
                .and_then(|s| o.checked_add(s))
                .is_some();
            if !fits {
                return Err(RegionError::Overflow {
                    axis,
                    origin: o,
                    size: s,
                });
            }
        }
        Ok(Self { origin, size })
    }

    /// Creates a region anchored at the zero index.
    pub fn with_size(size: Vec<usize>) -> Result<Self, RegionError> {
        Self::new(vec![0; size.len()], size)
    }

    /// Creates a 2-D region from `x`, `y`, `width`, `height`.
    ///
    /// The 32-bit arguments keep every end coordinate within `i64`, so this
    /// cannot fail; use [`Region::new`] for wider coordinates.
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: vec![i64::from(x), i64::from(y)],
            size: vec![width as usize, height as usize],
        }
    }

    /// Returns the number of axes.
    pub fn rank(&self) -> usize {
        self.size.len()
    }

    /// Returns the origin as a slice, one coordinate per axis.
    pub fn origin(&self) -> &[i64] {
        &self.origin
    }

    /// Returns the extents as a slice, one per axis.
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    /// Returns the origin on `axis`, or `None` if the axis does not exist.
    pub fn origin_at(&self, axis: usize) -> Option<i64> {
        self.origin.get(axis).copied()
    }

    /// Returns the extent on `axis`, or `None` if the axis does not exist.
    pub fn size_at(&self, axis: usize) -> Option<usize> {
        self.size.get(axis).copied()
    }

    /// Extent along axis 0.
    pub fn width(&self) -> usize {
        self.size_at(0).unwrap_or(0)
    }

    /// Extent along axis 1, or `1` for a one-axis region.
    pub fn height(&self) -> usize {
        self.size_at(1).unwrap_or(1)
    }

    /// Returns the exclusive upper bound on `axis`.
    pub fn end_at(&self, axis: usize) -> Option<i64> {
        let o = self.origin_at(axis)?;
        let s = self.size_at(axis)?;
        Some(o.saturating_add(s as i64))
    }

    /// Returns the number of index cells covered.
    ///
    /// Computed in `u128` so that large N-D regions cannot overflow.
    pub fn volume(&self) -> u128 {
        self.size.iter().map(|&s| s as u128).product()
    }

    /// Returns `true` if any extent is zero.
    pub fn is_empty(&self) -> bool {
        self.size.iter().any(|&s| s == 0)
    }

    /// Returns `true` if `index` lies inside this region.
    pub fn contains_index(&self, index: &[i64]) -> bool {
        index.len() == self.rank()
            && index.iter().enumerate().all(|(axis, &i)| {
                let lo = self.origin[axis];
                let hi = lo.saturating_add(self.size[axis] as i64);
                i >= lo && i < hi
            })
    }

    /// Returns `true` if `self` is entirely contained in `other`.
    ///
    /// An empty region is inside any region of the same rank.
    pub fn is_inside(&self, other: &Region) -> bool {
        if self.rank() != other.rank() {
            return false;
        }
        if self.is_empty() {
            return true;
        }
        (0..self.rank()).all(|axis| {
            self.origin[axis] >= other.origin[axis]
                && self.end_at(axis) <= other.end_at(axis)
        })
    }

    /// Returns the overlapping part of two regions, or `None` if they share
    /// no index cell (or have different ranks).
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        if self.rank() != other.rank() {
            return None;
        }
        let mut origin = Vec::with_capacity(self.rank());
        let mut size = Vec::with_capacity(self.rank());
        for axis in 0..self.rank() {
            let lo = self.origin[axis].max(other.origin[axis]);
            let hi = self.end_at(axis)?.min(other.end_at(axis)?);
            if hi <= lo {
                return None;
            }
            origin.push(lo);
            size.push((hi - lo) as usize);
        }
        Some(Region { origin, size })
    }

    /// Returns `true` if the two regions share at least one index cell.
    pub fn intersects(&self, other: &Region) -> bool {
        self.rank() == other.rank()
            && (0..self.rank()).all(|axis| {
                let lo = self.origin[axis].max(other.origin[axis]);
                let hi = self.end_at(axis).min(other.end_at(axis));
                hi.is_some_and(|hi| hi > lo)
            })
    }

    /// Returns a copy restricted to `[origin, origin + len)` along `axis`,
    /// with every other axis unchanged.
    ///
    /// An `axis` beyond the rank leaves the region unchanged; callers are
    /// expected to check the rank first.
    pub fn with_axis(&self, axis: usize, origin: i64, len: usize) -> Region {
        let mut out = self.clone();
        if axis < out.rank() {
            out.origin[axis] = origin;
            out.size[axis] = len;
        }
        out
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "origin (")?;
        for (i, o) in self.origin.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{o}")?;
        }
        write!(f, ") size ")?;
        for (i, s) in self.size.iter().enumerate() {
            if i > 0 {
                write!(f, "x")?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}
