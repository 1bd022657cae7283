// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Streaming modes: how split granularity is chosen.
//!
//! | Mode | Parameter | Splitter | Estimator calls |
//! |---|---|---|---|
//! | [`StrippedByBudget`](StreamingMode::StrippedByBudget) | byte budget | strips | yes |
//! | [`StrippedByLineCount`](StreamingMode::StrippedByLineCount) | lines per split | strips | no |
//! | [`TiledByBudget`](StreamingMode::TiledByBudget) | byte budget | tiles | yes |
//! | [`TiledByDimension`](StreamingMode::TiledByDimension) | tile width/height | tiles | no |

use crate::PlannerError;
use memory_budget::MemoryBudget;
use std::fmt;

/// Default edge alignment for budget-driven tiles, in pixels.
///
/// Also the finest tile the search falls back to, so an unattainable
/// budget yields 16x16 tiles rather than one tile per pixel.
pub const DEFAULT_TILE_ALIGNMENT: usize = 16;

fn default_tile_alignment() -> usize {
    DEFAULT_TILE_ALIGNMENT
}

/// The active streaming policy and its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum StreamingMode {
    /// Horizontal strips, as few as fit the budget.
    StrippedByBudget { budget: MemoryBudget },
    /// Horizontal strips of a fixed number of lines.
    StrippedByLineCount { lines_per_split: usize },
    /// Square-ish tiles, as few as fit the budget.
    ///
    /// Tile edges are rounded up to a multiple of `tile_alignment`, which
    /// is also the smallest tile edge the search will go down to.
    TiledByBudget {
        budget: MemoryBudget,
        #[serde(default = "default_tile_alignment")]
        tile_alignment: usize,
    },
    /// Tiles of an explicit size; edge tiles are clipped.
    TiledByDimension { tile_width: usize, tile_height: usize },
}

impl Default for StreamingMode {
    /// Conservative default: budget-driven strips with the auto budget.
    fn default() -> Self {
        Self::StrippedByBudget {
            budget: MemoryBudget::auto(),
        }
    }
}

impl StreamingMode {
    pub fn stripped_by_budget(budget: MemoryBudget) -> Self {
        Self::StrippedByBudget { budget }
    }

    pub fn stripped_by_line_count(lines_per_split: usize) -> Self {
        Self::StrippedByLineCount { lines_per_split }
    }

    /// Budget-driven tiles aligned to [`DEFAULT_TILE_ALIGNMENT`].
    pub fn tiled_by_budget(budget: MemoryBudget) -> Self {
        Self::TiledByBudget {
            budget,
            tile_alignment: DEFAULT_TILE_ALIGNMENT,
        }
    }

    /// Budget-driven tiles whose edges are multiples of `tile_alignment`.
    pub fn tiled_by_budget_aligned(budget: MemoryBudget, tile_alignment: usize) -> Self {
        Self::TiledByBudget {
            budget,
            tile_alignment,
        }
    }

    pub fn tiled_by_dimension(tile_width: usize, tile_height: usize) -> Self {
        Self::TiledByDimension {
            tile_width,
            tile_height,
        }
    }

    /// Stable kebab-case name, as used in config files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StrippedByBudget { .. } => "stripped-by-budget",
            Self::StrippedByLineCount { .. } => "stripped-by-line-count",
            Self::TiledByBudget { .. } => "tiled-by-budget",
            Self::TiledByDimension { .. } => "tiled-by-dimension",
        }
    }

    /// Returns the budget for budget-driven modes.
    pub fn budget(&self) -> Option<MemoryBudget> {
        match self {
            Self::StrippedByBudget { budget } | Self::TiledByBudget { budget, .. } => Some(*budget),
            _ => None,
        }
    }

    /// Returns `true` if preparation consults the footprint estimator.
    pub fn is_budget_driven(&self) -> bool {
        self.budget().is_some()
    }

    /// Checks the mode's parameter.
    ///
    /// Budgets are unsigned, so any value (including the auto sentinel)
    /// is accepted.
    pub fn validate(&self) -> Result<(), PlannerError> {
        match *self {
            Self::StrippedByBudget { .. } => Ok(()),
            Self::StrippedByLineCount { lines_per_split } => {
                if lines_per_split == 0 {
                    return Err(PlannerError::InvalidLineCount(lines_per_split));
                }
                Ok(())
            }
            Self::TiledByBudget { tile_alignment, .. } => {
                if tile_alignment == 0 {
                    return Err(PlannerError::InvalidTileAlignment(tile_alignment));
                }
                Ok(())
            }
            Self::TiledByDimension {
                tile_width,
                tile_height,
            } => {
                if tile_width == 0 || tile_height == 0 {
                    return Err(PlannerError::InvalidTileDimension {
                        width: tile_width,
                        height: tile_height,
                    });
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for StreamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrippedByBudget { budget } => write!(f, "{} ({budget})", self.name()),
            Self::StrippedByLineCount { lines_per_split } => {
                write!(f, "{} ({lines_per_split} lines)", self.name())
            }
            Self::TiledByBudget {
                budget,
                tile_alignment,
            } => {
                if *tile_alignment > 1 {
                    write!(f, "{} ({budget}, aligned to {tile_alignment})", self.name())
                } else {
                    write!(f, "{} ({budget})", self.name())
                }
            }
            Self::TiledByDimension {
                tile_width,
                tile_height,
            } => write!(f, "{} ({tile_width}x{tile_height})", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_auto_strips() {
        let m = StreamingMode::default();
        assert_eq!(m.name(), "stripped-by-budget");
        assert!(m.budget().unwrap().is_auto());
    }

    #[test]
    fn test_validate() {
        assert!(StreamingMode::stripped_by_line_count(1).validate().is_ok());
        assert!(matches!(
            StreamingMode::stripped_by_line_count(0).validate(),
            Err(PlannerError::InvalidLineCount(0))
        ));
        assert!(StreamingMode::tiled_by_dimension(0, 16).validate().is_err());
        assert!(StreamingMode::tiled_by_dimension(16, 0).validate().is_err());
        assert!(StreamingMode::tiled_by_dimension(16, 16).validate().is_ok());
        assert!(StreamingMode::tiled_by_budget_aligned(MemoryBudget::auto(), 0)
            .validate()
            .is_err());
        assert!(StreamingMode::stripped_by_budget(MemoryBudget::auto())
            .validate()
            .is_ok());
    }

    #[test]
    fn test_budget_driven() {
        assert!(StreamingMode::tiled_by_budget(MemoryBudget::from_mb(1)).is_budget_driven());
        assert!(!StreamingMode::tiled_by_dimension(8, 8).is_budget_driven());
        assert!(!StreamingMode::stripped_by_line_count(8).is_budget_driven());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StreamingMode::tiled_by_dimension(256, 128).to_string(),
            "tiled-by-dimension (256x128)"
        );
        assert_eq!(
            StreamingMode::tiled_by_budget_aligned(MemoryBudget::from_mb(64), 32).to_string(),
            "tiled-by-budget (64 MB, aligned to 32)"
        );
        assert_eq!(
            StreamingMode::stripped_by_budget(MemoryBudget::auto()).to_string(),
            "stripped-by-budget (auto)"
        );
    }

    #[test]
    fn test_tiled_budget_default_alignment() {
        let m = StreamingMode::tiled_by_budget(MemoryBudget::from_mb(8));
        assert!(matches!(
            m,
            StreamingMode::TiledByBudget { tile_alignment: DEFAULT_TILE_ALIGNMENT, .. }
        ));
        let parsed: StreamingMode =
            serde_json::from_str(r#"{"mode":"tiled-by-budget","budget":{"bytes":1024}}"#).unwrap();
        assert_eq!(parsed, StreamingMode::tiled_by_budget(MemoryBudget::from_bytes(1024)));
    }

    #[test]
    fn test_serde_tagged() {
        let m = StreamingMode::stripped_by_line_count(100);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"mode":"stripped-by-line-count","lines_per_split":100}"#);
        let back: StreamingMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
