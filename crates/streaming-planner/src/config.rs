// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Streaming configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! mode = "tiled-by-budget"
//! memory_budget = "512M"
//! tile_alignment = 64
//! bias = 0.75
//! ```
//!
//! Only the keys the selected mode reads need to be present:
//! `memory_budget` for the budget modes, `lines_per_split` for
//! `stripped-by-line-count`, `tile_width`/`tile_height` for
//! `tiled-by-dimension`.

use crate::mode::DEFAULT_TILE_ALIGNMENT;
use crate::{PlannerError, StreamingManager, StreamingMode};
use memory_budget::MemoryBudget;
use std::path::Path;

/// Configuration for a [`StreamingManager`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StreamingConfig {
    /// Mode name: `"stripped-by-budget"`, `"stripped-by-line-count"`,
    /// `"tiled-by-budget"`, `"tiled-by-dimension"`.
    pub mode: String,
    /// Memory budget (human-readable, e.g. `"512M"`; `"auto"` or `"0"` for
    /// the process-wide value).
    #[serde(default = "default_budget")]
    pub memory_budget: String,
    /// Lines per strip for `stripped-by-line-count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_per_split: Option<usize>,
    /// Tile width for `tiled-by-dimension`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_width: Option<usize>,
    /// Tile height for `tiled-by-dimension`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_height: Option<usize>,
    /// Edge alignment for `tiled-by-budget` (defaults to 16).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_alignment: Option<usize>,
    /// Safety factor in `(0, 1]` (defaults to [`DEFAULT_BIAS`](crate::DEFAULT_BIAS)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias: Option<f64>,
}

fn default_budget() -> String {
    "auto".to_string()
}

impl StreamingConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PlannerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlannerError::InvalidConfig(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, PlannerError> {
        toml::from_str(toml_str)
            .map_err(|e| PlannerError::InvalidConfig(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, PlannerError> {
        toml::to_string_pretty(self)
            .map_err(|e| PlannerError::InvalidConfig(format!("TOML serialise error: {e}")))
    }

    /// Parses the memory budget string into a [`MemoryBudget`].
    pub fn parse_budget(&self) -> Result<MemoryBudget, PlannerError> {
        Ok(MemoryBudget::parse(&self.memory_budget)?)
    }

    /// Builds and validates the mode this config describes.
    pub fn to_mode(&self) -> Result<StreamingMode, PlannerError> {
        let mode = match self.mode.to_lowercase().as_str() {
            "stripped-by-budget" | "strips" => StreamingMode::stripped_by_budget(self.parse_budget()?),
            "stripped-by-line-count" | "stripped-by-lines" | "lines" => {
                StreamingMode::stripped_by_line_count(require(self.lines_per_split, "lines_per_split")?)
            }
            "tiled-by-budget" | "tiles" => StreamingMode::tiled_by_budget_aligned(
                self.parse_budget()?,
                self.tile_alignment.unwrap_or(DEFAULT_TILE_ALIGNMENT),
            ),
            "tiled-by-dimension" => StreamingMode::tiled_by_dimension(
                require(self.tile_width, "tile_width")?,
                require(self.tile_height, "tile_height")?,
            ),
            other => {
                return Err(PlannerError::InvalidConfig(format!(
                    "unknown mode '{other}'; expected 'stripped-by-budget', \
                     'stripped-by-line-count', 'tiled-by-budget', or 'tiled-by-dimension'"
                )))
            }
        };
        mode.validate()?;
        Ok(mode)
    }

    /// Selects this config's mode and bias on `manager`.
    ///
    /// Nothing is changed if either is invalid.
    pub fn apply_to(&self, manager: &mut StreamingManager) -> Result<(), PlannerError> {
        let mode = self.to_mode()?;
        if let Some(bias) = self.bias {
            if !(bias > 0.0 && bias <= 1.0) {
                return Err(PlannerError::InvalidBias(bias));
            }
            manager.set_bias(bias)?;
        }
        manager.set_mode(mode)
    }
}

fn require(value: Option<usize>, key: &str) -> Result<usize, PlannerError> {
    value.ok_or_else(|| PlannerError::InvalidConfig(format!("missing '{key}' for the selected mode")))
}

impl From<StreamingMode> for StreamingConfig {
    fn from(mode: StreamingMode) -> Self {
        let mut config = Self {
            mode: mode.name().to_string(),
            ..Default::default()
        };
        match mode {
            StreamingMode::StrippedByBudget { budget } => {
                config.memory_budget = budget.to_string();
            }
            StreamingMode::StrippedByLineCount { lines_per_split } => {
                config.lines_per_split = Some(lines_per_split);
            }
            StreamingMode::TiledByBudget {
                budget,
                tile_alignment,
            } => {
                config.memory_budget = budget.to_string();
                config.tile_alignment = Some(tile_alignment);
            }
            StreamingMode::TiledByDimension {
                tile_width,
                tile_height,
            } => {
                config.tile_width = Some(tile_width);
                config.tile_height = Some(tile_height);
            }
        }
        config
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            mode: StreamingMode::default().name().to_string(),
            memory_budget: default_budget(),
            lines_per_split: None,
            tile_width: None,
            tile_height: None,
            tile_alignment: None,
            bias: None,
        }
    }
}
