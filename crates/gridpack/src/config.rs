#![forbid(unsafe_code)]

//! Packer configuration: a full, immutable value.
//!
//! A configuration is supplied whole and replaced whole; there is no partial
//! overlay, so derived fields (like the resolved minimum tile dimensions)
//! can never go stale. Rule validation happens once, when the engine takes
//! ownership of the value.
//!
//! # Invariants
//!
//! 1. `screen_area` dimensions and `tile_aspect_ratio` are positive and
//!    finite; `gutter` and `error_margin` are non-negative.
//! 2. `tiles` is non-empty and fixed `columns`, when set, is non-zero.
//! 3. At most one of `complete_rectangle` / `allow_incomplete_row` is true,
//!    and `allow_incomplete_row` requires `columns`.
//!
//! The JSON shape mirrors the camelCase options payload of the HTTP
//! wrapper (`screenArea`, `tileAspectRatio`, `canRemoveTiles`, ...).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{GridGeometry, Size};

/// Default iteration budget for one search attempt.
pub const DEFAULT_TRY_LIMIT: u32 = 800;
/// Default wall-clock budget in milliseconds.
pub const DEFAULT_PERFORMANCE_LIMIT_MS: u64 = 1000;
/// Default tolerance when comparing row/column extents to the screen.
pub const DEFAULT_ERROR_MARGIN: f64 = 0.01;

/// A configuration rule rejected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tiles must not be empty")]
    EmptyTiles,
    #[error("screen area must have positive finite dimensions (got {width} x {height})")]
    InvalidScreenArea { width: f64, height: f64 },
    #[error("tile aspect ratio must be positive and finite (got {0})")]
    InvalidAspectRatio(f64),
    #[error("gutter must be non-negative and finite (got {0})")]
    InvalidGutter(f64),
    #[error("fixed column count must be greater than zero")]
    ZeroColumns,
    #[error("completeRectangle and allowIncompleteRow are mutually exclusive")]
    ConflictingRowPolicy,
    #[error("allowIncompleteRow requires a fixed column count")]
    IncompleteRowRequiresColumns,
    #[error("{name} must be positive and finite (got {value})")]
    InvalidBound { name: &'static str, value: f64 },
    #[error("error margin must be non-negative and finite (got {0})")]
    InvalidErrorMargin(f64),
}

/// Everything one packing attempt needs, tiles included.
///
/// Tile identifiers are opaque to the engine: they are never inspected,
/// only carried through to the result in order (minus any removed from the
/// end).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackerConfig<T> {
    /// Target area as `[width, height]`.
    pub screen_area: Size,
    /// Ordered, opaque tile identifiers.
    pub tiles: Vec<T>,
    /// Tile width / tile height.
    pub tile_aspect_ratio: f64,
    /// Spacing between tiles and around the grid border.
    #[serde(default)]
    pub gutter: f64,
    /// Fixed column count; when set, the engine must land on exactly this
    /// many columns.
    #[serde(default)]
    pub columns: Option<u32>,
    /// Require every row to be full (`tile_count % columns == 0`).
    #[serde(default)]
    pub complete_rectangle: bool,
    /// Permit shrinking the tile set when no feasible layout exists.
    #[serde(default)]
    pub can_remove_tiles: bool,
    /// Permit the last row to hold fewer tiles than `columns`.
    #[serde(default, alias = "allowIncompleteRows")]
    pub allow_incomplete_row: bool,
    /// Minimum tile width; derived from the height (or defaulted) if unset.
    #[serde(default)]
    pub min_tile_width: Option<f64>,
    /// Minimum tile height; derived from the width if unset.
    #[serde(default)]
    pub min_tile_height: Option<f64>,
    /// Maximum tile height; unlimited if unset.
    #[serde(default)]
    pub max_tile_height: Option<f64>,
    /// Iteration budget per search attempt.
    #[serde(default = "default_try_limit")]
    pub try_limit: u32,
    /// Wall-clock budget per search attempt, in milliseconds.
    #[serde(default = "default_performance_limit_ms", alias = "performanceLimit")]
    pub performance_limit_ms: u64,
    /// Tolerance for fit comparisons against the screen.
    #[serde(default = "default_error_margin")]
    pub error_margin: f64,
}

fn default_try_limit() -> u32 {
    DEFAULT_TRY_LIMIT
}

fn default_performance_limit_ms() -> u64 {
    DEFAULT_PERFORMANCE_LIMIT_MS
}

fn default_error_margin() -> f64 {
    DEFAULT_ERROR_MARGIN
}

impl<T> PackerConfig<T> {
    /// Create a configuration from the three required inputs, everything
    /// else at its default.
    pub fn new(screen_area: Size, tiles: Vec<T>, tile_aspect_ratio: f64) -> Self {
        Self {
            screen_area,
            tiles,
            tile_aspect_ratio,
            gutter: 0.0,
            columns: None,
            complete_rectangle: false,
            can_remove_tiles: false,
            allow_incomplete_row: false,
            min_tile_width: None,
            min_tile_height: None,
            max_tile_height: None,
            try_limit: DEFAULT_TRY_LIMIT,
            performance_limit_ms: DEFAULT_PERFORMANCE_LIMIT_MS,
            error_margin: DEFAULT_ERROR_MARGIN,
        }
    }

    /// Set the gutter.
    #[must_use]
    pub fn gutter(mut self, gutter: f64) -> Self {
        self.gutter = gutter;
        self
    }

    /// Fix the column count.
    #[must_use]
    pub fn columns(mut self, columns: u32) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Require a complete rectangle (no partial last row).
    #[must_use]
    pub fn complete_rectangle(mut self, complete: bool) -> Self {
        self.complete_rectangle = complete;
        self
    }

    /// Permit tile removal as a fallback.
    #[must_use]
    pub fn can_remove_tiles(mut self, can_remove: bool) -> Self {
        self.can_remove_tiles = can_remove;
        self
    }

    /// Permit an incomplete last row (requires fixed columns).
    #[must_use]
    pub fn allow_incomplete_row(mut self, allow: bool) -> Self {
        self.allow_incomplete_row = allow;
        self
    }

    /// Set the minimum tile width.
    #[must_use]
    pub fn min_tile_width(mut self, width: f64) -> Self {
        self.min_tile_width = Some(width);
        self
    }

    /// Set the minimum tile height.
    #[must_use]
    pub fn min_tile_height(mut self, height: f64) -> Self {
        self.min_tile_height = Some(height);
        self
    }

    /// Set the maximum tile height.
    #[must_use]
    pub fn max_tile_height(mut self, height: f64) -> Self {
        self.max_tile_height = Some(height);
        self
    }

    /// Set the iteration budget.
    #[must_use]
    pub fn try_limit(mut self, limit: u32) -> Self {
        self.try_limit = limit;
        self
    }

    /// Set the wall-clock budget in milliseconds.
    #[must_use]
    pub fn performance_limit_ms(mut self, limit_ms: u64) -> Self {
        self.performance_limit_ms = limit_ms;
        self
    }

    /// Set the fit tolerance.
    #[must_use]
    pub fn error_margin(mut self, margin: f64) -> Self {
        self.error_margin = margin;
        self
    }

    /// Number of tiles in the working set.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Fixed column count, if any.
    pub fn fixed_columns(&self) -> Option<u32> {
        self.columns
    }

    /// The pure geometry context this configuration describes.
    pub fn geometry(&self) -> GridGeometry {
        GridGeometry::new(self.screen_area, self.gutter, self.tile_aspect_ratio)
    }

    /// Minimum tile dimensions with aspect-ratio derivation applied.
    ///
    /// If neither bound is given the width defaults to 1; if only one is
    /// given the other follows from the aspect ratio.
    pub fn resolved_min_dimensions(&self) -> (f64, f64) {
        match (self.min_tile_width, self.min_tile_height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, w / self.tile_aspect_ratio),
            (None, Some(h)) => (h * self.tile_aspect_ratio, h),
            (None, None) => (1.0, 1.0 / self.tile_aspect_ratio),
        }
    }

    /// Check every construction rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Size { width, height } = self.screen_area;
        if !(width > 0.0) || !(height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(ConfigError::InvalidScreenArea { width, height });
        }
        if self.tiles.is_empty() {
            return Err(ConfigError::EmptyTiles);
        }
        if !(self.tile_aspect_ratio > 0.0) || !self.tile_aspect_ratio.is_finite() {
            return Err(ConfigError::InvalidAspectRatio(self.tile_aspect_ratio));
        }
        if !(self.gutter >= 0.0) || !self.gutter.is_finite() {
            return Err(ConfigError::InvalidGutter(self.gutter));
        }
        if self.columns == Some(0) {
            return Err(ConfigError::ZeroColumns);
        }
        if self.complete_rectangle && self.allow_incomplete_row {
            return Err(ConfigError::ConflictingRowPolicy);
        }
        if self.allow_incomplete_row && self.columns.is_none() {
            return Err(ConfigError::IncompleteRowRequiresColumns);
        }
        for (name, bound) in [
            ("minTileWidth", self.min_tile_width),
            ("minTileHeight", self.min_tile_height),
            ("maxTileHeight", self.max_tile_height),
        ] {
            if let Some(value) = bound
                && (!(value > 0.0) || !value.is_finite())
            {
                return Err(ConfigError::InvalidBound { name, value });
            }
        }
        if !(self.error_margin >= 0.0) || !self.error_margin.is_finite() {
            return Err(ConfigError::InvalidErrorMargin(self.error_margin));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PackerConfig<u32> {
        PackerConfig::new(Size::new(720.0, 480.0), (0..10).collect(), 0.8)
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = base();
        assert_eq!(config.try_limit, 800);
        assert_eq!(config.performance_limit_ms, 1000);
        assert_eq!(config.error_margin, 0.01);
        assert_eq!(config.gutter, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn min_dimensions_default_to_unit_width() {
        let (w, h) = base().resolved_min_dimensions();
        assert_eq!(w, 1.0);
        assert!((h - 1.25).abs() < 1e-9);
    }

    #[test]
    fn min_dimensions_derive_from_single_bound() {
        let from_width = base().min_tile_width(8.0).resolved_min_dimensions();
        assert_eq!(from_width.0, 8.0);
        assert!((from_width.1 - 10.0).abs() < 1e-9);

        let from_height = base().min_tile_height(10.0).resolved_min_dimensions();
        assert!((from_height.0 - 8.0).abs() < 1e-9);
        assert_eq!(from_height.1, 10.0);

        let both = base()
            .min_tile_width(3.0)
            .min_tile_height(9.0)
            .resolved_min_dimensions();
        assert_eq!(both, (3.0, 9.0));
    }

    #[test]
    fn rejects_empty_tiles() {
        let config: PackerConfig<u32> = PackerConfig::new(Size::new(100.0, 100.0), vec![], 1.0);
        assert_eq!(config.validate(), Err(ConfigError::EmptyTiles));
    }

    #[test]
    fn rejects_bad_screen_and_ratio() {
        let config = PackerConfig::new(Size::new(0.0, 480.0), vec![1], 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidScreenArea { .. })
        ));
        let config = PackerConfig::new(Size::new(100.0, 100.0), vec![1], -2.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAspectRatio(_))
        ));
        let config = PackerConfig::new(Size::new(100.0, 100.0), vec![1], f64::NAN);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAspectRatio(_))
        ));
    }

    #[test]
    fn rejects_conflicting_row_policy() {
        let config = base()
            .columns(5)
            .complete_rectangle(true)
            .allow_incomplete_row(true);
        assert_eq!(config.validate(), Err(ConfigError::ConflictingRowPolicy));
    }

    #[test]
    fn incomplete_row_requires_columns() {
        let config = base().allow_incomplete_row(true);
        assert_eq!(
            config.validate(),
            Err(ConfigError::IncompleteRowRequiresColumns)
        );
        assert!(base().columns(5).allow_incomplete_row(true).validate().is_ok());
    }

    #[test]
    fn rejects_zero_columns_and_bad_bounds() {
        let mut config = base();
        config.columns = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroColumns));

        let config = base().max_tile_height(-3.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBound {
                name: "maxTileHeight",
                ..
            })
        ));
    }

    #[test]
    fn deserializes_camel_case_options_payload() {
        let json = r#"{
            "screenArea": [720, 480],
            "tiles": ["a.jpg", "b.jpg", "c.jpg"],
            "tileAspectRatio": 0.8,
            "gutter": 5,
            "canRemoveTiles": true,
            "completeRectangle": false,
            "tryLimit": 100,
            "performanceLimit": 500,
            "errorMargin": 0.1
        }"#;
        let config: PackerConfig<String> = serde_json::from_str(json).unwrap();
        assert_eq!(config.screen_area, Size::new(720.0, 480.0));
        assert_eq!(config.tiles.len(), 3);
        assert!(config.can_remove_tiles);
        assert_eq!(config.try_limit, 100);
        assert_eq!(config.performance_limit_ms, 500);
        assert_eq!(config.error_margin, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn accepts_plural_incomplete_rows_alias() {
        let json = r#"{
            "screenArea": [360, 800],
            "tiles": [1, 2, 3],
            "tileAspectRatio": 1.0,
            "columns": 7,
            "allowIncompleteRows": true
        }"#;
        let config: PackerConfig<u32> = serde_json::from_str(json).unwrap();
        assert!(config.allow_incomplete_row);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_options() {
        let json = r#"{
            "screenArea": [360, 800],
            "tiles": [1],
            "tileAspectRatio": 1.0,
            "gutterr": 5
        }"#;
        assert!(serde_json::from_str::<PackerConfig<u32>>(json).is_err());
    }
}
