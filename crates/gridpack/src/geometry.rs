#![forbid(unsafe_code)]

//! Geometric primitives and the pure grid arithmetic the search engine
//! iterates over.
//!
//! Everything here is a function of its inputs: converting a column count or
//! a tile-height guess into tile dimensions, deriving a grid shape, and
//! laying out absolute tile positions. No engine state is consulted, which
//! is what makes a logged try replayable after the fact.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ErrorDetail, PackError};

/// A width/height pair in screen units.
///
/// Serializes as a `[width, height]` tuple to match the wire shape of
/// `screenArea` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Total area in square units.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl From<(f64, f64)> for Size {
    fn from((width, height): (f64, f64)) -> Self {
        Self { width, height }
    }
}

impl From<Size> for (f64, f64) {
    fn from(size: Size) -> Self {
        (size.width, size.height)
    }
}

/// The single tile size shared by every tile in a candidate grid.
///
/// Dimensions exclude the gutter; spacing is applied when rows, columns,
/// and positions are computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileDimensions {
    pub width: f64,
    pub height: f64,
}

/// Column and row count of a candidate grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridShape {
    pub columns: u32,
    pub rows: u32,
}

impl GridShape {
    /// Shape for `tile_count` tiles flowed into `columns` columns.
    ///
    /// `rows == ceil(tile_count / columns)`. `columns` must be non-zero.
    pub fn for_tiles(tile_count: usize, columns: u32) -> Self {
        debug_assert!(columns > 0);
        let columns_usize = columns as usize;
        let rows = tile_count.div_ceil(columns_usize) as u32;
        Self { columns, rows }
    }
}

/// Absolute placement of one tile within the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TilePosition {
    /// Left edge, gutter included.
    pub x: f64,
    /// Top edge, gutter included.
    pub y: f64,
    pub row: u32,
    pub col: u32,
}

/// The fixed frame a layout is solved against: screen, gutter, aspect ratio.
///
/// All helpers are pure. The engine holds one of these per configuration and
/// calls into it every iteration; tests and replay UIs can call the same
/// functions against a logged [`crate::TryRecord`] and get identical output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub screen: Size,
    pub gutter: f64,
    pub aspect_ratio: f64,
}

impl GridGeometry {
    /// Create a geometry context.
    pub const fn new(screen: Size, gutter: f64, aspect_ratio: f64) -> Self {
        Self {
            screen,
            gutter,
            aspect_ratio,
        }
    }

    /// Tile dimensions that exactly fill the screen width at `columns`
    /// columns, gutters included.
    pub fn dimensions_from_columns(&self, columns: u32) -> TileDimensions {
        let width = (self.screen.width - self.gutter) / f64::from(columns.max(1)) - self.gutter;
        TileDimensions {
            width,
            height: width / self.aspect_ratio,
        }
    }

    /// Tile dimensions for a height guess.
    ///
    /// Fails when either derived dimension is non-positive or non-finite;
    /// there is no grid to correct from such a guess.
    pub fn dimensions_from_guess(&self, guess: f64) -> Result<TileDimensions, PackError> {
        let width = guess * self.aspect_ratio;
        let height = guess;
        if !(width > 0.0) || !(height > 0.0) || !width.is_finite() {
            return Err(PackError::InvalidDimension { width, height });
        }
        Ok(TileDimensions { width, height })
    }

    /// Column count a tile of `tile_width` implies for this screen.
    ///
    /// Rounds to the nearest whole column, clamped to at least one. Fails
    /// when the tiles cannot fill even a single row at that width and
    /// incomplete rows are not allowed.
    pub fn columns_from_width(
        &self,
        tile_width: f64,
        tile_count: usize,
        allow_incomplete_row: bool,
    ) -> Result<u32, PackError> {
        let raw = ((self.screen.width - self.gutter) / (tile_width + self.gutter)).round();
        let columns = if raw.is_finite() && raw >= 1.0 {
            raw as u32
        } else {
            1
        };
        if !allow_incomplete_row && tile_count + 1 < columns as usize {
            return Err(PackError::CannotFillWidth {
                columns,
                tile_count,
            });
        }
        Ok(columns)
    }

    /// Absolute positions for `tile_count` tiles flowed row-major into
    /// `columns` columns. The outer gutter offsets every tile by one gutter.
    pub fn positions_for(
        &self,
        columns: u32,
        dims: TileDimensions,
        tile_count: usize,
    ) -> Vec<TilePosition> {
        let columns_usize = columns.max(1) as usize;
        (0..tile_count)
            .map(|i| {
                let col = (i % columns_usize) as u32;
                let row = (i / columns_usize) as u32;
                TilePosition {
                    x: f64::from(col) * (dims.width + self.gutter) + self.gutter,
                    y: f64::from(row) * (dims.height + self.gutter) + self.gutter,
                    row,
                    col,
                }
            })
            .collect()
    }

    /// Outer dimensions of the packed grid, gutters on all sides included.
    ///
    /// A single incomplete row is measured by its actual tile count rather
    /// than the column count, so the reported width hugs the tiles.
    pub fn real_dimensions(
        &self,
        shape: GridShape,
        dims: TileDimensions,
        tile_count: usize,
        allow_incomplete_row: bool,
    ) -> Size {
        let width_units = if allow_incomplete_row && shape.rows == 1 {
            tile_count as f64
        } else {
            f64::from(shape.columns)
        };
        Size {
            width: width_units * (dims.width + self.gutter) + self.gutter,
            height: f64::from(shape.rows) * (dims.height + self.gutter) + self.gutter,
        }
    }
}

/// One candidate grid produced from the current guess: the unit the
/// validators inspect and the correction policy reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub dims: TileDimensions,
    pub shape: GridShape,
}

impl Candidate {
    pub(crate) fn measured(&self) -> BTreeMap<String, f64> {
        let mut measured = BTreeMap::new();
        measured.insert("tileWidth".to_string(), self.dims.width);
        measured.insert("tileHeight".to_string(), self.dims.height);
        measured.insert("columns".to_string(), f64::from(self.shape.columns));
        measured.insert("rows".to_string(), f64::from(self.shape.rows));
        measured
    }
}

pub(crate) fn detail(
    guess: f64,
    predicate: impl Into<String>,
    measured: BTreeMap<String, f64>,
    discrepancy: Vec<f64>,
) -> ErrorDetail {
    ErrorDetail {
        guess,
        predicate: predicate.into(),
        measured,
        discrepancy,
    }
}
