#![forbid(unsafe_code)]

//! The two-tier error taxonomy of the packing search.
//!
//! Corrective violations ([`ErrorKind`] inside a [`Violation`]) are ordinary
//! data: the engine consumes them to pick the next guess and they never
//! escape `pack()`. Fatal conditions ([`PackError`]) mean no feasible layout
//! exists under the current configuration and always propagate to the
//! caller.
//!
//! Every violation carries an [`ErrorDetail`] with the guess, the violated
//! predicate, the measured values, and the signed discrepancy, so a failed
//! search can be audited try by try from the log alone.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The closed set of per-iteration constraint violations.
///
/// These drive the correction table; none of them is fatal by itself.
/// `UnderflowHeight` is part of the taxonomy for exhaustiveness but no
/// validator currently raises it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    OverflowHeight,
    OverflowWidth,
    UnderflowWidth,
    UnderflowHeight,
    BelowMinimum,
    AboveMaximum,
    ColumnMismatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OverflowHeight => "overflow screen height",
            Self::OverflowWidth => "overflow screen width",
            Self::UnderflowWidth => "underflow screen width",
            Self::UnderflowHeight => "underflow screen height",
            Self::BelowMinimum => "tile dimensions below minimum",
            Self::AboveMaximum => "tile dimensions above maximum",
            Self::ColumnMismatch => "could not satisfy columns constraint",
        };
        f.write_str(text)
    }
}

/// Diagnostic payload attached to every violation.
///
/// Opaque to the correction policy; recorded in the try log and handed to
/// the observer callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// The tile-height guess that produced the violating candidate.
    pub guess: f64,
    /// Human-readable rendering of the violated predicate.
    pub predicate: String,
    /// The measured values the predicate compared.
    pub measured: BTreeMap<String, f64>,
    /// Signed distance(s) from satisfying the predicate.
    pub discrepancy: Vec<f64>,
}

/// A classified constraint violation for one candidate grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub kind: ErrorKind,
    pub detail: ErrorDetail,
}

impl Violation {
    pub(crate) fn new(kind: ErrorKind, detail: ErrorDetail) -> Self {
        Self { kind, detail }
    }
}

/// Fatal outcomes of `pack()`: no feasible layout under the current
/// configuration. Retrying without changing the configuration cannot
/// succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackError {
    /// Fixed column count exceeds the tile count and incomplete rows are
    /// not allowed.
    #[error("no feasible layout: fixed column count {columns} exceeds tile count {tile_count}")]
    ColumnsExceedTileCount { columns: u32, tile_count: usize },

    /// A complete rectangle was requested for a prime tile count.
    #[error(
        "no feasible layout: a complete rectangle is impossible with a prime tile count ({tile_count})"
    )]
    PrimeTileCount { tile_count: usize },

    /// The tiles cannot fit the screen even at their minimum dimensions.
    #[error(
        "no feasible layout: {tile_count} tiles at minimum {min_width:.2} x {min_height:.2} exceed the {screen_width} x {screen_height} screen"
    )]
    AreaInsufficient {
        screen_width: f64,
        screen_height: f64,
        tile_count: usize,
        min_width: f64,
        min_height: f64,
    },

    /// The fixed column constraint could not be satisfied and tile removal
    /// is disabled.
    #[error("could not satisfy columns constraint: {}", .detail.predicate)]
    ColumnMismatch { detail: ErrorDetail },

    /// A correction drove the guess below one unit with tile removal
    /// disabled, or a completeness restart halved the initial guess to
    /// nothing.
    #[error("tile height fell below 1 and tiles cannot be removed")]
    ZeroHeight,

    /// Tile removal was requested but the inventory is empty. Carries the
    /// violation that forced the removal, if one was recorded.
    #[error("no more tiles to remove{}", fmt_last_violation(.last))]
    NoTilesLeftToRemove { last: Option<ErrorKind> },

    /// The iteration budget ran out before the search converged.
    #[error("try limit of {limit} reached")]
    TryLimitExceeded { limit: u32 },

    /// The wall-clock budget ran out before the search converged.
    #[error("time budget of {limit_ms} ms exhausted after {tries} tries")]
    TimeLimitExceeded { limit_ms: u64, tries: usize },

    /// A guess produced a non-positive or non-finite tile dimension.
    #[error("guess produced an invalid tile dimension ({width} x {height})")]
    InvalidDimension { width: f64, height: f64 },

    /// The tile count cannot fill a row at the derived column count and
    /// incomplete rows are not allowed.
    #[error(
        "tile width and tile count cannot fill the container width ({tile_count} tiles, {columns} columns)"
    )]
    CannotFillWidth { columns: u32, tile_count: usize },
}

fn fmt_last_violation(last: &Option<ErrorKind>) -> String {
    match last {
        Some(kind) => format!(" (last violation: {kind})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_serializes_camel_case() {
        let json = serde_json::to_string(&ErrorKind::OverflowHeight).unwrap();
        assert_eq!(json, "\"overflowHeight\"");
    }

    #[test]
    fn no_tiles_left_message_includes_last_violation() {
        let with = PackError::NoTilesLeftToRemove {
            last: Some(ErrorKind::BelowMinimum),
        };
        assert!(with.to_string().contains("tile dimensions below minimum"));

        let without = PackError::NoTilesLeftToRemove { last: None };
        assert_eq!(without.to_string(), "no more tiles to remove");
    }

    #[test]
    fn column_mismatch_message_shows_predicate() {
        let err = PackError::ColumnMismatch {
            detail: ErrorDetail {
                guess: 50.0,
                predicate: "columns (4) != fixed columns (3)".to_string(),
                measured: BTreeMap::new(),
                discrepancy: vec![1.0],
            },
        };
        assert!(err.to_string().contains("columns (4) != fixed columns (3)"));
    }
}
