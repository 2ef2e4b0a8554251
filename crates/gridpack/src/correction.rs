#![forbid(unsafe_code)]

//! Correction policy: which guess adjustment each violation earns.
//!
//! The policy is a pure, exhaustive table from violation kind (plus the
//! previous kind, for one hysteresis case) to a [`Correction`] plan. The
//! engine applies the plan; nothing here mutates state.
//!
//! Column-based corrections convert a column-count nudge into a height
//! delta via [`GridGeometry::dimensions_from_columns`], so the next guess
//! exactly fills the screen width at the new column count.

use tracing::warn;

use crate::config::PackerConfig;
use crate::error::{ErrorKind, PackError, Violation};
use crate::geometry::{Candidate, GridGeometry};

/// Where a correction resets the guess to, when it does not apply a delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum GuessReset {
    /// Recompute the area-based initial guess from the current tile count.
    AreaGuess,
    /// Pin the guess to the violated min/max bound's tile height.
    Bound(f64),
}

/// The plan the engine applies after a failed iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Correction {
    /// Signed height delta added to the guess. Zero when `reset` is set.
    pub delta: f64,
    /// Direct reset of the guess, taking precedence over `delta`.
    pub reset: Option<GuessReset>,
    /// Whether one tile must be removed before the next iteration.
    pub remove_tile: bool,
    /// Whether the search direction flag flips (overflow-height hysteresis).
    pub flip_direction: bool,
}

impl Correction {
    fn delta(delta: f64) -> Self {
        Self {
            delta,
            reset: None,
            remove_tile: false,
            flip_direction: false,
        }
    }

    fn reset(reset: GuessReset, remove_tile: bool) -> Self {
        Self {
            delta: 0.0,
            reset: Some(reset),
            remove_tile,
            flip_direction: false,
        }
    }
}

/// Decide the correction for `violation`, or a fatal error when the
/// violation cannot be corrected under the current configuration.
pub(crate) fn plan_correction<T>(
    config: &PackerConfig<T>,
    geometry: &GridGeometry,
    violation: &Violation,
    previous: Option<ErrorKind>,
    candidate: &Candidate,
    guess: f64,
) -> Result<Correction, PackError> {
    let columns = candidate.shape.columns;
    let delta_for = |new_columns: u32| {
        let target = geometry.dimensions_from_columns(new_columns.max(1));
        Correction::delta(target.height - guess)
    };

    let correction = match violation.kind {
        ErrorKind::ColumnMismatch => {
            if !config.can_remove_tiles {
                return Err(PackError::ColumnMismatch {
                    detail: violation.detail.clone(),
                });
            }
            Correction::reset(GuessReset::AreaGuess, true)
        }
        // More columns shrink the tile height.
        ErrorKind::OverflowHeight => Correction {
            flip_direction: true,
            ..delta_for(columns + 1)
        },
        ErrorKind::OverflowWidth => delta_for(columns.saturating_sub(1)),
        ErrorKind::UnderflowWidth => {
            // With no previous violation the guess may just be off by
            // rounding (the area-based guess ignores columns): retry the
            // same column count before reaching for one more.
            if previous.is_none() {
                delta_for(columns)
            } else {
                delta_for(columns + 1)
            }
        }
        ErrorKind::UnderflowHeight => Correction::delta(0.0),
        ErrorKind::BelowMinimum => Correction::reset(
            GuessReset::Bound(config.resolved_min_dimensions().1),
            config.can_remove_tiles,
        ),
        ErrorKind::AboveMaximum => match config.max_tile_height {
            Some(max_height) => {
                Correction::reset(GuessReset::Bound(max_height), config.can_remove_tiles)
            }
            // The validator only raises this kind when the bound is set.
            None => {
                warn!("above-maximum violation without a configured maximum tile height");
                Correction::delta(0.0)
            }
        },
    };
    Ok(correction)
}
