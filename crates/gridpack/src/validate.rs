#![forbid(unsafe_code)]

//! Constraint validators.
//!
//! The feasibility pre-check runs once per search attempt and its failures
//! are fatal. The per-iteration validators run in a fixed order (fit screen,
//! min/max, column constraint) against each candidate grid and return at
//! most one [`Violation`] for the correction policy to act on.

use std::collections::BTreeMap;

use crate::config::PackerConfig;
use crate::error::{ErrorKind, PackError, Violation};
use crate::geometry::{Candidate, detail};

/// Cheap infeasibility screen, run before the guess loop starts.
///
/// Skipped entirely when tile removal is allowed: the engine can always
/// shrink its way out.
pub(crate) fn check_feasible<T>(
    config: &PackerConfig<T>,
    tile_count: usize,
) -> Result<(), PackError> {
    if config.can_remove_tiles {
        return Ok(());
    }
    if let Some(columns) = config.fixed_columns()
        && tile_count < columns as usize
        && !config.allow_incomplete_row
    {
        return Err(PackError::ColumnsExceedTileCount {
            columns,
            tile_count,
        });
    }
    if config.complete_rectangle && is_prime(tile_count) && !config.allow_incomplete_row {
        return Err(PackError::PrimeTileCount { tile_count });
    }
    let (min_width, min_height) = config.resolved_min_dimensions();
    let min_tile_area = min_width * min_height + config.gutter * config.gutter;
    if min_tile_area * tile_count as f64 > config.screen_area.area() {
        return Err(PackError::AreaInsufficient {
            screen_width: config.screen_area.width,
            screen_height: config.screen_area.height,
            tile_count,
            min_width,
            min_height,
        });
    }
    Ok(())
}

/// Check the candidate grid against the screen extents.
///
/// Overflow in either axis and width underflow are violations once past the
/// error margin. A single incomplete row is measured by its actual tile
/// count and is exempt from width underflow.
pub(crate) fn check_fit_screen<T>(
    config: &PackerConfig<T>,
    guess: f64,
    candidate: &Candidate,
    tile_count: usize,
) -> Result<(), Violation> {
    let gutter = config.gutter;
    let screen = config.screen_area;
    let columns = f64::from(candidate.shape.columns);
    let rows = f64::from(candidate.shape.rows);
    let single_incomplete_row = config.allow_incomplete_row && candidate.shape.rows == 1;

    let row_width = if single_incomplete_row {
        (candidate.dims.width + gutter) * tile_count as f64 + gutter
    } else {
        (candidate.dims.width + gutter) * columns + gutter
    };
    let column_height = (candidate.dims.height + gutter) * rows + gutter;

    if column_height > screen.height {
        let discrepancy = column_height - screen.height;
        if discrepancy.abs() > config.error_margin {
            let mut measured = BTreeMap::new();
            measured.insert("columnHeight".to_string(), column_height);
            measured.insert("screenHeight".to_string(), screen.height);
            return Err(Violation::new(
                ErrorKind::OverflowHeight,
                detail(
                    guess,
                    format!("columnHeight ({column_height}) > screenHeight ({})", screen.height),
                    measured,
                    vec![discrepancy],
                ),
            ));
        }
    }
    if row_width > screen.width {
        let discrepancy = row_width - screen.width;
        if discrepancy.abs() > config.error_margin {
            let mut measured = BTreeMap::new();
            measured.insert("rowWidth".to_string(), row_width);
            measured.insert("screenWidth".to_string(), screen.width);
            return Err(Violation::new(
                ErrorKind::OverflowWidth,
                detail(
                    guess,
                    format!("rowWidth ({row_width}) > screenWidth ({})", screen.width),
                    measured,
                    vec![discrepancy],
                ),
            ));
        }
    }
    if row_width < screen.width && !single_incomplete_row {
        let discrepancy = screen.width - row_width;
        if discrepancy.abs() > config.error_margin {
            let mut measured = BTreeMap::new();
            measured.insert("rowWidth".to_string(), row_width);
            measured.insert("screenWidth".to_string(), screen.width);
            return Err(Violation::new(
                ErrorKind::UnderflowWidth,
                detail(
                    guess,
                    format!("rowWidth ({row_width}) < screenWidth ({})", screen.width),
                    measured,
                    vec![discrepancy],
                ),
            ));
        }
    }
    Ok(())
}

/// Check the candidate tile height against the min/max bounds.
pub(crate) fn check_min_max<T>(
    config: &PackerConfig<T>,
    guess: f64,
    candidate: &Candidate,
) -> Result<(), Violation> {
    let height = candidate.dims.height;
    let (min_width, min_height) = config.resolved_min_dimensions();
    if height < min_height {
        let mut measured = candidate.measured();
        measured.insert("minTileWidth".to_string(), min_width);
        measured.insert("minTileHeight".to_string(), min_height);
        return Err(Violation::new(
            ErrorKind::BelowMinimum,
            detail(
                guess,
                format!("tileHeight ({height}) < minTileHeight ({min_height})"),
                measured,
                vec![min_height - height],
            ),
        ));
    }
    if let Some(max_height) = config.max_tile_height
        && height > max_height
    {
        let mut measured = candidate.measured();
        measured.insert("maxTileHeight".to_string(), max_height);
        return Err(Violation::new(
            ErrorKind::AboveMaximum,
            detail(
                guess,
                format!("tileHeight ({height}) > maxTileHeight ({max_height})"),
                measured,
                vec![max_height - height],
            ),
        ));
    }
    Ok(())
}

/// Check the derived column count against a fixed column constraint.
///
/// Tolerated when incomplete rows are allowed and there are fewer tiles
/// than columns: the row simply will not fill.
pub(crate) fn check_columns<T>(
    config: &PackerConfig<T>,
    guess: f64,
    candidate: &Candidate,
    tile_count: usize,
) -> Result<(), Violation> {
    let Some(fixed) = config.fixed_columns() else {
        return Ok(());
    };
    if config.allow_incomplete_row && tile_count < fixed as usize {
        return Ok(());
    }
    let derived = candidate.shape.columns;
    if derived != fixed {
        let mut measured = candidate.measured();
        measured.insert("fixedColumns".to_string(), f64::from(fixed));
        return Err(Violation::new(
            ErrorKind::ColumnMismatch,
            detail(
                guess,
                format!("columns ({derived}) != fixed columns ({fixed})"),
                measured,
                vec![f64::from(derived) - f64::from(fixed)],
            ),
        ));
    }
    Ok(())
}

/// Trial-division primality. Counts below 2 are not prime.
pub(crate) fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    let mut i = 2;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GridShape, Size, TileDimensions};

    fn config() -> PackerConfig<u32> {
        PackerConfig::new(Size::new(720.0, 480.0), (0..10).collect(), 0.8).gutter(5.0)
    }

    fn candidate(width: f64, height: f64, columns: u32, rows: u32) -> Candidate {
        Candidate {
            dims: TileDimensions { width, height },
            shape: GridShape { columns, rows },
        }
    }

    #[test]
    fn primes() {
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(is_prime(2));
        assert!(is_prime(13));
        assert!(!is_prime(12));
        assert!(is_prime(97));
        assert!(!is_prime(91)); // 7 * 13
    }

    #[test]
    fn feasibility_passes_trivially_when_removal_allowed() {
        let cfg = config().columns(99).can_remove_tiles(true);
        assert!(check_feasible(&cfg, 10).is_ok());
    }

    #[test]
    fn feasibility_rejects_columns_exceeding_tiles() {
        let cfg = config().columns(11);
        assert!(matches!(
            check_feasible(&cfg, 10),
            Err(PackError::ColumnsExceedTileCount {
                columns: 11,
                tile_count: 10
            })
        ));
        // Tolerated when incomplete rows are allowed.
        let cfg = config().columns(11).allow_incomplete_row(true);
        assert!(check_feasible(&cfg, 10).is_ok());
    }

    #[test]
    fn feasibility_rejects_prime_complete_rectangle() {
        let cfg = PackerConfig::new(Size::new(720.0, 480.0), (0..13).collect::<Vec<u32>>(), 0.8)
            .complete_rectangle(true);
        assert!(matches!(
            check_feasible(&cfg, 13),
            Err(PackError::PrimeTileCount { tile_count: 13 })
        ));
    }

    #[test]
    fn feasibility_rejects_insufficient_area() {
        let cfg = PackerConfig::new(Size::new(100.0, 100.0), (0..50).collect::<Vec<u32>>(), 1.0)
            .min_tile_width(20.0)
            .min_tile_height(20.0);
        assert!(matches!(
            check_feasible(&cfg, 50),
            Err(PackError::AreaInsufficient { .. })
        ));
    }

    #[test]
    fn fit_screen_detects_height_overflow_first() {
        let cfg = config();
        // Both axes overflow; height must win.
        let cand = candidate(400.0, 500.0, 3, 4);
        let violation = check_fit_screen(&cfg, 500.0, &cand, 10).unwrap_err();
        assert_eq!(violation.kind, ErrorKind::OverflowHeight);
        assert!(violation.detail.discrepancy[0] > 0.0);
        assert_eq!(violation.detail.guess, 500.0);
    }

    #[test]
    fn fit_screen_detects_width_overflow_and_underflow() {
        let cfg = config();
        // 5 columns of width 160 overflow 720.
        let cand = candidate(160.0, 50.0, 5, 2);
        assert_eq!(
            check_fit_screen(&cfg, 50.0, &cand, 10).unwrap_err().kind,
            ErrorKind::OverflowWidth
        );
        // 5 columns of width 100 underflow 720.
        let cand = candidate(100.0, 50.0, 5, 2);
        assert_eq!(
            check_fit_screen(&cfg, 50.0, &cand, 10).unwrap_err().kind,
            ErrorKind::UnderflowWidth
        );
    }

    #[test]
    fn fit_screen_respects_error_margin() {
        let cfg = config().error_margin(10.0);
        // Row width 715 is 5 short of 720, inside the margin.
        let cand = candidate(137.0, 80.0, 5, 2);
        assert!(check_fit_screen(&cfg, 80.0, &cand, 10).is_ok());
    }

    #[test]
    fn fit_screen_exempts_single_incomplete_row() {
        let cfg = config().columns(7).allow_incomplete_row(true);
        // 3 tiles in one row of a 7-column grid: row width measured by
        // tile count, underflow tolerated.
        let cand = candidate(90.0, 112.5, 7, 1);
        assert!(check_fit_screen(&cfg, 112.5, &cand, 3).is_ok());
    }

    #[test]
    fn min_max_violations_carry_bounds() {
        let cfg = config().min_tile_height(100.0);
        let cand = candidate(64.0, 80.0, 5, 2);
        let violation = check_min_max(&cfg, 80.0, &cand).unwrap_err();
        assert_eq!(violation.kind, ErrorKind::BelowMinimum);
        assert_eq!(violation.detail.discrepancy, vec![20.0]);

        let cfg = config().max_tile_height(50.0);
        let cand = candidate(64.0, 80.0, 5, 2);
        let violation = check_min_max(&cfg, 80.0, &cand).unwrap_err();
        assert_eq!(violation.kind, ErrorKind::AboveMaximum);
        assert_eq!(violation.detail.discrepancy, vec![-30.0]);
    }

    #[test]
    fn min_max_passes_at_exact_bound() {
        let cfg = config().max_tile_height(50.0);
        let cand = candidate(40.0, 50.0, 5, 2);
        assert!(check_min_max(&cfg, 50.0, &cand).is_ok());
    }

    #[test]
    fn column_constraint_mismatch() {
        let cfg = config().columns(3);
        let cand = candidate(138.0, 172.5, 5, 2);
        let violation = check_columns(&cfg, 172.5, &cand, 10).unwrap_err();
        assert_eq!(violation.kind, ErrorKind::ColumnMismatch);
        assert_eq!(violation.detail.discrepancy, vec![2.0]);
    }

    #[test]
    fn column_constraint_tolerates_short_incomplete_row() {
        let cfg = config().columns(7).allow_incomplete_row(true);
        let cand = candidate(90.0, 112.5, 5, 1);
        // 3 tiles < 7 fixed columns: tolerated.
        assert!(check_columns(&cfg, 112.5, &cand, 3).is_ok());
        // 10 tiles >= 7 columns: still a mismatch.
        assert!(check_columns(&cfg, 112.5, &cand, 10).is_err());
    }
}
