#![forbid(unsafe_code)]

//! The heuristic search engine.
//!
//! [`Packer::pack`] owns the single free variable of the search — the
//! tile-height guess — and drives the guess/validate/correct loop until a
//! candidate grid passes every validator or a fatal condition ends the
//! attempt. A successful candidate may still fail the complete-rectangle
//! check, which restarts the whole search with one tile removed or the
//! initial guess halved.
//!
//! # Invariants
//!
//! 1. State is rebuilt at the start of every `pack()` call and every
//!    completeness restart; the try log never carries across restarts, the
//!    removal list always carries across restarts within one call.
//! 2. One [`TryRecord`] is appended per iteration, terminal iterations
//!    included; a fatal error never returns with an unlogged violation.
//! 3. A returned [`PackingResult`] passed every validator: tiles never
//!    overflow the screen beyond the error margin.
//!
//! The engine is single-threaded and synchronous; concurrent callers each
//! need their own [`Packer`].

use serde::Serialize;
use tracing::{debug, warn};
use web_time::Instant;

use crate::config::{ConfigError, PackerConfig};
use crate::correction::{GuessReset, plan_correction};
use crate::error::{ErrorDetail, ErrorKind, PackError, Violation};
use crate::geometry::{Candidate, GridGeometry, GridShape, Size, TilePosition};
use crate::inventory::TileInventory;
use crate::tries::{TryLog, TryRecord};
use crate::validate;

type ObserverFn = Box<dyn FnMut(ErrorKind, f64, &ErrorDetail)>;

/// The solved layout: one tile size, one grid shape, per-tile positions,
/// and the full try log that led here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingResult<T> {
    pub tile_width: f64,
    pub tile_height: f64,
    pub columns: u32,
    pub rows: u32,
    /// One position per remaining tile, in tile order.
    pub positions: Vec<TilePosition>,
    /// The tiles that made it into the layout, in original order.
    pub tiles: Vec<T>,
    /// Every iteration of the final (post-restart) search attempt.
    pub tries: Vec<TryRecord>,
    /// Outer grid width, gutters on all sides included.
    pub real_width: f64,
    /// Outer grid height, gutters on all sides included.
    pub real_height: f64,
}

/// Mutable search state, rebuilt per attempt.
#[derive(Debug, Clone, Copy)]
struct HeuristicState {
    best_guess: f64,
    initial_guess: f64,
    /// Single-use hysteresis flag, flipped by overflow-height corrections.
    /// Kept as state; has no further behavioral effect.
    direction: i8,
    started: Instant,
}

impl HeuristicState {
    fn new(initial_guess: f64) -> Self {
        Self {
            best_guess: initial_guess,
            initial_guess,
            direction: 1,
            started: Instant::now(),
        }
    }
}

/// The packing engine. Owns a configuration, a tile inventory, and the
/// heuristic state of the current search.
pub struct Packer<T> {
    config: PackerConfig<T>,
    inventory: TileInventory<T>,
    state: HeuristicState,
    tries: TryLog,
    manual_guess: Option<f64>,
    observer: Option<ObserverFn>,
}

impl<T: Clone> Packer<T> {
    /// Take ownership of a configuration, validating its rules.
    pub fn new(config: PackerConfig<T>) -> Result<Self, ConfigError> {
        config.validate()?;
        let inventory = TileInventory::new(config.tiles.clone());
        Ok(Self {
            config,
            inventory,
            state: HeuristicState::new(0.0),
            tries: TryLog::new(),
            manual_guess: None,
            observer: None,
        })
    }

    /// Replace the configuration wholesale and reset all search state.
    pub fn reconfigure(&mut self, config: PackerConfig<T>) -> Result<(), ConfigError> {
        config.validate()?;
        self.inventory = TileInventory::new(config.tiles.clone());
        self.config = config;
        self.tries.clear();
        self.manual_guess = None;
        self.state = HeuristicState::new(0.0);
        Ok(())
    }

    /// Override the computed initial guess for subsequent `pack()` calls.
    ///
    /// Cleared by [`Packer::reconfigure`].
    pub fn set_best_guess_tile_height(&mut self, height: f64) {
        self.manual_guess = Some(height);
    }

    /// Install a callback invoked once per failed iteration with the
    /// violation kind, the applied correction, and the diagnostic detail.
    /// The terminal iteration of a fatal search is included. Informational
    /// only; it cannot influence the search.
    pub fn set_observer(&mut self, observer: impl FnMut(ErrorKind, f64, &ErrorDetail) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// The active configuration.
    pub fn config(&self) -> &PackerConfig<T> {
        &self.config
    }

    /// The try log of the most recent search attempt.
    pub fn tries(&self) -> &TryLog {
        &self.tries
    }

    /// Tiles removed during the most recent `pack()` call, in removal
    /// order.
    pub fn removed_tiles(&self) -> &[T] {
        self.inventory.removed()
    }

    /// Whether the most recent `pack()` call removed any tiles.
    pub fn was_any_tile_removed(&self) -> bool {
        self.inventory.any_removed()
    }

    /// Run the search to completion.
    ///
    /// Returns the solved layout or a fatal error; corrective violations
    /// never escape. All state is rebuilt at entry, so the call is
    /// repeatable.
    pub fn pack(&mut self) -> Result<PackingResult<T>, PackError> {
        let geometry = self.config.geometry();
        self.inventory = TileInventory::new(self.config.tiles.clone());
        self.tries.clear();
        let initial = match self.manual_guess {
            Some(guess) => guess,
            None => self.compute_initial_guess(&geometry, self.inventory.len())?,
        };
        self.state = HeuristicState::new(initial);

        loop {
            validate::check_feasible(&self.config, self.inventory.len())?;
            let candidate = self.search(&geometry)?;

            if self.config.complete_rectangle
                && self.inventory.len() % candidate.shape.columns as usize != 0
            {
                self.restart_for_completeness(&geometry)?;
                continue;
            }

            let tile_count = self.inventory.len();
            let positions =
                geometry.positions_for(candidate.shape.columns, candidate.dims, tile_count);
            let real = geometry.real_dimensions(
                candidate.shape,
                candidate.dims,
                tile_count,
                self.config.allow_incomplete_row,
            );
            return Ok(PackingResult {
                tile_width: candidate.dims.width,
                tile_height: candidate.dims.height,
                columns: candidate.shape.columns,
                rows: candidate.shape.rows,
                positions,
                tiles: self.inventory.remaining().to_vec(),
                tries: self.tries.records().to_vec(),
                real_width: real.width,
                real_height: real.height,
            });
        }
    }

    /// The bounded guess/validate/correct loop of one search attempt.
    fn search(&mut self, geometry: &GridGeometry) -> Result<Candidate, PackError> {
        let mut previous: Option<ErrorKind> = None;
        loop {
            if self.tries.len() >= self.config.try_limit as usize {
                return Err(PackError::TryLimitExceeded {
                    limit: self.config.try_limit,
                });
            }
            let elapsed = self.state.started.elapsed();
            if elapsed.as_millis() > u128::from(self.config.performance_limit_ms) {
                return Err(PackError::TimeLimitExceeded {
                    limit_ms: self.config.performance_limit_ms,
                    tries: self.tries.len(),
                });
            }

            let tile_count = self.inventory.len();
            let dims = geometry.dimensions_from_guess(self.state.best_guess)?;
            let columns = geometry.columns_from_width(
                dims.width,
                tile_count,
                self.config.allow_incomplete_row,
            )?;
            let candidate = Candidate {
                dims,
                shape: GridShape::for_tiles(tile_count, columns),
            };
            let positions = geometry.positions_for(columns, dims, tile_count);
            let guess = self.state.best_guess;

            let outcome = validate::check_fit_screen(&self.config, guess, &candidate, tile_count)
                .and_then(|()| validate::check_min_max(&self.config, guess, &candidate))
                .and_then(|()| validate::check_columns(&self.config, guess, &candidate, tile_count));

            let violation = match outcome {
                Ok(()) => {
                    debug!(
                        attempt = self.tries.len() + 1,
                        guess = self.state.best_guess,
                        columns = candidate.shape.columns,
                        rows = candidate.shape.rows,
                        "layout fits"
                    );
                    self.log_try(&candidate, Some(positions), None, 0.0);
                    return Ok(candidate);
                }
                Err(violation) => violation,
            };

            let plan = match plan_correction(
                &self.config,
                geometry,
                &violation,
                previous,
                &candidate,
                self.state.best_guess,
            ) {
                Ok(plan) => plan,
                Err(fatal) => {
                    self.notify(&violation, 0.0);
                    self.log_try(&candidate, Some(positions), Some(&violation), 0.0);
                    return Err(fatal);
                }
            };

            if plan.flip_direction {
                self.state.direction = -self.state.direction;
            }
            if plan.remove_tile {
                let prior = self.tries.last().and_then(|record| record.error);
                if let Err(fatal) = self.inventory.remove_one(prior.or(previous)) {
                    self.notify(&violation, plan.delta);
                    self.log_try(&candidate, Some(positions), Some(&violation), plan.delta);
                    return Err(fatal);
                }
            }

            match plan.reset {
                Some(GuessReset::AreaGuess) => {
                    self.state.best_guess = area_guess(geometry.screen, self.inventory.len());
                }
                Some(GuessReset::Bound(bound)) => {
                    self.state.best_guess = bound;
                }
                None => {
                    self.state.best_guess += plan.delta;
                }
            }

            if self.state.best_guess < 1.0 {
                if self.config.can_remove_tiles {
                    if let Err(fatal) = self.inventory.remove_one(Some(violation.kind)) {
                        self.notify(&violation, plan.delta);
                        self.log_try(&candidate, Some(positions), Some(&violation), plan.delta);
                        return Err(fatal);
                    }
                    self.state.best_guess = area_guess(geometry.screen, self.inventory.len());
                } else {
                    self.notify(&violation, plan.delta);
                    self.log_try(&candidate, Some(positions), Some(&violation), plan.delta);
                    return Err(PackError::ZeroHeight);
                }
            }

            self.notify(&violation, plan.delta);
            debug!(
                attempt = self.tries.len() + 1,
                kind = %violation.kind,
                correction = plan.delta,
                guess = self.state.best_guess,
                "corrective retry"
            );
            self.log_try(&candidate, Some(positions), Some(&violation), plan.delta);
            previous = Some(violation.kind);
        }
    }

    /// Coarse retry when a successful grid is not a complete rectangle.
    ///
    /// No per-iteration column nudge can fix a count/columns mismatch, so
    /// either a tile goes or the whole search restarts from half the
    /// initial guess.
    fn restart_for_completeness(&mut self, geometry: &GridGeometry) -> Result<(), PackError> {
        warn!(
            remaining = self.inventory.len(),
            "grid is not a complete rectangle; restarting search"
        );
        self.tries.clear();
        if self.config.can_remove_tiles {
            self.inventory.remove_one(None)?;
            let guess = self.compute_initial_guess(geometry, self.inventory.len())?;
            self.state = HeuristicState::new(guess);
        } else {
            let halved = self.state.initial_guess / 2.0;
            if halved < 1.0 {
                return Err(PackError::ZeroHeight);
            }
            self.state = HeuristicState::new(halved);
        }
        Ok(())
    }

    /// Initial guess: exact fit for fixed columns, otherwise the area
    /// heuristic. Deliberately overshoots — the corrective loop converges
    /// downward far more cheaply than upward.
    fn compute_initial_guess(
        &self,
        geometry: &GridGeometry,
        tile_count: usize,
    ) -> Result<f64, PackError> {
        let guess = match self.config.fixed_columns() {
            Some(columns) => geometry.dimensions_from_columns(columns).height,
            None => area_guess(geometry.screen, tile_count),
        };
        if !guess.is_finite() || guess < 1.0 {
            return Err(PackError::InvalidDimension {
                width: guess * self.config.tile_aspect_ratio,
                height: guess,
            });
        }
        Ok(guess)
    }

    fn notify(&mut self, violation: &Violation, correction: f64) {
        if let Some(observer) = self.observer.as_mut() {
            observer(violation.kind, correction, &violation.detail);
        }
    }

    fn log_try(
        &mut self,
        candidate: &Candidate,
        positions: Option<Vec<TilePosition>>,
        violation: Option<&Violation>,
        correction: f64,
    ) {
        self.tries.push(TryRecord {
            tile_width: candidate.dims.width,
            tile_height: candidate.dims.height,
            columns: candidate.shape.columns,
            rows: candidate.shape.rows,
            best_guess_tile_height: self.state.best_guess,
            error: violation.map(|violation| violation.kind),
            correction,
            error_detail: violation.map(|violation| violation.detail.clone()),
            positions,
            elapsed_ms: self.state.started.elapsed().as_secs_f64() * 1000.0,
        });
    }
}

/// Area-based guess: side of an even share of the screen per tile, doubled.
fn area_guess(screen: Size, tile_count: usize) -> f64 {
    (screen.area() / tile_count as f64).sqrt().floor() * 2.0
}
