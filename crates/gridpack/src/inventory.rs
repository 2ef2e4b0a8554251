#![forbid(unsafe_code)]

//! Ordered tile inventory with pop-from-end removal.
//!
//! Identifiers are opaque; order is the only thing that matters. Removal
//! always takes the last remaining tile and appends it to the removal list,
//! so `remaining + removed` is a stable permutation-free partition of the
//! original sequence.

use crate::error::{ErrorKind, PackError};

#[derive(Debug, Clone)]
pub(crate) struct TileInventory<T> {
    remaining: Vec<T>,
    removed: Vec<T>,
}

impl<T> TileInventory<T> {
    pub(crate) fn new(tiles: Vec<T>) -> Self {
        Self {
            remaining: tiles,
            removed: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.remaining.len()
    }

    pub(crate) fn remaining(&self) -> &[T] {
        &self.remaining
    }

    pub(crate) fn removed(&self) -> &[T] {
        &self.removed
    }

    pub(crate) fn any_removed(&self) -> bool {
        !self.removed.is_empty()
    }

    /// Remove the last remaining tile.
    ///
    /// `last_violation` is the violation that forced this removal; it is
    /// folded into the error when the inventory is already empty.
    pub(crate) fn remove_one(
        &mut self,
        last_violation: Option<ErrorKind>,
    ) -> Result<(), PackError> {
        match self.remaining.pop() {
            Some(tile) => {
                self.removed.push(tile);
                Ok(())
            }
            None => Err(PackError::NoTilesLeftToRemove {
                last: last_violation,
            }),
        }
    }
}
