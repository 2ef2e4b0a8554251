#![forbid(unsafe_code)]

//! The try log: an append-only record of every search iteration.
//!
//! One [`TryRecord`] is built per iteration, after its outcome is known,
//! and appended exactly once — successful and terminal iterations included.
//! External UIs replay a search by indexing into the log and re-deriving
//! positions from the recorded geometry.

use serde::Serialize;

use crate::error::{ErrorDetail, ErrorKind};
use crate::geometry::TilePosition;

/// One guess → validate → (correct | succeed) iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TryRecord {
    /// Tile width the guess produced, gutter excluded.
    pub tile_width: f64,
    /// Tile height the guess produced, gutter excluded.
    pub tile_height: f64,
    pub columns: u32,
    pub rows: u32,
    /// The guess after this iteration's correction was applied.
    pub best_guess_tile_height: f64,
    /// The violation this iteration raised, `None` on success.
    pub error: Option<ErrorKind>,
    /// Signed height correction applied in response.
    pub correction: f64,
    /// Diagnostics for the violation, when one was raised.
    pub error_detail: Option<ErrorDetail>,
    /// Positions laid out for this iteration's candidate.
    pub positions: Option<Vec<TilePosition>>,
    /// Milliseconds since the attempt's clock started.
    pub elapsed_ms: f64,
}

/// Append-only, index-addressable sequence of [`TryRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct TryLog {
    records: Vec<TryRecord>,
}

impl TryLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: TryRecord) {
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of recorded tries.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether anything has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at `index`, in iteration order.
    pub fn get(&self, index: usize) -> Option<&TryRecord> {
        self.records.get(index)
    }

    /// The most recent record.
    pub fn last(&self) -> Option<&TryRecord> {
        self.records.last()
    }

    /// All records in iteration order.
    pub fn records(&self) -> &[TryRecord] {
        &self.records
    }

    /// Iterate the records in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = &TryRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(guess: f64, error: Option<ErrorKind>) -> TryRecord {
        TryRecord {
            tile_width: guess * 0.8,
            tile_height: guess,
            columns: 4,
            rows: 3,
            best_guess_tile_height: guess,
            error,
            correction: 0.0,
            error_detail: None,
            positions: None,
            elapsed_ms: 0.5,
        }
    }

    #[test]
    fn appends_in_order_and_indexes() {
        let mut log = TryLog::new();
        assert!(log.is_empty());
        log.push(record(100.0, Some(ErrorKind::OverflowHeight)));
        log.push(record(80.0, None));
        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0).unwrap().best_guess_tile_height, 100.0);
        assert_eq!(log.get(1).unwrap().error, None);
        assert_eq!(log.last().unwrap().best_guess_tile_height, 80.0);
        assert!(log.get(2).is_none());
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = TryLog::new();
        log.push(record(100.0, None));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(record(100.0, Some(ErrorKind::UnderflowWidth))).unwrap();
        assert!(json.get("tileWidth").is_some());
        assert!(json.get("bestGuessTileHeight").is_some());
        assert!(json.get("elapsedMs").is_some());
        assert_eq!(json["error"], "underflowWidth");
    }
}
