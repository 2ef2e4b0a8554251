#![forbid(unsafe_code)]

//! Heuristic rectangle packing for same-aspect-ratio tiles.
//!
//! Given a screen area and a set of tiles that all share one aspect ratio,
//! the engine finds a single tile size and a column/row grid that fill the
//! screen, honoring optional constraints (gutter, fixed columns, min/max
//! tile height, complete rectangle, incomplete last row, tile removal).
//! The search guesses a tile height, validates the resulting grid, and
//! corrects the guess from the specific violation until it converges or a
//! try/time budget runs out.
//!
//! ```
//! use gridpack::{Packer, PackerConfig, Size};
//!
//! let config = PackerConfig::new(
//!     Size::new(720.0, 480.0),
//!     vec!["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg", "f.jpg"],
//!     0.8,
//! )
//! .gutter(5.0);
//! let mut packer = Packer::new(config)?;
//! let layout = packer.pack()?;
//! assert_eq!(layout.positions.len(), 6);
//! assert!(layout.real_width <= 720.0 + 0.01);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Every iteration is recorded in [`PackingResult::tries`], so a caller can
//! replay or visualize how the search converged.

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod tries;

mod correction;
mod inventory;
mod validate;

pub use config::{ConfigError, PackerConfig};
pub use engine::{Packer, PackingResult};
pub use error::{ErrorDetail, ErrorKind, PackError, Violation};
pub use geometry::{GridGeometry, GridShape, Size, TileDimensions, TilePosition};
pub use tries::{TryLog, TryRecord};
