//! Capgrid-Rust: an alpha-beta engine for small capture games on a grid.
//!
//! Two sides start on opposite home rows and step one cell orthogonally.
//! Completing a line of two friendly pieces against a lone enemy piece,
//! with open cells at both ends, captures it. A side without pieces loses.
//!
//! ## Modules
//!
//! - [`constants`] - Scores, search limits and table parameters
//! - [`variant`] - Board geometry, start layouts and positional weights
//! - [`zobrist`] - Incremental 32-bit position hashing
//! - [`position`] - Board state with exact play/unplay
//! - [`movegen`] - Legal moves and capture detection
//! - [`eval`] - Static evaluation
//! - [`ttable`] - Bounded transposition table
//! - [`search`] - Resumable iterative-deepening alpha-beta
//! - [`codec`] - Position codes, integer keys and PV links
//! - [`game`] - Move history, orientation and score text for hosts
//! - [`protocol`] - Line-oriented text protocol
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use capgrid_rust::codec::from_code;
//! use capgrid_rust::search::Engine;
//!
//! let pos = from_code("+1.80.56.28.40").unwrap();
//! let mut engine = Engine::default();
//! let result = engine.search(&pos, Duration::from_secs(5), 3);
//! println!("score {} best {:?}", result.score, result.best_move());
//! ```

pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod eval;
pub mod game;
pub mod movegen;
pub mod position;
pub mod protocol;
pub mod search;
pub mod ttable;
pub mod variant;
pub mod zobrist;
