//! Constants for scoring, search limits, and the transposition table.
//!
//! Board geometry is not fixed here: each variant carries its own width,
//! height, starting layout and positional weights (see [`crate::variant`]).
//! This module only holds values shared by every variant.

// =============================================================================
// Board Geometry
// =============================================================================

/// Widest board the Zobrist table is sized for.
pub const MAX_WIDTH: usize = 6;

/// Tallest board the Zobrist table is sized for.
pub const MAX_HEIGHT: usize = 6;

/// Number of cells the Zobrist table covers.
pub const MAX_CELLS: usize = MAX_WIDTH * MAX_HEIGHT;

/// Orthogonal step directions as (dx, dy): West, East, North, South.
pub const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

// =============================================================================
// Scores
// =============================================================================

/// Score for a position where the second side has no pieces left.
///
/// Mates found `n` plies from the root score `MATE_SCORE - n`.
pub const MATE_SCORE: i32 = 99_999;

/// Any score at or beyond this magnitude is a forced mate.
pub const MATE_BASE: i32 = 99_000;

/// Window bound standing in for infinity in alpha-beta.
pub const SCORE_INFINITY: i32 = 1_000_000;

/// Weight of one piece of material in the static evaluation.
pub const MATERIAL_WEIGHT: i32 = 90;

/// Below this magnitude a score is shown as drawish.
pub const SCORE_ADVANTAGE_THRESHOLD: i32 = 70;

/// Below this magnitude a non-drawish score is only an advantage.
pub const SCORE_WINNING_THRESHOLD: i32 = 170;

// =============================================================================
// Search Parameters
// =============================================================================

/// A position seen this many times on the current line scores as a draw.
pub const MAX_REPETITION: u32 = 2;

/// Shallowest iterative-deepening depth.
pub const MIN_SEARCH_DEPTH: u32 = 1;

/// Iterative deepening never starts deeper than this.
pub const BASE_SEARCH_DEPTH: u32 = 4;

/// Remaining depth below which captures extend the search by one ply.
pub const QUIESCENCE_DEPTH: i32 = 3;

/// Default wall-clock budget for one evaluation, in milliseconds.
pub const DEFAULT_TIME_LIMIT_MS: u64 = 500;

/// Default maximum search depth.
pub const DEFAULT_MAX_DEPTH: u32 = 4;

/// Length of one cooperative time slice, in milliseconds.
pub const YIELD_INTERVAL_MS: u64 = 300;

// =============================================================================
// Transposition Table
// =============================================================================

/// Default number of entries kept before eviction.
pub const DEFAULT_TABLE_SIZE: usize = 50_000;

/// Fraction of the table evicted when it fills up.
pub const COLD_TABLE_PERCENTAGE: f64 = 0.7;

// =============================================================================
// Game Rules
// =============================================================================

/// Moves (per side) without a capture before the game is drawn.
pub const MOVES_TO_DRAW: u32 = 50;
