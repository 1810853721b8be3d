//! Zobrist hashing over piece placement and side to move.
//!
//! Keys are drawn from a fixed seed so hashes are identical across runs.
//! The hash is only 32 bits wide: unrelated positions can collide, and the
//! transposition table has to tolerate that.

use std::sync::OnceLock;

use crate::constants::MAX_CELLS;
use crate::position::{Move, Side};

const ZOBRIST_SEED: u64 = 0x5EED_CA97_0000_0001;

struct ZobristTables {
    cells: [[u32; 2]; MAX_CELLS],
    side: u32,
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut rng = fastrand::Rng::with_seed(ZOBRIST_SEED);
    let mut cells = [[0u32; 2]; MAX_CELLS];
    for keys in &mut cells {
        for key in keys {
            *key = rng.u32(..);
        }
    }
    ZobristTables {
        cells,
        side: rng.u32(..),
    }
}

/// Key for a piece of `side` standing on `cell`.
#[inline]
pub fn cell_key(cell: usize, side: Side) -> u32 {
    tables().cells[cell][side.index()]
}

/// Key mixed in while the second side is to move.
#[inline]
pub fn side_key() -> u32 {
    tables().side
}

/// Hash a full position from its piece lists.
pub fn init(pieces: &[Vec<usize>; 2], side: Side) -> u32 {
    let mut hash = if side == Side::Black { side_key() } else { 0 };
    for s in [Side::White, Side::Black] {
        for &cell in &pieces[s.index()] {
            hash ^= cell_key(cell, s);
        }
    }
    hash
}

/// Apply `mv`, made by `side`, to `hash`.
///
/// XOR is its own inverse, so the same call also takes the move back.
pub fn update(hash: u32, mv: &Move, side: Side) -> u32 {
    let mut hash = hash ^ side_key();
    if let Move::Step { from, to, captures } = mv {
        hash ^= cell_key(*from, side) ^ cell_key(*to, side);
        for &cell in captures {
            hash ^= cell_key(cell, side.opponent());
        }
    }
    hash
}
