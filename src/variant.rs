//! Board variants: geometry, starting layout, and positional weights.
//!
//! Each variant is a plain configuration record selected by its id. Layout
//! digits use the same encoding as the position code: `0` empty, `1` first
//! side, `2` second side.

use crate::error::{Error, Result};

/// Positional bonus for one key cell, indexed by cell content
/// (empty, first side, second side).
pub type KeyCell = (usize, [i32; 3]);

/// A fixed board configuration.
#[derive(Debug, PartialEq, Eq)]
pub struct Variant {
    pub id: &'static str,
    pub name: &'static str,
    pub width: usize,
    pub height: usize,
    /// Starting layout, row by row from the top.
    pub layout: &'static [u8],
    /// Cells next to each home row and their weights.
    pub key_cells: &'static [KeyCell],
}

impl Variant {
    /// Number of cells on the board.
    #[inline]
    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Look up a variant by id.
    pub fn by_id(id: &str) -> Result<&'static Variant> {
        VARIANTS
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| Error::UnknownVariant(id.to_string()))
    }

    /// The variant used when none is specified.
    pub fn default_variant() -> &'static Variant {
        &VARIANTS[0]
    }

    /// All known variants.
    pub fn all() -> &'static [Variant] {
        &VARIANTS
    }
}

#[rustfmt::skip]
static VARIANTS: [Variant; 3] = [
    Variant {
        id: "1",
        name: "4x4",
        width: 4,
        height: 4,
        layout: &[
            2, 2, 2, 2,
            2, 0, 0, 2,
            1, 0, 0, 1,
            1, 1, 1, 1,
        ],
        key_cells: &[
            (5, [0, 20, -10]),
            (6, [0, 20, -10]),
            (9, [0, 10, -20]),
            (10, [0, 10, -20]),
        ],
    },
    Variant {
        id: "2",
        name: "5x4",
        width: 5,
        height: 4,
        layout: &[
            2, 2, 2, 2, 2,
            2, 0, 0, 0, 2,
            1, 0, 0, 0, 1,
            1, 1, 1, 1, 1,
        ],
        key_cells: &[
            (6, [0, 11, -9]),
            (7, [0, 11, -9]),
            (8, [0, 11, -9]),
            (11, [0, 9, -11]),
            (12, [0, 9, -11]),
            (13, [0, 9, -11]),
        ],
    },
    Variant {
        id: "3",
        name: "5x5",
        width: 5,
        height: 5,
        layout: &[
            2, 2, 2, 2, 2,
            2, 0, 0, 0, 2,
            0, 0, 0, 0, 0,
            1, 0, 0, 0, 1,
            1, 1, 1, 1, 1,
        ],
        key_cells: &[
            (6, [0, 12, -8]),
            (7, [0, 12, -8]),
            (8, [0, 12, -8]),
            (11, [0, 10, -10]),
            (12, [0, 20, -20]),
            (13, [0, 10, -10]),
            (16, [0, 8, -12]),
            (17, [0, 8, -12]),
            (18, [0, 8, -12]),
        ],
    },
];
