//! Board state: grid, piece lists, side to move, and incremental hash.
//!
//! The grid and the per-side piece lists always agree: a cell holding a
//! piece of one side appears exactly once in that side's list. Moves are
//! applied with [`Position::play`] and taken back with [`Position::unplay`]
//! in strict stack order; the Zobrist hash is updated in both directions by
//! the same XOR delta.
//!
//! A position also caches which mirror symmetries it has. The cache is
//! dropped on every mutation and recomputed on first use, and it is exact:
//! move generation relies on it to skip mirror-redundant pieces.

use std::cell::Cell;
use std::fmt;
use std::ops::BitXor;

use crate::movegen::generate_moves;
use crate::variant::Variant;
use crate::zobrist;

/// One of the two players. White starts and owns the bottom rows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Index into per-side arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }
}

/// A move: either a pass or a one-cell orthogonal step with its captures.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    /// Only legal when the side to move has pieces but none can step.
    Pass,
    Step {
        from: usize,
        to: usize,
        /// Opponent pieces removed by this step, in detection order.
        captures: Vec<usize>,
    },
}

impl Move {
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, Move::Pass)
    }

    /// True for superior moves (at least one capture).
    #[inline]
    pub fn is_capture(&self) -> bool {
        matches!(self, Move::Step { captures, .. } if !captures.is_empty())
    }

    pub fn captures(&self) -> &[usize] {
        match self {
            Move::Pass => &[],
            Move::Step { captures, .. } => captures,
        }
    }

    /// `(from, to)` of a step, `None` for a pass.
    pub fn squares(&self) -> Option<(usize, usize)> {
        match self {
            Move::Pass => None,
            Move::Step { from, to, .. } => Some((*from, *to)),
        }
    }

    /// Two moves are the same if they go between the same cells.
    #[inline]
    pub fn same_as(&self, other: &Move) -> bool {
        self.squares() == other.squares()
    }
}

/// A set of board mirrors: horizontal (left/right), vertical (top/bottom),
/// or both.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flip(u8);

impl Flip {
    pub const NONE: Flip = Flip(0);
    pub const HORIZONTAL: Flip = Flip(1);
    pub const VERTICAL: Flip = Flip(2);
    pub const BOTH: Flip = Flip(3);

    #[inline]
    pub fn contains(self, other: Flip) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn from_bits(bits: u8) -> Option<Flip> {
        (bits <= 3).then_some(Flip(bits))
    }
}

impl BitXor for Flip {
    type Output = Flip;

    fn bitxor(self, rhs: Flip) -> Flip {
        Flip(self.0 ^ rhs.0)
    }
}

/// Content of a probed coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Square {
    Off,
    Empty,
    Piece(Side),
}

impl Square {
    /// Empty or off the board.
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, Square::Off | Square::Empty)
    }
}

/// A game position.
#[derive(Clone, Debug)]
pub struct Position {
    variant: &'static Variant,
    cells: Vec<Option<Side>>,
    pieces: [Vec<usize>; 2],
    side: Side,
    hash: u32,
    /// Mirrors under which the position is symmetric; `None` until computed.
    symmetry: Cell<Option<Flip>>,
}

impl Default for Position {
    fn default() -> Self {
        Self::new(Variant::default_variant())
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.variant.id == other.variant.id && self.side == other.side && self.cells == other.cells
    }
}

impl Eq for Position {}

impl Position {
    /// The starting position of `variant`, White to move.
    pub fn new(variant: &'static Variant) -> Self {
        let cells = variant
            .layout
            .iter()
            .map(|&d| match d {
                1 => Some(Side::White),
                2 => Some(Side::Black),
                _ => None,
            })
            .collect();
        Self::from_cells(variant, cells, Side::White)
    }

    /// Build a position from a full grid.
    ///
    /// # Panics
    ///
    /// Panics if `cells.len()` differs from the variant's cell count.
    pub fn from_cells(variant: &'static Variant, cells: Vec<Option<Side>>, side: Side) -> Self {
        assert_eq!(
            cells.len(),
            variant.cells(),
            "grid size does not match variant {}",
            variant.id
        );
        let mut pieces = [Vec::new(), Vec::new()];
        for (i, c) in cells.iter().enumerate() {
            if let Some(s) = c {
                pieces[s.index()].push(i);
            }
        }
        let hash = zobrist::init(&pieces, side);
        Position {
            variant,
            cells,
            pieces,
            side,
            hash,
            symmetry: Cell::new(None),
        }
    }

    #[inline]
    pub fn variant(&self) -> &'static Variant {
        self.variant
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.variant.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.variant.height
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    #[inline]
    pub fn cell(&self, cell: usize) -> Option<Side> {
        self.cells[cell]
    }

    pub fn cells(&self) -> &[Option<Side>] {
        &self.cells
    }

    /// Cells occupied by `side`, in no meaningful order.
    #[inline]
    pub fn pieces(&self, side: Side) -> &[usize] {
        &self.pieces[side.index()]
    }

    pub fn piece_lists(&self) -> &[Vec<usize>; 2] {
        &self.pieces
    }

    /// Legal moves for the side to move, captures first.
    pub fn moves(&self) -> Vec<Move> {
        generate_moves(self)
    }

    /// Apply a move produced by move generation for this position.
    pub fn play(&mut self, mv: &Move) {
        self.hash = zobrist::update(self.hash, mv, self.side);
        let us = self.side;
        self.side = us.opponent();

        let Move::Step { from, to, captures } = mv else {
            return;
        };
        self.cells[*to] = Some(us);
        self.cells[*from] = None;
        let own = &mut self.pieces[us.index()];
        match own.iter_mut().find(|c| **c == *from) {
            Some(slot) => *slot = *to,
            None => debug_assert!(false, "no piece on {from}"),
        }

        let theirs = &mut self.pieces[us.opponent().index()];
        for &cell in captures {
            self.cells[cell] = None;
            if let Some(i) = theirs.iter().position(|&c| c == cell) {
                theirs.swap_remove(i);
            }
        }
        self.symmetry.set(None);
    }

    /// Take back the move last applied with [`Position::play`].
    pub fn unplay(&mut self, mv: &Move) {
        let us = self.side.opponent();
        self.hash = zobrist::update(self.hash, mv, us);
        self.side = us;

        let Move::Step { from, to, captures } = mv else {
            return;
        };
        let theirs = &mut self.pieces[us.opponent().index()];
        for &cell in captures {
            self.cells[cell] = Some(us.opponent());
            theirs.push(cell);
        }

        self.cells[*to] = None;
        self.cells[*from] = Some(us);
        let own = &mut self.pieces[us.index()];
        match own.iter_mut().find(|c| **c == *to) {
            Some(slot) => *slot = *from,
            None => debug_assert!(false, "no piece on {to}"),
        }
        self.symmetry.set(None);
    }

    /// Convert a cell index into `(x, y)`, origin top-left.
    #[inline]
    pub fn coords(&self, cell: usize) -> (isize, isize) {
        let w = self.width();
        ((cell % w) as isize, (cell / w) as isize)
    }

    /// Cell index for in-board coordinates.
    #[inline]
    pub fn index(&self, x: isize, y: isize) -> usize {
        y as usize * self.width() + x as usize
    }

    /// What stands at `(x, y)`, which may lie off the board.
    #[inline]
    pub fn probe(&self, x: isize, y: isize) -> Square {
        if x < 0 || y < 0 || x >= self.width() as isize || y >= self.height() as isize {
            return Square::Off;
        }
        match self.cells[self.index(x, y)] {
            Some(s) => Square::Piece(s),
            None => Square::Empty,
        }
    }

    /// Mirror a cell index.
    pub fn flip_cell(&self, cell: usize, flip: Flip) -> usize {
        let (w, h) = (self.width(), self.height());
        let (mut x, mut y) = (cell % w, cell / w);
        if flip.contains(Flip::HORIZONTAL) {
            x = w - 1 - x;
        }
        if flip.contains(Flip::VERTICAL) {
            y = h - 1 - y;
        }
        y * w + x
    }

    /// Mirror a move, captures included.
    pub fn flip_move(&self, mv: &Move, flip: Flip) -> Move {
        match mv {
            Move::Pass => Move::Pass,
            Move::Step { from, to, captures } => Move::Step {
                from: self.flip_cell(*from, flip),
                to: self.flip_cell(*to, flip),
                captures: captures.iter().map(|&c| self.flip_cell(c, flip)).collect(),
            },
        }
    }

    /// Mirrors under which every piece lands on a piece of the same side.
    pub fn symmetry(&self) -> Flip {
        if let Some(flip) = self.symmetry.get() {
            return flip;
        }
        let mut flip = Flip::NONE;
        for dir in [Flip::HORIZONTAL, Flip::VERTICAL] {
            let holds = [Side::White, Side::Black].into_iter().all(|s| {
                self.pieces(s)
                    .iter()
                    .all(|&c| self.cells[self.flip_cell(c, dir)] == Some(s))
            });
            if holds {
                flip = flip ^ dir;
            }
        }
        self.symmetry.set(Some(flip));
        flip
    }

    /// True if a piece on `cell` mirrors a piece that move generation
    /// already covers.
    pub fn is_mirror_redundant(&self, cell: usize) -> bool {
        let symmetry = self.symmetry();
        let (x, y) = (cell % self.width(), cell / self.width());
        (symmetry.contains(Flip::HORIZONTAL) && 2 * x >= self.width())
            || (symmetry.contains(Flip::VERTICAL) && 2 * y >= self.height())
    }

    /// Name a cell: file letter from the left, rank from the bottom (`a1`).
    pub fn str_cell(&self, cell: usize) -> String {
        let (x, y) = (cell % self.width(), cell / self.width());
        format!("{}{}", (b'a' + x as u8) as char, self.height() - y)
    }

    /// Parse a cell name such as `b3`.
    pub fn parse_cell(&self, s: &str) -> Option<usize> {
        let mut chars = s.chars();
        let file = chars.next()?.to_ascii_lowercase();
        if !file.is_ascii_lowercase() {
            return None;
        }
        let x = (file as u8 - b'a') as usize;
        let rank: usize = chars.as_str().parse().ok()?;
        if x >= self.width() || rank == 0 || rank > self.height() {
            return None;
        }
        Some((self.height() - rank) * self.width() + x)
    }

    /// Name a move: `PASS`, or `<from><to>` with `+` for captures.
    pub fn str_move(&self, mv: &Move) -> String {
        match mv {
            Move::Pass => "PASS".into(),
            Move::Step { from, to, captures } => format!(
                "{}{}{}",
                self.str_cell(*from),
                self.str_cell(*to),
                if captures.is_empty() { "" } else { "+" }
            ),
        }
    }

    /// Parse `<from><to>` (an optional trailing `+` is ignored) into cells.
    pub fn parse_squares(&self, s: &str) -> Option<(usize, usize)> {
        let s = s.trim_end_matches('+');
        let split = s
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_ascii_alphabetic())
            .map(|(i, _)| i)?;
        Some((self.parse_cell(&s[..split])?, self.parse_cell(&s[split..])?))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height() {
            write!(f, "{} ", self.height() - y)?;
            for x in 0..self.width() {
                let ch = match self.cells[y * self.width() + x] {
                    Some(Side::White) => 'W',
                    Some(Side::Black) => 'B',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for x in 0..self.width() {
            write!(f, "{} ", (b'a' + x as u8) as char)?;
        }
        writeln!(f)?;
        write!(f, "{} to move", self.side.name())
    }
}
