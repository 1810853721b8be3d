//! Legal move generation with capture detection.
//!
//! A piece steps one cell orthogonally onto an empty cell. The step captures
//! when it completes a line of exactly two friendly pieces against a lone
//! opponent piece, with open cells (empty or off-board) at both ends:
//!
//! - straight: the line runs along the step direction, the mover's new cell
//!   being the back of the pair (`mover own enemy open`);
//! - lateral: the line runs across the step direction through the
//!   destination, the mover being either the back of the pair
//!   (`open mover own enemy open`) or the front
//!   (`open own mover enemy open`), on either side.
//!
//! Captures come first in the returned list; the relative order of the
//! generated moves is otherwise preserved.

use crate::constants::DIRECTIONS;
use crate::position::{Move, Position, Square};

/// Generate all legal moves for the side to move.
///
/// Pieces that mirror another piece under the position's symmetry are
/// skipped. When the side has pieces but none can step, the only move is a
/// pass; a side without pieces gets no moves at all.
pub fn generate_moves(pos: &Position) -> Vec<Move> {
    let side = pos.side();
    let mut superior = Vec::new();
    let mut quiet = Vec::new();

    for &from in pos.pieces(side) {
        if pos.is_mirror_redundant(from) {
            continue;
        }
        let (x, y) = pos.coords(from);
        for (dx, dy) in DIRECTIONS {
            if pos.probe(x + dx, y + dy) != Square::Empty {
                continue;
            }
            let captures = step_captures(pos, x, y, dx, dy);
            let mv = Move::Step {
                from,
                to: pos.index(x + dx, y + dy),
                captures,
            };
            if mv.is_capture() {
                superior.push(mv);
            } else {
                quiet.push(mv);
            }
        }
    }

    if superior.is_empty() && quiet.is_empty() {
        if !pos.pieces(side).is_empty() {
            return vec![Move::Pass];
        }
        return Vec::new();
    }
    superior.append(&mut quiet);
    superior
}

/// Cells captured by the piece at `(x, y)` stepping by `(dx, dy)`.
fn step_captures(pos: &Position, x: isize, y: isize, dx: isize, dy: isize) -> Vec<usize> {
    let own = Square::Piece(pos.side());
    let enemy = Square::Piece(pos.side().opponent());
    let at = |k: isize, along: isize, across: isize, sign: isize| {
        // Cell `k` steps from the destination: `along` the move, `across` it.
        pos.probe(
            x + dx + k * (along * dx + across * sign * dy),
            y + dy + k * (along * dy + across * sign * dx),
        )
    };
    let mut captures = Vec::new();

    // Straight: mover, own, enemy, open.
    if at(1, 1, 0, 0) == own && at(2, 1, 0, 0) == enemy && at(3, 1, 0, 0).is_open() {
        captures.push(pos.index(x + 3 * dx, y + 3 * dy));
    }

    for sign in [-1, 1] {
        let across = |k: isize| at(k, 0, 1, sign);
        // Mover at the back: open, mover, own, enemy, open.
        if across(1).is_open() && across(-1) == own && across(-2) == enemy && across(-3).is_open()
        {
            captures.push(cell_across(pos, x, y, dx, dy, sign, -2));
        }
        // Mover at the front: open, own, mover, enemy, open.
        if across(1) == own && across(2).is_open() && across(-1) == enemy && across(-2).is_open() {
            captures.push(cell_across(pos, x, y, dx, dy, sign, -1));
        }
    }
    captures
}

/// Index of the cell `k` steps across the move from the destination.
#[inline]
fn cell_across(pos: &Position, x: isize, y: isize, dx: isize, dy: isize, sign: isize, k: isize) -> usize {
    pos.index(x + dx + k * sign * dy, y + dy + k * sign * dx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Side;
    use crate::variant::Variant;

    /// Build a position on `variant` from (white, black) cell name lists.
    fn setpos(variant: &str, white: &[&str], black: &[&str], side: Side) -> Position {
        let variant = Variant::by_id(variant).unwrap();
        let probe = Position::new(variant);
        let mut cells = vec![None; variant.cells()];
        for name in white {
            cells[probe.parse_cell(name).unwrap()] = Some(Side::White);
        }
        for name in black {
            cells[probe.parse_cell(name).unwrap()] = Some(Side::Black);
        }
        Position::from_cells(variant, cells, side)
    }

    fn find(pos: &Position, mv: &str) -> Move {
        let (from, to) = pos.parse_squares(mv).unwrap();
        pos.moves()
            .into_iter()
            .find(|m| m.squares() == Some((from, to)))
            .unwrap_or_else(|| panic!("{mv} is not generated"))
    }

    #[test]
    fn test_start_moves_use_symmetry() {
        let pos = Position::default();
        let moves = pos.moves();
        let names: Vec<String> = moves.iter().map(|m| pos.str_move(m)).collect();
        assert_eq!(moves.len(), 2, "{names:?}");
        assert!(names.contains(&"a2b2".to_string()));
        assert!(names.contains(&"b1b2".to_string()));
    }

    #[test]
    fn test_straight_capture() {
        // a1 steps to b1: b1 c1 d1 = mover, own, enemy; off board beyond.
        let pos = setpos("1", &["a1", "c1"], &["d1", "a4"], Side::White);
        let mv = find(&pos, "a1b1");
        assert_eq!(mv.captures(), &[pos.parse_cell("d1").unwrap()]);
    }

    #[test]
    fn test_straight_capture_needs_every_condition() {
        // Open cell beyond the enemy: captured.
        let pos = setpos("3", &["a1", "c1"], &["d1", "a5"], Side::White);
        assert!(find(&pos, "a1b1").is_capture());

        // Friendly piece beyond the enemy.
        let pos = setpos("3", &["a1", "c1", "e1"], &["d1", "a5"], Side::White);
        assert!(!find(&pos, "a1b1").is_capture());

        // Enemy piece beyond the enemy.
        let pos = setpos("3", &["a1", "c1"], &["d1", "e1", "a5"], Side::White);
        assert!(!find(&pos, "a1b1").is_capture());

        // No friendly piece two cells ahead.
        let pos = setpos("3", &["a1"], &["d1", "a5"], Side::White);
        assert!(!find(&pos, "a1b1").is_capture());

        // No enemy three cells ahead.
        let pos = setpos("3", &["a1", "c1"], &["a5"], Side::White);
        assert!(!find(&pos, "a1b1").is_capture());
    }

    #[test]
    fn test_lateral_capture_mover_at_back() {
        // a3 steps to b3; b2 is own, b1 enemy, b4 open.
        let pos = setpos("1", &["a3", "b2"], &["b1", "d4"], Side::White);
        let mv = find(&pos, "a3b3");
        assert_eq!(mv.captures(), &[pos.parse_cell("b1").unwrap()]);
    }

    #[test]
    fn test_lateral_capture_mover_at_front() {
        // a3 steps to b3; b2 is own, b4 enemy, b1 open.
        let pos = setpos("1", &["a3", "b2"], &["b4", "d1"], Side::White);
        let mv = find(&pos, "a3b3");
        assert_eq!(mv.captures(), &[pos.parse_cell("b4").unwrap()]);
    }

    #[test]
    fn test_lateral_capture_blocked_by_third_piece() {
        // Three white pieces in the line: no capture.
        let pos = setpos("3", &["a3", "b2", "b4"], &["b5", "e1"], Side::White);
        assert!(!find(&pos, "a3b3").is_capture());
    }

    #[test]
    fn test_captures_ordered_first() {
        let pos = setpos("1", &["a1", "c1", "a3"], &["d1", "d4"], Side::White);
        let moves = pos.moves();
        let first_quiet = moves.iter().position(|m| !m.is_capture()).unwrap();
        assert!(moves[..first_quiet].iter().all(Move::is_capture));
        assert!(moves[first_quiet..].iter().all(|m| !m.is_capture()));
        assert!(first_quiet >= 1);
    }

    #[test]
    fn test_pass_when_blocked() {
        // White's lone piece is boxed in by Black.
        let pos = setpos("1", &["a1"], &["a2", "b1"], Side::White);
        assert_eq!(pos.moves(), vec![Move::Pass]);
    }

    #[test]
    fn test_no_moves_without_pieces() {
        let pos = setpos("1", &[], &["a2"], Side::White);
        assert!(pos.moves().is_empty());
    }

    #[test]
    fn test_moves_keep_board_consistent() {
        let pos = setpos("3", &["a1", "c1", "b3", "c2"], &["d1", "c3", "b4", "e5"], Side::White);
        for mv in pos.moves() {
            let mut next = pos.clone();
            next.play(&mv);
            let total: usize = [Side::White, Side::Black]
                .iter()
                .map(|&s| next.pieces(s).len())
                .sum();
            let occupied = next.cells().iter().filter(|c| c.is_some()).count();
            assert_eq!(total, occupied);
            for side in [Side::White, Side::Black] {
                for &c in next.pieces(side) {
                    assert_eq!(next.cell(c), Some(side));
                }
            }
        }
    }
}
