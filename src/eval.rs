//! Static evaluation of leaf positions.
//!
//! Scores are from White's point of view: positive favours White.

use crate::constants::{DIRECTIONS, MATERIAL_WEIGHT};
use crate::position::{Position, Side, Square};

/// Heuristic score of `pos`.
///
/// - Two pieces against one: the bare material difference (±1).
/// - Two against two: exactly zero.
/// - Otherwise: weighted material, the variant's key-cell table, and
///   mobility.
pub fn evaluate(pos: &Position) -> i32 {
    let white = pos.pieces(Side::White).len() as i32;
    let black = pos.pieces(Side::Black).len() as i32;
    if white * black == 2 {
        return white - black;
    }
    if white == 2 && black == 2 {
        return 0;
    }
    (white - black) * MATERIAL_WEIGHT + key_cells(pos) + mobility(pos)
}

/// Sum of the variant's positional bonuses for what stands on each key cell.
fn key_cells(pos: &Position) -> i32 {
    pos.variant()
        .key_cells
        .iter()
        .map(|&(cell, weights)| match pos.cell(cell) {
            None => weights[0],
            Some(Side::White) => weights[1],
            Some(Side::Black) => weights[2],
        })
        .sum()
}

/// White's empty-neighbour count minus Black's.
fn mobility(pos: &Position) -> i32 {
    let mut degree = 0;
    for (side, sign) in [(Side::White, 1), (Side::Black, -1)] {
        for &cell in pos.pieces(side) {
            let (x, y) = pos.coords(cell);
            for (dx, dy) in DIRECTIONS {
                if pos.probe(x + dx, y + dy) == Square::Empty {
                    degree += sign;
                }
            }
        }
    }
    degree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    fn with_pieces(white: &[usize], black: &[usize]) -> Position {
        let mut cells = vec![None; 16];
        for &c in white {
            cells[c] = Some(Side::White);
        }
        for &c in black {
            cells[c] = Some(Side::Black);
        }
        Position::from_cells(Variant::default_variant(), cells, Side::White)
    }

    #[test]
    fn test_start_is_balanced() {
        for v in Variant::all() {
            assert_eq!(evaluate(&Position::new(v)), 0, "variant {}", v.id);
        }
    }

    #[test]
    fn test_two_against_one() {
        assert_eq!(evaluate(&with_pieces(&[0, 15], &[5])), 1);
        assert_eq!(evaluate(&with_pieces(&[5], &[0, 15])), -1);
    }

    #[test]
    fn test_two_against_two_is_zero() {
        assert_eq!(evaluate(&with_pieces(&[5, 6], &[0, 1])), 0);
    }

    #[test]
    fn test_material_key_cells_and_mobility() {
        // White on 5 (key cell +20) and two corners; Black on one corner.
        let pos = with_pieces(&[5, 12, 15], &[3]);
        let material = 2 * MATERIAL_WEIGHT;
        let key = 20;
        let mobility = 4 + 2 + 2 - 2;
        assert_eq!(evaluate(&pos), material + key + mobility);
    }
}
