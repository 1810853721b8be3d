//! Position codes and principal-variation encoding.
//!
//! Text codes look like `+1.80.49.0.40`: the side to move (`+` White, `-`
//! Black), the variant id, then one base-3 number per row from the top,
//! leftmost cell most significant, with 0 empty, 1 White and 2 Black.
//!
//! Integer keys pack the same information into an `i64`: the variant id
//! followed by one ternary digit per cell, negated when Black is to move.

use crate::error::{Error, Result};
use crate::position::{Move, Position, Side};
use crate::variant::Variant;

fn digit(cell: Option<Side>) -> u64 {
    match cell {
        None => 0,
        Some(Side::White) => 1,
        Some(Side::Black) => 2,
    }
}

fn from_digit(d: u64) -> Option<Side> {
    match d {
        1 => Some(Side::White),
        2 => Some(Side::Black),
        _ => None,
    }
}

fn side_prefix(side: Side) -> char {
    match side {
        Side::White => '+',
        Side::Black => '-',
    }
}

/// Encode a position as text.
pub fn to_code(pos: &Position) -> String {
    let mut code = format!("{}{}", side_prefix(pos.side()), pos.variant().id);
    for row in pos.cells().chunks(pos.width()) {
        let value = row.iter().fold(0u64, |acc, &c| 3 * acc + digit(c));
        code.push('.');
        code.push_str(&value.to_string());
    }
    code
}

/// Decode a text position code.
pub fn from_code(code: &str) -> Result<Position> {
    let code = code.trim();
    let side = match code.chars().next() {
        Some('+') => Side::White,
        Some('-') => Side::Black,
        _ => return Err(Error::MalformedCode(format!("{code:?} lacks a side prefix"))),
    };
    let mut parts = code[1..].split('.');
    let variant = Variant::by_id(parts.next().unwrap_or_default())?;
    let rows: Vec<&str> = parts.collect();
    if rows.len() != variant.height {
        return Err(Error::MalformedCode(format!(
            "expected {} rows, found {}",
            variant.height,
            rows.len()
        )));
    }

    let limit = 3u64.pow(variant.width as u32);
    let mut cells = Vec::with_capacity(variant.cells());
    for row in rows {
        let mut value: u64 = row
            .parse()
            .map_err(|_| Error::MalformedCode(format!("bad row {row:?}")))?;
        if value >= limit {
            return Err(Error::MalformedCode(format!("row {row} out of range")));
        }
        let mut line = vec![None; variant.width];
        for cell in line.iter_mut().rev() {
            *cell = from_digit(value % 3);
            value /= 3;
        }
        cells.extend(line);
    }
    Ok(Position::from_cells(variant, cells, side))
}

fn variant_number(variant: &Variant) -> Option<i64> {
    variant.id.parse().ok()
}

impl Position {
    /// The position packed into an integer.
    pub fn key(&self) -> i64 {
        let id = variant_number(self.variant()).unwrap_or(0);
        let key = self
            .cells()
            .iter()
            .fold(id, |acc, &c| 3 * acc + digit(c) as i64);
        match self.side() {
            Side::White => key,
            Side::Black => -key,
        }
    }

    /// Unpack an integer key produced by [`Position::key`].
    pub fn from_key(key: i64) -> Result<Position> {
        let side = if key < 0 { Side::Black } else { Side::White };
        let magnitude = key.unsigned_abs();
        let variant = Variant::all()
            .iter()
            .find(|v| {
                let span = 3u64.pow(v.cells() as u32);
                variant_number(v).is_some_and(|id| magnitude / span == id as u64)
            })
            .ok_or(Error::MalformedKey(key))?;

        let mut rest = magnitude;
        let mut cells = vec![None; variant.cells()];
        for cell in cells.iter_mut().rev() {
            *cell = from_digit(rest % 3);
            rest /= 3;
        }
        Ok(Position::from_cells(variant, cells, side))
    }
}

/// Legal moves of `pos` in the canonical order used by PV links.
pub fn sorted_moves(pos: &Position) -> Vec<Move> {
    let mut moves = pos.moves();
    moves.sort_by_key(|m| m.squares());
    moves
}

/// Encode a line from `pos` as comma-separated indices into
/// [`sorted_moves`]. Stops at the first move that is not legal.
pub fn encode_pv(pos: &Position, pv: &[Move]) -> String {
    let mut board = pos.clone();
    let mut indices = Vec::new();
    for mv in pv {
        let moves = sorted_moves(&board);
        let Some(i) = moves.iter().position(|m| m.same_as(mv)) else {
            break;
        };
        board.play(&moves[i]);
        indices.push(i.to_string());
    }
    indices.join(",")
}

/// Replay a line encoded by [`encode_pv`], returning its moves.
pub fn decode_pv(pos: &Position, encoded: &str) -> Result<Vec<Move>> {
    let mut board = pos.clone();
    let mut line = Vec::new();
    for part in encoded.split(',').filter(|p| !p.is_empty()) {
        let i: usize = part
            .trim()
            .parse()
            .map_err(|_| Error::MalformedPv(format!("bad index {part:?}")))?;
        let mv = sorted_moves(&board)
            .into_iter()
            .nth(i)
            .ok_or_else(|| Error::MalformedPv(format!("no move at index {i}")))?;
        board.play(&mv);
        line.push(mv);
    }
    Ok(line)
}
