//! A game in progress: the position plus what a host needs around it.
//!
//! Move requests are matched against the legal moves under every symmetry
//! of the position, since move generation only produces one move of each
//! mirrored pair. When a mirrored move matches, the view orientation is
//! flipped so that the board keeps looking the way the player expects.

use crate::codec::{encode_pv, to_code};
use crate::constants::{
    MATE_BASE, MATE_SCORE, MOVES_TO_DRAW, SCORE_ADVANTAGE_THRESHOLD, SCORE_WINNING_THRESHOLD,
};
use crate::position::{Flip, Move, Position, Side};

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(Side),
    /// No capture for the last `2 * MOVES_TO_DRAW` plies.
    Draw,
}

#[derive(Debug, Clone)]
struct Played {
    mv: Move,
    flip: Flip,
    /// Consecutive plies without a capture, this one included.
    quiet: u32,
}

#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    history: Vec<Played>,
    /// Number of history entries currently applied.
    index: usize,
    orientation: Flip,
}

impl Game {
    pub fn new(position: Position) -> Self {
        Self::with_orientation(position, Flip::NONE)
    }

    pub fn with_orientation(position: Position, orientation: Flip) -> Self {
        Game {
            position,
            history: Vec::new(),
            index: 0,
            orientation,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Mirror applied between board cells and the view.
    pub fn orientation(&self) -> Flip {
        self.orientation
    }

    /// Moves played so far, excluding undone ones.
    pub fn moves_played(&self) -> impl Iterator<Item = &Move> {
        self.history[..self.index].iter().map(|p| &p.mv)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.history.len()
    }

    /// Board cell shown at view cell `cell`, or vice versa.
    pub fn view_cell(&self, cell: usize) -> usize {
        self.position.flip_cell(cell, self.orientation)
    }

    /// Play the move from `from` to `to` (board cells), trying every
    /// symmetry of the position. `from == to` requests a pass, accepted only
    /// when passing is the sole legal move. Returns the move played, or
    /// `None` if nothing matched.
    pub fn play(&mut self, from: usize, to: usize) -> Option<Move> {
        let cells = self.position.variant().cells();
        if from >= cells || to >= cells {
            return None;
        }
        let moves = self.position.moves();
        let (mv, flip) = if from == to {
            match moves.as_slice() {
                [Move::Pass] => (Move::Pass, Flip::NONE),
                _ => return None,
            }
        } else {
            let symmetry = self.position.symmetry();
            [Flip::NONE, Flip::HORIZONTAL, Flip::VERTICAL, Flip::BOTH]
                .into_iter()
                .filter(|&f| symmetry.contains(f))
                .find_map(|f| {
                    let wanted = (
                        self.position.flip_cell(from, f),
                        self.position.flip_cell(to, f),
                    );
                    moves
                        .iter()
                        .find(|m| m.squares() == Some(wanted))
                        .map(|m| (m.clone(), f))
                })?
        };

        let quiet = if mv.is_capture() {
            0
        } else {
            self.quiet_plies() + 1
        };
        self.position.play(&mv);
        self.history.truncate(self.index);
        self.history.push(Played {
            mv: mv.clone(),
            flip,
            quiet,
        });
        self.index += 1;
        self.orientation = self.orientation ^ flip;
        log::debug!("played {}", self.position.str_move(&mv));
        Some(mv)
    }

    /// Play a move produced by the engine for the current position.
    pub fn play_move(&mut self, mv: &Move) -> Option<Move> {
        match mv.squares() {
            Some((from, to)) => self.play(from, to),
            None => self.play(0, 0),
        }
    }

    /// Play a move named in view coordinates, e.g. `a2b2` or `PASS`.
    pub fn play_named(&mut self, name: &str) -> Option<Move> {
        if name.eq_ignore_ascii_case("pass") {
            return self.play(0, 0);
        }
        let (from, to) = self.position.parse_squares(name)?;
        self.play(self.view_cell(from), self.view_cell(to))
    }

    /// Take back up to `count` moves; returns how many were taken back.
    pub fn undo(&mut self, count: usize) -> usize {
        let mut done = 0;
        while done < count && self.index > 0 {
            self.index -= 1;
            let played = &self.history[self.index];
            self.position.unplay(&played.mv);
            self.orientation = self.orientation ^ played.flip;
            done += 1;
        }
        done
    }

    /// Replay up to `count` undone moves; returns how many were replayed.
    pub fn redo(&mut self, count: usize) -> usize {
        let mut done = 0;
        while done < count && self.index < self.history.len() {
            let played = &self.history[self.index];
            self.position.play(&played.mv);
            self.orientation = self.orientation ^ played.flip;
            self.index += 1;
            done += 1;
        }
        done
    }

    /// Consecutive plies without a capture up to the current position.
    pub fn quiet_plies(&self) -> u32 {
        match self.index {
            0 => 0,
            i => self.history[i - 1].quiet,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.position.pieces(Side::Black).is_empty() {
            Some(Outcome::Win(Side::White))
        } else if self.position.pieces(Side::White).is_empty() {
            Some(Outcome::Win(Side::Black))
        } else if self.quiet_plies() >= 2 * MOVES_TO_DRAW {
            Some(Outcome::Draw)
        } else {
            None
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    /// Name a move as the view shows it.
    pub fn name_move(&self, mv: &Move) -> String {
        self.position
            .str_move(&self.position.flip_move(mv, self.orientation))
    }

    /// A line from the current position, as space-separated move names.
    pub fn pv_string(&self, pv: &[Move]) -> String {
        pv.iter()
            .map(|m| self.name_move(m))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fragment linking to an analysis of the current position, optionally
    /// with a line to replay.
    pub fn share_link(&self, pv: Option<&[Move]>) -> String {
        let mut link = format!(
            "#analysis={}{}",
            self.orientation.bits(),
            to_code(&self.position)
        );
        if let Some(pv) = pv {
            link.push_str("&#pv=");
            link.push_str(&encode_pv(&self.position, pv));
        }
        link
    }
}

fn mate_in(score: i32) -> i32 {
    (MATE_SCORE - score.abs() + 1) >> 1
}

/// Short score text: `M3`/`-M3` for mates, otherwise pawns to one decimal.
pub fn format_score(score: i32) -> String {
    if score.abs() >= MATE_BASE {
        let sign = if score > 0 { "" } else { "-" };
        return format!("{sign}M{}", mate_in(score));
    }
    let text = format!("{:.1}", score as f64 / 100.0);
    match text.as_str() {
        "-0.0" => "0.0".into(),
        _ => text,
    }
}

/// Long score text, e.g. `White is winning in 2 moves`.
pub fn describe_score(score: i32) -> String {
    let magnitude = score.abs();
    if magnitude < SCORE_ADVANTAGE_THRESHOLD {
        return "Drawish".into();
    }
    let side = if score > 0 { Side::White } else { Side::Black };
    let verdict = if magnitude == MATE_SCORE {
        "wins".to_string()
    } else if magnitude < SCORE_WINNING_THRESHOLD {
        "has an advantage".to_string()
    } else if magnitude >= MATE_BASE {
        let n = mate_in(score);
        format!("is winning in {n} move{}", if n == 1 { "" } else { "s" })
    } else {
        "is winning".to_string()
    };
    format!("{} {verdict}", side.name())
}
