//! Integration tests for capgrid-rust
//!
//! End-to-end properties of the engine through the public API: codec
//! round trips, exact play/unplay, move legality, agreement of the
//! alpha-beta search with a plain minimax, mate scoring and the resumable
//! driver.

use std::collections::HashMap;
use std::time::Duration;

use capgrid_rust::codec::{from_code, to_code};
use capgrid_rust::constants::{MATE_BASE, MATE_SCORE, MAX_REPETITION, QUIESCENCE_DEPTH};
use capgrid_rust::eval::evaluate;
use capgrid_rust::position::{Move, Position, Side};
use capgrid_rust::search::{Engine, Progress, Step};
use capgrid_rust::variant::Variant;
use capgrid_rust::zobrist;

const LONG: Duration = Duration::from_secs(600);

// =============================================================================
// Helper functions
// =============================================================================

/// Positions reached by seeded random games on every variant.
fn random_positions(games: usize, plies: usize) -> Vec<Position> {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut out = Vec::new();
    for variant in Variant::all() {
        for _ in 0..games {
            let mut pos = Position::new(variant);
            out.push(pos.clone());
            for _ in 0..plies {
                let moves = pos.moves();
                if moves.is_empty() {
                    break;
                }
                let mv = moves[rng.usize(..moves.len())].clone();
                pos.play(&mv);
                out.push(pos.clone());
            }
        }
    }
    out
}

/// Plain minimax under the engine's rules: mate by elimination, draw on
/// repetition, capture extension near the horizon.
fn minimax(pos: &mut Position, ply: i32, depth: i32, repeats: &mut HashMap<u32, u32>) -> i32 {
    if pos.pieces(Side::Black).is_empty() {
        return MATE_SCORE - ply;
    }
    if pos.pieces(Side::White).is_empty() {
        return -MATE_SCORE + ply;
    }
    if repeats.get(&pos.hash()).copied().unwrap_or(0) >= MAX_REPETITION {
        return 0;
    }
    if depth <= 0 {
        return evaluate(pos);
    }

    let side = pos.side();
    let mut best: Option<i32> = None;
    for mv in pos.moves() {
        pos.play(&mv);
        let hash = pos.hash();
        *repeats.entry(hash).or_insert(0) += 1;
        let mut child_depth = depth - 1;
        if depth < QUIESCENCE_DEPTH && mv.is_capture() {
            child_depth += 1;
        }
        let score = minimax(pos, ply + 1, child_depth, repeats);
        *repeats.entry(hash).or_insert(1) -= 1;
        pos.unplay(&mv);
        best = Some(match (best, side) {
            (None, _) => score,
            (Some(b), Side::White) => b.max(score),
            (Some(b), Side::Black) => b.min(score),
        });
    }
    best.unwrap_or(0)
}

fn reference_score(pos: &Position, depth: u32) -> i32 {
    let mut board = pos.clone();
    let mut repeats = HashMap::from([(pos.hash(), 1)]);
    minimax(&mut board, 0, depth as i32, &mut repeats)
}

// =============================================================================
// Codec and board state
// =============================================================================

#[test]
fn test_code_and_key_round_trip() {
    for pos in random_positions(3, 30) {
        let code = to_code(&pos);
        let decoded = from_code(&code).unwrap();
        assert_eq!(decoded, pos, "{code}");
        assert_eq!(decoded.hash(), pos.hash(), "{code}");
        for side in [Side::White, Side::Black] {
            let mut a = decoded.pieces(side).to_vec();
            let mut b = pos.pieces(side).to_vec();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b, "{code}");
        }
        assert_eq!(Position::from_key(pos.key()).unwrap(), pos, "{code}");
    }
}

#[test]
fn test_play_unplay_restores_everything() {
    for pos in random_positions(2, 25) {
        for mv in pos.moves() {
            let mut board = pos.clone();
            board.play(&mv);
            assert_eq!(board.hash(), zobrist::update(pos.hash(), &mv, pos.side()));
            assert_eq!(board.hash(), from_code(&to_code(&board)).unwrap().hash());
            board.unplay(&mv);
            assert_eq!(board, pos);
            assert_eq!(board.hash(), pos.hash());
        }
    }
}

#[test]
fn test_generated_moves_are_legal() {
    for pos in random_positions(2, 25) {
        let side = pos.side();
        let moves = pos.moves();
        if pos.pieces(side).is_empty() {
            assert!(moves.is_empty());
            continue;
        }
        for mv in &moves {
            let Some((from, to)) = mv.squares() else {
                assert_eq!(moves.len(), 1, "pass must be the only move");
                continue;
            };
            assert_eq!(pos.cell(from), Some(side));
            assert_eq!(pos.cell(to), None);
            let (fx, fy) = pos.coords(from);
            let (tx, ty) = pos.coords(to);
            assert_eq!((fx - tx).abs() + (fy - ty).abs(), 1);
            for &c in mv.captures() {
                assert_eq!(pos.cell(c), Some(side.opponent()));
            }

            let mut next = pos.clone();
            next.play(mv);
            assert_eq!(next.pieces(side).len(), pos.pieces(side).len());
            assert_eq!(
                next.pieces(side.opponent()).len(),
                pos.pieces(side.opponent()).len() - mv.captures().len()
            );
        }
    }
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn test_alpha_beta_matches_minimax_on_start() {
    for depth in 1..=4 {
        let pos = Position::default();
        let result = Engine::new(0).search(&pos, LONG, depth);
        assert_eq!(result.depth, depth);
        assert_eq!(result.score, reference_score(&pos, depth), "depth {depth}");
    }
}

#[test]
fn test_alpha_beta_matches_minimax_midgame() {
    for (i, pos) in random_positions(1, 12).into_iter().enumerate().step_by(4) {
        let result = Engine::new(0).search(&pos, LONG, 3);
        assert_eq!(result.score, reference_score(&pos, 3), "position {i}: {}", to_code(&pos));
    }
}

#[test]
fn test_immediate_capture_of_last_piece() {
    // White a1 and c1, Black only d1: a1b1 takes it.
    let pos = from_code("+1.0.0.0.32").unwrap();
    let result = Engine::default().search(&pos, LONG, 2);
    assert_eq!(result.score, MATE_SCORE - 1);
    assert!(result.is_mate());
    let best = result.best_move().unwrap();
    assert_eq!(pos.str_move(best), "a1b1+");
}

#[test]
fn test_shorter_mate_scores_higher() {
    // White a2 b2 c2 against Black b4: b2b3 wins whichever way b4 steps.
    let pos = from_code("+1.18.0.39.0").unwrap();
    let result = Engine::default().search(&pos, LONG, 4);
    assert_eq!(result.score, MATE_SCORE - 3);
    assert_eq!(result.score, reference_score(&pos, 4));
    assert_eq!(pos.str_move(result.best_move().unwrap()), "b2b3");
    assert_eq!(result.pv.len(), 3);

    let quick = Engine::default().search(&from_code("+1.0.0.0.32").unwrap(), LONG, 4);
    assert!(quick.score.abs() > result.score.abs());
    assert!(result.is_mate() && quick.is_mate());
}

#[test]
fn test_side_without_pieces_is_terminal() {
    let pos = from_code("+1.0.0.0.40").unwrap();
    let result = Engine::default().search(&pos, LONG, 4);
    assert_eq!(result.score, MATE_SCORE);
    assert!(result.pv.is_empty());

    let pos = from_code("-1.80.0.0.0").unwrap();
    let result = Engine::default().search(&pos, LONG, 4);
    assert_eq!(result.score, -MATE_SCORE);
    assert!(result.pv.is_empty());
}

#[test]
fn test_table_does_not_change_shallow_results() {
    for variant in Variant::all() {
        let pos = Position::new(variant);
        let with = Engine::default().search(&pos, LONG, 1);
        let without = Engine::new(0).search(&pos, LONG, 1);
        assert_eq!(with.score, without.score, "variant {}", variant.id);
        assert_eq!(with.pv, without.pv, "variant {}", variant.id);
    }
}

#[test]
fn test_table_does_not_change_single_depth_scores() {
    // Depths up to the minimum run a single iteration, so no PV extension
    // applies and the table may only save work.
    for (i, pos) in random_positions(2, 50).into_iter().enumerate().step_by(3) {
        for depth in [3, 4] {
            let with = Engine::default().search(&pos, LONG, depth);
            let without = Engine::new(0).search(&pos, LONG, depth);
            assert_eq!(with.depth, depth);
            assert_eq!(
                with.score,
                without.score,
                "position {i} depth {depth}: {}",
                to_code(&pos)
            );
        }
    }
}

#[test]
fn test_depth_four_from_start() {
    let pos = Position::default();
    let mut engine = Engine::default();
    let result = engine.search(&pos, LONG, 4);
    assert_eq!(result.depth, 4);
    assert_eq!(result.collisions, 0);
    assert!(result.nodes > 0);
    let best = result.best_move().expect("a move from the start");
    assert!(pos.moves().iter().any(|m| m.same_as(best)));
    assert!(!engine.table().is_empty());

    // The line replays legally, at least as far as the root move.
    let mut board = pos.clone();
    board.play(best);
    assert_eq!(board.side(), Side::Black);
}

#[test]
fn test_resume_matches_run() {
    let pos = Position::new(Variant::by_id("2").unwrap());

    let blocking = Engine::default().search(&pos, LONG, 5);

    let mut engine = Engine::default();
    let mut search = engine.evaluate(&pos, LONG, 5);
    let mut partials = 0;
    let sliced = loop {
        match search.resume(Duration::ZERO) {
            Progress::Partial(report) => {
                partials += 1;
                assert!(report.depth >= 4);
            }
            Progress::Complete(result) => break result,
        }
    };
    assert!(partials > 1);
    assert_eq!(sliced, blocking);
}

#[test]
fn test_cancel_keeps_last_completed_depth() {
    let pos = Position::default();
    let mut engine = Engine::default();
    let mut search = engine.evaluate(&pos, LONG, 8);
    let completed = loop {
        match search.step() {
            Step::Depth(result) => break result,
            Step::Finished(_) => panic!("search ended before depth 5"),
            Step::Pending => {}
        }
    };
    assert_eq!(completed.depth, 4);
    search.step();
    assert_eq!(search.cancel(), Some(completed));
}

#[test]
fn test_spent_budget_returns_first_depth() {
    let pos = Position::default();
    let result = Engine::default().search(&pos, Duration::ZERO, 8);
    assert_eq!(result.depth, 4);
    assert!(result.score.abs() < MATE_BASE);
    assert!(!result.pv.is_empty());
}

#[test]
fn test_pass_is_searched() {
    // White's lone piece on a1 is boxed in by Black on a2 and b1.
    let pos = from_code("+1.0.0.54.45").unwrap();
    let result = Engine::default().search(&pos, LONG, 1);
    assert_eq!(result.best_move(), Some(&Move::Pass));
}
