//! Iterative-deepening alpha-beta search as a resumable computation.
//!
//! The recursive alpha-beta is unrolled into an explicit stack of
//! [`Frame`]s, one per expanded node, each holding its move list, the index
//! of the next move and its local window. [`Search::step`] runs until the
//! next node is entered, so a host can drive the search in small slices with
//! [`Search::resume`] and read partial results in between.
//!
//! Scores are from White's point of view: White maximizes, Black minimizes.
//! Per node, in order:
//!
//! - a side without pieces is mated, scoring `±(MATE_SCORE - ply)`;
//! - a position seen [`MAX_REPETITION`] times on the current line scores 0;
//! - a transposition-table entry searched deep enough is reused;
//! - at the horizon the static evaluation is returned;
//! - otherwise every move is searched. Captures within the last plies and
//!   moves onto positions from an earlier principal variation extend the
//!   search by one ply.
//!
//! The time budget is only checked between depths: a started depth runs
//! to the end unless the host cancels the search, which keeps the last
//! completed depth's result.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::constants::{
    BASE_SEARCH_DEPTH, DEFAULT_TABLE_SIZE, MATE_BASE, MATE_SCORE, MAX_REPETITION,
    MIN_SEARCH_DEPTH, QUIESCENCE_DEPTH, SCORE_INFINITY,
};
use crate::eval::evaluate;
use crate::position::{Move, Position, Side};
use crate::ttable::TranspositionTable;
use crate::zobrist;

/// Outcome of one completed iterative-deepening depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub score: i32,
    /// Best line from the root; the first move is the one to play.
    pub pv: Vec<Move>,
    /// Nodes entered so far in this evaluation.
    pub nodes: u64,
    /// Transposition-table hits so far in this evaluation.
    pub table_hits: u64,
    /// Restarts caused by suspected hash collisions.
    pub collisions: u32,
    pub depth: u32,
}

impl SearchResult {
    /// The move the engine would play.
    pub fn best_move(&self) -> Option<&Move> {
        self.pv.first()
    }

    pub fn is_mate(&self) -> bool {
        self.score.abs() >= MATE_BASE
    }
}

/// Snapshot of a search in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Depth currently being searched.
    pub depth: u32,
    pub nodes: u64,
    pub table_hits: u64,
    /// Result of the last completed depth.
    pub best: Option<SearchResult>,
}

/// What one slice of work produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Partial(Report),
    Complete(SearchResult),
}

/// What one step of work produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A node was entered; nothing new to report.
    Pending,
    /// A depth completed and deeper search continues.
    Depth(SearchResult),
    /// The evaluation is over.
    Finished(SearchResult),
}

/// A search engine instance owning its transposition table.
#[derive(Debug, Clone)]
pub struct Engine {
    table: TranspositionTable,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_SIZE)
    }
}

impl Engine {
    pub fn new(table_size: usize) -> Self {
        Self {
            table: TranspositionTable::new(table_size),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.table_size)
    }

    pub fn table(&self) -> &TranspositionTable {
        &self.table
    }

    /// Clear the transposition table. Only between searches.
    pub fn reset_table(&mut self) {
        self.table.reset();
    }

    /// Resize (and clear) the transposition table. Only between searches.
    pub fn set_table_max_size(&mut self, size: usize) {
        self.table.set_max_size(size);
    }

    /// Start evaluating `pos`. Nothing is searched until the returned
    /// [`Search`] is driven.
    pub fn evaluate(&mut self, pos: &Position, time_limit: Duration, max_depth: u32) -> Search<'_> {
        Search::new(&mut self.table, pos, time_limit, max_depth)
    }

    /// Evaluate `pos` to completion.
    pub fn search(&mut self, pos: &Position, time_limit: Duration, max_depth: u32) -> SearchResult {
        self.evaluate(pos, time_limit, max_depth).run()
    }
}

/// Result handed back from a finished node to its parent.
#[derive(Debug)]
struct NodeResult {
    score: i32,
    pv: Vec<Move>,
}

impl NodeResult {
    fn leaf(score: i32) -> Self {
        Self {
            score,
            pv: Vec::new(),
        }
    }
}

/// The next thing the search loop has to do.
#[derive(Debug)]
enum Next {
    Enter {
        ply: i32,
        depth: i32,
        alpha: i32,
        beta: i32,
    },
    Return(NodeResult),
}

/// An expanded node whose children are being searched.
#[derive(Debug)]
struct Frame {
    ply: i32,
    depth: i32,
    alpha: i32,
    beta: i32,
    side: Side,
    hash: u32,
    moves: Vec<Move>,
    /// Index of the next move to search.
    next: usize,
    /// Hash after the move currently being searched.
    child_hash: u32,
    best_score: i32,
    /// Move index and resulting hash of the move that raised the window.
    best: Option<(usize, u32)>,
    pv: Vec<Move>,
    cutoff: bool,
}

impl Frame {
    /// Play the next move and describe the child to enter, or `None` when
    /// the node is done.
    fn next_child(
        &mut self,
        board: &mut Position,
        repeats: &mut HashMap<u32, u32>,
        known_good: &HashSet<u32>,
    ) -> Option<Next> {
        if self.cutoff || self.next >= self.moves.len() {
            return None;
        }
        let mv = &self.moves[self.next];
        self.next += 1;
        board.play(mv);
        let child_hash = board.hash();
        *repeats.entry(child_hash).or_insert(0) += 1;

        let mut depth = self.depth - 1;
        if self.depth < QUIESCENCE_DEPTH && mv.is_capture() {
            depth += 1;
        }
        if self.ply < self.depth && known_good.contains(&child_hash) {
            depth += 1;
        }
        self.child_hash = child_hash;
        Some(Next::Enter {
            ply: self.ply + 1,
            depth,
            alpha: self.alpha,
            beta: self.beta,
        })
    }

    /// Take back the current move and fold the child's result in.
    fn fold(&mut self, child: NodeResult, board: &mut Position, repeats: &mut HashMap<u32, u32>) {
        let index = self.next - 1;
        if let Some(count) = repeats.get_mut(&self.child_hash) {
            *count -= 1;
            if *count == 0 {
                repeats.remove(&self.child_hash);
            }
        }
        board.unplay(&self.moves[index]);

        let score = child.score;
        let better = match self.side {
            Side::White => score > self.best_score,
            Side::Black => score < self.best_score,
        };
        if better {
            self.best_score = score;
            self.best = None;
            self.pv.clear();
        }
        let raises = match self.side {
            Side::White if score > self.alpha => {
                self.alpha = score;
                true
            }
            Side::Black if score < self.beta => {
                self.beta = score;
                true
            }
            _ => false,
        };
        if raises {
            self.best = Some((index, self.child_hash));
            self.pv = child.pv;
        }
        if self.beta <= self.alpha {
            self.cutoff = true;
        }
    }

    /// Close the node, caching it when every move was tried without a
    /// cutoff. A cutoff only bounds the score.
    fn finish(mut self, table: &mut TranspositionTable) -> NodeResult {
        let completed = self.next >= self.moves.len() && !self.cutoff;
        let Some((index, next_hash)) = self.best else {
            return NodeResult::leaf(self.best_score);
        };
        let mv = self.moves.swap_remove(index);
        if completed {
            table.store(
                self.hash,
                self.depth,
                to_table_score(self.best_score, self.ply),
                mv.clone(),
                next_hash,
            );
        }
        let mut pv = Vec::with_capacity(self.pv.len() + 1);
        pv.push(mv);
        pv.append(&mut self.pv);
        NodeResult {
            score: self.best_score,
            pv,
        }
    }
}

/// An evaluation in progress. Drive it with [`Search::step`],
/// [`Search::resume`] or [`Search::run`].
pub struct Search<'a> {
    table: &'a mut TranspositionTable,
    root: Position,
    root_moves: Vec<Move>,
    board: Position,
    deadline: Instant,
    min_depth: u32,
    max_depth: u32,
    depth: u32,
    nodes: u64,
    table_hits: u64,
    collisions: u32,
    /// Occurrences of each position on the current line.
    repeats: HashMap<u32, u32>,
    /// Positions on the principal variations of completed depths.
    known_good: HashSet<u32>,
    stack: Vec<Frame>,
    next: Option<Next>,
    best: Option<SearchResult>,
    outcome: Option<SearchResult>,
}

impl<'a> Search<'a> {
    fn new(
        table: &'a mut TranspositionTable,
        pos: &Position,
        time_limit: Duration,
        max_depth: u32,
    ) -> Self {
        let min_depth = max_depth.clamp(MIN_SEARCH_DEPTH, BASE_SEARCH_DEPTH);
        let max_depth = max_depth.max(min_depth);
        let mut repeats = HashMap::new();
        repeats.insert(pos.hash(), 1);

        let mut search = Search {
            table,
            root: pos.clone(),
            root_moves: pos.moves(),
            board: pos.clone(),
            deadline: Instant::now() + time_limit,
            min_depth,
            max_depth,
            depth: min_depth,
            nodes: 0,
            table_hits: 0,
            collisions: 0,
            repeats,
            known_good: HashSet::new(),
            stack: Vec::new(),
            next: None,
            best: None,
            outcome: None,
        };
        search.start_depth();
        search
    }

    /// Result of the last completed depth.
    pub fn best(&self) -> Option<&SearchResult> {
        self.best.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn report(&self) -> Report {
        Report {
            depth: self.depth,
            nodes: self.nodes,
            table_hits: self.table_hits,
            best: self.best.clone(),
        }
    }

    /// Run until the next node is entered, a depth completes, or the
    /// evaluation ends.
    pub fn step(&mut self) -> Step {
        if let Some(result) = &self.outcome {
            return Step::Finished(result.clone());
        }
        match self.advance() {
            Some(root) => self.complete_depth(root),
            None => Step::Pending,
        }
    }

    /// Work for up to `slice`, returning early when a depth completes.
    ///
    /// At least one step is taken per call.
    pub fn resume(&mut self, slice: Duration) -> Progress {
        let until = Instant::now() + slice;
        loop {
            match self.step() {
                Step::Finished(result) => return Progress::Complete(result),
                Step::Depth(_) => return Progress::Partial(self.report()),
                Step::Pending if Instant::now() >= until => {
                    return Progress::Partial(self.report());
                }
                Step::Pending => {}
            }
        }
    }

    /// Drive the evaluation to the end.
    pub fn run(mut self) -> SearchResult {
        loop {
            if let Step::Finished(result) = self.step() {
                return result;
            }
        }
    }

    /// Stop searching. The depth in progress is discarded; the last
    /// completed result, if any, is returned.
    pub fn cancel(self) -> Option<SearchResult> {
        self.outcome.or(self.best)
    }

    fn start_depth(&mut self) {
        self.board = self.root.clone();
        self.stack.clear();
        self.next = Some(Next::Enter {
            ply: 0,
            depth: self.depth as i32,
            alpha: -SCORE_INFINITY,
            beta: SCORE_INFINITY,
        });
    }

    fn finish(&mut self, result: SearchResult) -> Step {
        log::info!(
            "search finished: depth {} score {} nodes {} table hits {}",
            result.depth,
            result.score,
            result.nodes,
            result.table_hits
        );
        self.stack.clear();
        self.next = None;
        self.outcome = Some(result.clone());
        Step::Finished(result)
    }

    /// Process returns until a node is entered (`None`) or the root
    /// finishes (`Some`).
    fn advance(&mut self) -> Option<NodeResult> {
        loop {
            match self.next.take()? {
                Next::Enter {
                    ply,
                    depth,
                    alpha,
                    beta,
                } => {
                    self.nodes += 1;
                    let next = self.enter(ply, depth, alpha, beta);
                    self.next = Some(next);
                    return None;
                }
                Next::Return(child) => {
                    let Some(mut frame) = self.stack.pop() else {
                        return Some(child);
                    };
                    frame.fold(child, &mut self.board, &mut self.repeats);
                    let next = self.descend(frame);
                    self.next = Some(next);
                }
            }
        }
    }

    /// Decide what a freshly entered node is.
    fn enter(&mut self, ply: i32, depth: i32, alpha: i32, beta: i32) -> Next {
        let board = &self.board;
        if board.pieces(Side::Black).is_empty() {
            return Next::Return(NodeResult::leaf(MATE_SCORE - ply));
        }
        if board.pieces(Side::White).is_empty() {
            return Next::Return(NodeResult::leaf(-MATE_SCORE + ply));
        }

        let hash = board.hash();
        if self.repeats.get(&hash).copied().unwrap_or(0) >= MAX_REPETITION {
            return Next::Return(NodeResult::leaf(0));
        }

        if let Some(stored) = self.table.lookup(hash, depth) {
            self.table_hits += 1;
            let (pv, repeated) = self.table_line(hash);
            let score = if repeated {
                loop_score(stored)
            } else {
                from_table_score(stored, ply)
            };
            return Next::Return(NodeResult { score, pv });
        }

        if depth <= 0 || alpha + ply >= MATE_SCORE || beta - ply <= -MATE_SCORE {
            return Next::Return(NodeResult::leaf(evaluate(board)));
        }

        let side = board.side();
        let mut moves = board.moves();
        if moves.len() > 1 {
            order_moves(&*self.table, hash, side, &mut moves);
        }
        let frame = Frame {
            ply,
            depth,
            alpha,
            beta,
            side,
            hash,
            moves,
            next: 0,
            child_hash: 0,
            best_score: match side {
                Side::White => -SCORE_INFINITY,
                Side::Black => SCORE_INFINITY,
            },
            best: None,
            pv: Vec::new(),
            cutoff: false,
        };
        self.descend(frame)
    }

    /// Enter the frame's next child, or close the frame.
    fn descend(&mut self, mut frame: Frame) -> Next {
        match frame.next_child(&mut self.board, &mut self.repeats, &self.known_good) {
            Some(next) => {
                self.stack.push(frame);
                next
            }
            None => Next::Return(frame.finish(&mut *self.table)),
        }
    }

    /// Follow best moves through the table from `hash`, noting whether the
    /// line runs into a position already on the search line or into
    /// itself.
    fn table_line(&self, hash: u32) -> (Vec<Move>, bool) {
        let mut pv = Vec::new();
        let Some(first) = self.table.get(hash) else {
            return (pv, false);
        };
        pv.push(first.best.clone());
        let mut depth = first.depth;
        let mut code = first.next_hash;
        let mut seen = HashSet::new();
        let mut repeated = false;

        while let Some(entry) = self.table.get(code) {
            depth -= 1;
            if !repeated {
                if self.repeats.contains_key(&code) || !seen.insert(code) {
                    repeated = true;
                }
            } else if depth <= 0 {
                break;
            }
            pv.push(entry.best.clone());
            code = entry.next_hash;
        }
        (pv, repeated)
    }

    fn complete_depth(&mut self, root: NodeResult) -> Step {
        let depth = self.depth;
        let result = SearchResult {
            score: root.score,
            pv: root.pv,
            nodes: self.nodes,
            table_hits: self.table_hits,
            collisions: self.collisions,
            depth,
        };

        if let Some(first) = result.pv.first()
            && !self.root_moves.is_empty()
            && !self.root_moves.iter().any(|m| m.same_as(first))
        {
            log::warn!(
                "best move {} at depth {depth} is not legal, assuming a hash collision; \
                 disabling the transposition table",
                self.root.str_move(first)
            );
            self.collisions += 1;
            self.table.set_max_size(0);
            self.best = None;
            self.depth = self.min_depth;
            self.start_depth();
            return Step::Pending;
        }

        log::debug!(
            "depth {depth}: score {} nodes {} table hits {} pv {}",
            result.score,
            result.nodes,
            result.table_hits,
            result
                .pv
                .iter()
                .map(|m| self.root.str_move(m))
                .collect::<Vec<_>>()
                .join(" ")
        );
        self.best = Some(result.clone());

        let mate_settled =
            result.score.abs() >= MATE_BASE && MATE_SCORE - result.score.abs() <= depth as i32;
        if mate_settled || depth >= self.max_depth {
            return self.finish(result);
        }
        if Instant::now() > self.deadline {
            log::debug!("time budget spent after depth {depth}");
            return self.finish(result);
        }

        let mut hash = self.root.hash();
        let mut side = self.root.side();
        for mv in &result.pv {
            self.known_good.insert(hash);
            hash = zobrist::update(hash, mv, side);
            side = side.opponent();
        }
        self.depth += 1;
        self.start_depth();
        Step::Depth(result)
    }
}

/// Sort moves by the table's opinion of the resulting position, best for
/// the side to move first; unknown positions keep their order at the end.
fn order_moves(table: &TranspositionTable, hash: u32, side: Side, moves: &mut [Move]) {
    moves.sort_by_cached_key(|mv| match table.lookup(zobrist::update(hash, mv, side), 0) {
        Some(score) => (0, if side == Side::White { -score } else { score }),
        None => (1, 0),
    });
}

/// Convert a mate score found `ply` plies from the root into one relative
/// to the storing node.
pub fn to_table_score(score: i32, ply: i32) -> i32 {
    from_table_score(score, -ply)
}

/// Convert a stored mate score back into one relative to the root, for a
/// node `ply` plies deep.
pub fn from_table_score(score: i32, ply: i32) -> i32 {
    if score >= MATE_BASE {
        score - ply
    } else if score <= -MATE_BASE {
        score + ply
    } else {
        score
    }
}

/// Shrink a score reached through a repeating line to a token ±1..4.
fn loop_score(score: i32) -> i32 {
    if score == 0 {
        return 0;
    }
    score.signum() * (score.abs() / 100).clamp(1, 4)
}
