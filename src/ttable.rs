//! Bounded transposition table keyed by Zobrist hash.
//!
//! Entries record the score, the depth it was searched to, the best move and
//! the hash of the position that move leads to, so a principal variation can
//! be followed through the table. Keys are only 32 bits: a move read back
//! from the table must be checked against the real legal moves before use.
//!
//! When full, the table sorts its entries by `depth - 2 * staleness`, drops
//! the coldest 70% and ages the survivors.

use std::collections::HashMap;

use crate::constants::COLD_TABLE_PERCENTAGE;
use crate::position::Move;

/// A cached search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Score relative to the node that stored it (see `search::to_table_score`).
    pub score: i32,
    pub depth: i32,
    pub best: Move,
    /// Hash of the position after `best`.
    pub next_hash: u32,
    stale: u32,
}

/// Transposition table with explicit capacity. A capacity of zero disables
/// storing altogether.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    entries: HashMap<u32, TableEntry>,
    max_size: usize,
}

impl TranspositionTable {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
        }
    }

    /// Drop every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
        log::debug!("transposition table reset");
    }

    /// Change the capacity and drop every entry.
    pub fn set_max_size(&mut self, max_size: usize) {
        log::info!("transposition table max size set to {max_size}");
        self.max_size = max_size;
        self.entries = HashMap::new();
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.max_size == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Any entry stored under `key`, regardless of depth.
    #[inline]
    pub fn get(&self, key: u32) -> Option<&TableEntry> {
        self.entries.get(&key)
    }

    /// The entry under `key` if it was searched at least `depth` deep.
    #[inline]
    pub fn probe(&self, key: u32, depth: i32) -> Option<&TableEntry> {
        self.entries.get(&key).filter(|e| e.depth >= depth)
    }

    /// The cached score under `key` if it was searched at least `depth` deep.
    #[inline]
    pub fn lookup(&self, key: u32, depth: i32) -> Option<i32> {
        self.probe(key, depth).map(|e| e.score)
    }

    /// Record a search result unless the table is disabled or already holds
    /// an entry at least as deep.
    pub fn store(&mut self, key: u32, depth: i32, score: i32, best: Move, next_hash: u32) {
        if self.is_disabled() || self.probe(key, depth).is_some() {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_cold();
        }
        self.entries.insert(
            key,
            TableEntry {
                score,
                depth,
                best,
                next_hash,
                stale: 0,
            },
        );
    }

    fn evict_cold(&mut self) {
        let cold = ((self.max_size as f64 * COLD_TABLE_PERCENTAGE) as usize).max(1);
        let mut ranked: Vec<(i64, u32)> = self
            .entries
            .iter()
            .map(|(&k, e)| (e.depth as i64 - 2 * e.stale as i64, k))
            .collect();
        ranked.sort_unstable();
        for &(_, key) in ranked.iter().take(cold) {
            self.entries.remove(&key);
        }
        for &(_, key) in ranked.iter().skip(cold) {
            if let Some(e) = self.entries.get_mut(&key) {
                e.stale += 1;
            }
        }
        log::debug!(
            "evicted {} cold entries, {} kept",
            ranked.len().min(cold),
            self.entries.len()
        );
    }
}
