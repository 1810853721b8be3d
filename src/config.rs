//! Engine configuration.

use std::time::Duration;

use crate::constants::{DEFAULT_MAX_DEPTH, DEFAULT_TABLE_SIZE, DEFAULT_TIME_LIMIT_MS, YIELD_INTERVAL_MS};

/// Knobs a host sets before starting searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Transposition table capacity in entries; zero disables the table.
    pub table_size: usize,
    /// Wall-clock budget for one evaluation.
    pub time_limit: Duration,
    /// Deepest iterative-deepening depth.
    pub max_depth: u32,
    /// How long one cooperative slice runs before control returns.
    pub slice: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table_size: DEFAULT_TABLE_SIZE,
            time_limit: Duration::from_millis(DEFAULT_TIME_LIMIT_MS),
            max_depth: DEFAULT_MAX_DEPTH,
            slice: Duration::from_millis(YIELD_INTERVAL_MS),
        }
    }
}
