//! Line-oriented text protocol in the style of GTP.
//!
//! Each request is an optional numeric id, a command and its arguments.
//! Responses are `=[id] text` on success or `?[id] message` on failure,
//! followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`,
//!   `known_command <cmd>`, `quit`
//! - `variant <id>` - Start a new game on another board
//! - `clear_board` - Start a new game on the current board
//! - `position <code>` - Set up a position from its code
//! - `code` - Print the current position code
//! - `showboard` - Draw the board
//! - `moves` - List legal moves
//! - `play <move>` - Play a move such as `a2b2` or `pass`
//! - `undo [n]`, `redo [n]` - Walk the move history
//! - `analyze [ms] [depth]` - Search and report each completed depth
//! - `genmove [ms] [depth]` - Search and play the best move
//! - `table_reset`, `table_size <n>` - Manage the transposition table
//! - `link` - Shareable analysis link with the last principal variation
//!
//! ## Example
//!
//! ```ignore
//! use capgrid_rust::protocol::ProtocolEngine;
//! let mut engine = ProtocolEngine::new();
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, anyhow, bail};

use crate::codec::{from_code, to_code};
use crate::config::EngineConfig;
use crate::game::{Game, Outcome, format_score};
use crate::position::Position;
use crate::search::{Engine, Progress, SearchResult};
use crate::variant::Variant;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "analyze",
    "clear_board",
    "code",
    "genmove",
    "known_command",
    "link",
    "list_commands",
    "moves",
    "name",
    "play",
    "position",
    "protocol_version",
    "quit",
    "redo",
    "showboard",
    "table_reset",
    "table_size",
    "undo",
    "variant",
    "version",
];

/// Protocol state: the game, the engine and the last analysis.
pub struct ProtocolEngine {
    game: Game,
    engine: Engine,
    config: EngineConfig,
    /// Last analysis, kept while the position is unchanged.
    last: Option<SearchResult>,
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            game: Game::new(Position::default()),
            engine: Engine::from_config(&config),
            config,
            last: None,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Run the command loop, reading from stdin and writing to stdout.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (prefix, message) = match self.execute(&command, args) {
                Ok(message) => ('=', message),
                Err(e) => {
                    log::debug!("{command} failed: {e:#}");
                    ('?', format!("{e:#}"))
                }
            };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(stdout, "{prefix}{id_str} {message}\n")?;
            stdout.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command id from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    /// Execute one command and return its response text.
    pub fn execute(&mut self, command: &str, args: &[&str]) -> anyhow::Result<String> {
        match command {
            "name" => Ok(env!("CARGO_PKG_NAME").to_string()),

            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => Ok("2".to_string()),

            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let name = args.first().context("missing argument")?;
                let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                Ok(known.to_string())
            }

            "quit" => Ok(String::new()),

            "variant" => {
                let id = args.first().context("missing argument")?;
                let variant = Variant::by_id(id)?;
                self.new_game(Position::new(variant));
                Ok(variant.name.to_string())
            }

            "clear_board" => {
                let variant = self.game.position().variant();
                self.new_game(Position::new(variant));
                Ok(String::new())
            }

            "position" => {
                let code = args.first().context("missing argument")?;
                self.new_game(from_code(code)?);
                Ok(String::new())
            }

            "code" => Ok(to_code(self.game.position())),

            "showboard" => Ok(format!("\n{}", self.game.position())),

            "moves" => {
                let pos = self.game.position();
                let names: Vec<String> = pos.moves().iter().map(|m| self.game.name_move(m)).collect();
                Ok(names.join(" "))
            }

            "play" => {
                let name = args.first().context("missing argument")?;
                let mv = self
                    .game
                    .play_named(name)
                    .ok_or_else(|| anyhow!("illegal move {name}"))?;
                self.last = None;
                Ok(self.game.name_move(&mv))
            }

            "undo" | "redo" => {
                let count = match args.first() {
                    Some(n) => n.parse().context("invalid count")?,
                    None => 1,
                };
                let done = if command == "undo" {
                    self.game.undo(count)
                } else {
                    self.game.redo(count)
                };
                if done > 0 {
                    self.last = None;
                }
                Ok(done.to_string())
            }

            "analyze" => {
                let (time, depth) = self.budget(args)?;
                let (result, info) = self.analyze(time, depth);
                let mut lines = info;
                lines.push(summary(&self.game, &result));
                self.last = Some(result);
                Ok(lines.join("\n"))
            }

            "genmove" => {
                if let Some(outcome) = self.game.outcome() {
                    bail!("game is over: {}", describe_outcome(outcome));
                }
                let (time, depth) = self.budget(args)?;
                let (result, _) = self.analyze(time, depth);
                let mv = result.best_move().context("no move to play")?.clone();
                let name = self.game.name_move(&mv);
                self.game
                    .play_move(&mv)
                    .ok_or_else(|| anyhow!("engine move {name} is not legal"))?;
                self.last = None;
                Ok(name)
            }

            "table_reset" => {
                self.engine.reset_table();
                Ok(String::new())
            }

            "table_size" => {
                let size = args.first().context("missing argument")?;
                let size: usize = size.parse().context("invalid size")?;
                self.engine.set_table_max_size(size);
                self.config.table_size = size;
                Ok(String::new())
            }

            "link" => {
                let pv = self.last.as_ref().map(|r| r.pv.as_slice());
                Ok(self.game.share_link(pv))
            }

            _ => bail!("unknown command: {command}"),
        }
    }

    fn new_game(&mut self, position: Position) {
        self.game = Game::new(position);
        self.engine.reset_table();
        self.last = None;
    }

    /// Optional `[ms] [depth]` arguments, defaulting to the configuration.
    fn budget(&self, args: &[&str]) -> anyhow::Result<(Duration, u32)> {
        let time = match args.first() {
            Some(ms) => Duration::from_millis(ms.parse().context("invalid time")?),
            None => self.config.time_limit,
        };
        let depth = match args.get(1) {
            Some(d) => d.parse().context("invalid depth")?,
            None => self.config.max_depth,
        };
        Ok((time, depth))
    }

    /// Search the current position slice by slice, collecting an `info`
    /// line for every completed depth.
    fn analyze(&mut self, time: Duration, depth: u32) -> (SearchResult, Vec<String>) {
        let mut info = Vec::new();
        let mut reported = 0;
        let mut search = self.engine.evaluate(self.game.position(), time, depth);
        loop {
            match search.resume(self.config.slice) {
                Progress::Partial(report) => {
                    if let Some(best) = report.best
                        && best.depth > reported
                    {
                        reported = best.depth;
                        info.push(format!("info {}", summary(&self.game, &best)));
                    }
                }
                Progress::Complete(result) => return (result, info),
            }
        }
    }
}

/// One-line account of a search result.
fn summary(game: &Game, result: &SearchResult) -> String {
    format!(
        "depth {} score {} nodes {} hits {} pv {}",
        result.depth,
        format_score(result.score),
        result.nodes,
        result.table_hits,
        game.pv_string(&result.pv)
    )
}

fn describe_outcome(outcome: Outcome) -> String {
    match outcome {
        Outcome::Win(side) => format!("{} wins", side.name()),
        Outcome::Draw => "draw".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> ProtocolEngine {
        ProtocolEngine::with_config(EngineConfig {
            time_limit: Duration::from_secs(60),
            max_depth: 2,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = ProtocolEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = ProtocolEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_and_protocol_version() {
        let mut engine = ProtocolEngine::new();
        assert_eq!(engine.execute("name", &[]).unwrap(), "capgrid-rust");
        assert_eq!(engine.execute("protocol_version", &[]).unwrap(), "2");
    }

    #[test]
    fn test_known_command() {
        let mut engine = ProtocolEngine::new();
        assert_eq!(engine.execute("known_command", &["genmove"]).unwrap(), "true");
        assert_eq!(engine.execute("known_command", &["komi"]).unwrap(), "false");
        assert!(engine.execute("known_command", &[]).is_err());
        assert!(engine.execute("komi", &["7.5"]).is_err());
    }

    #[test]
    fn test_variant_and_code() {
        let mut engine = ProtocolEngine::new();
        assert_eq!(engine.execute("variant", &["3"]).unwrap(), "5x5");
        assert_eq!(engine.execute("code", &[]).unwrap(), "+3.242.164.0.82.121");
        assert!(engine.execute("variant", &["7"]).is_err());
        assert!(engine.execute("position", &["+1.0.0"]).is_err());
        engine.execute("position", &["-1.80.56.28.40"]).unwrap();
        assert_eq!(engine.execute("code", &[]).unwrap(), "-1.80.56.28.40");
    }

    #[test]
    fn test_play_undo_redo() {
        let mut engine = ProtocolEngine::new();
        assert_eq!(engine.execute("moves", &[]).unwrap(), "a2b2 b1b2");
        assert_eq!(engine.execute("play", &["a2b2"]).unwrap(), "a2b2");
        assert!(engine.execute("play", &["a2b2"]).is_err());
        assert_eq!(engine.execute("undo", &["3"]).unwrap(), "1");
        assert_eq!(engine.execute("redo", &[]).unwrap(), "1");
        assert_eq!(engine.game().moves_played().count(), 1);
    }

    #[test]
    fn test_analyze_and_genmove() {
        let mut engine = quick();
        let response = engine.execute("analyze", &[]).unwrap();
        let last = response.lines().last().unwrap();
        assert!(last.starts_with("depth 2 score "), "{response}");
        assert!(engine.execute("link", &[]).unwrap().contains("&#pv="));

        let played = engine.execute("genmove", &["60000", "1"]).unwrap();
        assert!(!played.is_empty());
        assert_eq!(engine.game().moves_played().count(), 1);
        assert!(!engine.execute("link", &[]).unwrap().contains("&#pv="));
    }

    #[test]
    fn test_genmove_after_game_over() {
        let mut engine = quick();
        engine.execute("position", &["-1.0.0.0.40"]).unwrap();
        assert!(engine.execute("genmove", &[]).is_err());
    }

    #[test]
    fn test_table_size() {
        let mut engine = ProtocolEngine::new();
        engine.execute("table_size", &["0"]).unwrap();
        assert!(engine.engine.table().is_disabled());
        assert!(engine.execute("table_size", &["lots"]).is_err());
    }
}
