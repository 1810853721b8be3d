//! Capgrid-Rust: a search engine for small capture games on a grid.
//!
//! ## Usage
//!
//! - `capgrid-rust` - Show a demo
//! - `capgrid-rust protocol` - Start the text protocol for a front end
//! - `capgrid-rust analyze <code>` - Analyze a position
//! - `capgrid-rust selfplay` - Let the engine play both sides

use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};

use capgrid_rust::codec::{from_code, to_code};
use capgrid_rust::config::EngineConfig;
use capgrid_rust::game::{Game, describe_score, format_score};
use capgrid_rust::position::Position;
use capgrid_rust::protocol::ProtocolEngine;
use capgrid_rust::search::{Engine, Progress};
use capgrid_rust::variant::Variant;

/// Capgrid-Rust: alpha-beta engine for grid capture games
#[derive(Parser)]
#[command(name = "capgrid-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Time budget per search in milliseconds
    #[arg(long, global = true)]
    time: Option<u64>,
    /// Deepest search depth
    #[arg(long, global = true)]
    depth: Option<u32>,
    /// Transposition table capacity (0 disables it)
    #[arg(long, global = true)]
    table_size: Option<usize>,
    /// Log search progress
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the text protocol on stdin/stdout
    Protocol,
    /// Analyze a position given by its code, e.g. +1.80.56.28.40
    Analyze { code: String },
    /// Let the engine play against itself
    Selfplay {
        /// Board variant id
        #[arg(long, default_value = "1")]
        variant: String,
        /// Stop after this many plies
        #[arg(long, default_value_t = 200)]
        max_plies: usize,
    },
    /// Run a short demo
    Demo,
}

impl Cli {
    fn config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(ms) = self.time {
            config.time_limit = Duration::from_millis(ms);
        }
        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        if let Some(size) = self.table_size {
            config.table_size = size;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level))
        .target(env_logger::Target::Stderr)
        .init();

    let config = cli.config();
    match cli.command {
        Some(Commands::Protocol) => ProtocolEngine::with_config(config).run(),
        Some(Commands::Analyze { code }) => analyze(&code, &config),
        Some(Commands::Selfplay { variant, max_plies }) => selfplay(&variant, max_plies, &config),
        Some(Commands::Demo) | None => {
            run_demo(&config);
            Ok(())
        }
    }
}

/// Search a position slice by slice, printing each completed depth.
fn analyze(code: &str, config: &EngineConfig) -> anyhow::Result<()> {
    let pos = from_code(code).with_context(|| format!("cannot analyze {code}"))?;
    let game = Game::new(pos.clone());
    println!("{pos}\n");

    let mut engine = Engine::from_config(config);
    let start = Instant::now();
    let mut search = engine.evaluate(&pos, config.time_limit, config.max_depth);
    let mut shown = 0;
    let result = loop {
        match search.resume(config.slice) {
            Progress::Partial(report) => {
                if let Some(best) = report.best
                    && best.depth > shown
                {
                    shown = best.depth;
                    println!(
                        "depth {:2}  {:>6}  nodes {:>8}  {}",
                        best.depth,
                        format_score(best.score),
                        best.nodes,
                        game.pv_string(&best.pv)
                    );
                }
            }
            Progress::Complete(result) => break result,
        }
    };

    println!(
        "depth {:2}  {:>6}  nodes {:>8}  {}",
        result.depth,
        format_score(result.score),
        result.nodes,
        game.pv_string(&result.pv)
    );
    println!("{} ({} ms)", describe_score(result.score), start.elapsed().as_millis());
    println!("link: {}", game.share_link(Some(&result.pv)));
    Ok(())
}

/// Play the engine against itself until the game ends or `max_plies`.
fn selfplay(variant: &str, max_plies: usize, config: &EngineConfig) -> anyhow::Result<()> {
    let variant = Variant::by_id(variant)?;
    let mut game = Game::new(Position::new(variant));
    let mut engine = Engine::from_config(config);

    for ply in 1..=max_plies {
        if game.is_finished() {
            break;
        }
        let result = engine.search(game.position(), config.time_limit, config.max_depth);
        let mv = result.best_move().context("engine found no move")?.clone();
        let name = game.name_move(&mv);
        game.play_move(&mv)
            .with_context(|| format!("engine move {name} was rejected"))?;
        println!("{ply:3}. {name:<7} {:>6}", format_score(result.score));
    }

    println!("\n{}", game.position());
    match game.outcome() {
        Some(outcome) => println!("result: {outcome:?}"),
        None => println!("result: unfinished"),
    }
    println!("final code: {}", to_code(game.position()));
    Ok(())
}

fn run_demo(config: &EngineConfig) {
    println!("Capgrid-Rust: alpha-beta search for grid capture games\n");

    for variant in Variant::all() {
        let pos = Position::new(variant);
        println!("=== Variant {} ({}) ===", variant.id, variant.name);
        println!("{pos}");
        println!("code: {}", to_code(&pos));

        let game = Game::new(pos.clone());
        let mut engine = Engine::from_config(config);
        let result = engine.search(&pos, config.time_limit, config.max_depth);
        println!(
            "depth {} score {} ({}) nodes {}",
            result.depth,
            format_score(result.score),
            describe_score(result.score),
            result.nodes
        );
        println!("pv: {}\n", game.pv_string(&result.pv));
    }
}
