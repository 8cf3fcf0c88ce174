use anyhow::{Context, Result};
use clap::Parser;
use cozy_chess::Color;
use panelbot::{Difficulty, DifficultyTable, EngineError, GameSession, Grid, Outcome, Position, TurnOutcome};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "panelbot", version, about = "Ask the panel chess opponent for a move", long_about = None)]
struct Args {
    /// FEN string or 'startpos'
    #[arg(long, default_value = "startpos")]
    fen: String,

    /// Difficulty: easy, medium or hard
    #[arg(long, default_value = "medium")]
    level: String,

    /// JSON file overriding the difficulty table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Play this many plies engine against engine instead of a single move
    #[arg(long, default_value_t = 0)]
    selfplay: usize,

    /// Play on the simplified host board rules instead of full chess
    #[arg(long)]
    grid: bool,

    /// RNG seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// Transposition table size in megabytes
    #[arg(long)]
    tt_mb: Option<usize>,
}

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn side_from_fen(fen: &str) -> Color {
    match fen.split_whitespace().nth(1) {
        Some("b") => Color::Black,
        _ => Color::White,
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let level: Difficulty = args.level.parse()?;
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            DifficultyTable::load_from_json(&text)?
        }
        None => DifficultyTable::default(),
    };
    let mut session = match args.seed {
        Some(seed) => GameSession::with_seed(level, seed),
        None => GameSession::new(level),
    }
    .with_config(config);
    if let Some(mb) = args.tt_mb {
        session = session.with_tt_mb(mb);
    }
    let fen = if args.fen == "startpos" { STARTPOS.to_string() } else { args.fen.clone() };

    if args.grid {
        play_grid(&mut session, &fen, args.selfplay.max(1))
    } else {
        play_position(&mut session, &fen, args.selfplay.max(1))
    }
}

fn play_position(session: &mut GameSession, fen: &str, plies: usize) -> Result<()> {
    let mut pos = Position::from_fen(fen)?;
    for ply in 1..=plies {
        let t0 = Instant::now();
        println!("{}", session.status_text());
        match session.think(&mut pos) {
            Ok(TurnOutcome::Move(c)) => {
                println!("{ply}: {} -> {} [{:?}] in {:?}", c.info, c.coord, c.source, t0.elapsed());
                pos.make(c.info.mv)?;
            }
            Ok(TurnOutcome::Aborted) => {
                println!("turn aborted");
                break;
            }
            Err(EngineError::NoLegalMoves(side)) => {
                println!("{side:?} has no legal moves: {:?}", pos.outcome());
                break;
            }
            Err(e) => return Err(e.into()),
        }
        if pos.outcome() != Outcome::Ongoing {
            println!("game over: {:?}", pos.outcome());
            break;
        }
    }
    println!("final position: {}", pos.fen());
    Ok(())
}

fn play_grid(session: &mut GameSession, fen: &str, plies: usize) -> Result<()> {
    let mut grid = Grid::from_placement(fen)?;
    let mut side = side_from_fen(fen);
    let fullmove: usize = fen.split_whitespace().nth(5).and_then(|n| n.parse().ok()).unwrap_or(1);
    grid.set_plies(fullmove.saturating_sub(1) * 2 + usize::from(side == Color::Black));
    for ply in 1..=plies {
        let c = match session.think_grid(&grid, side)? {
            TurnOutcome::Move(c) => c,
            TurnOutcome::Aborted => break,
        };
        let applied = grid.apply((c.coord.from_row, c.coord.from_col), (c.coord.to_row, c.coord.to_col));
        println!("{ply}: {} [{:?}]", c.coord, c.source);
        if let Some(winner) = applied.winner {
            session.set_game_over(true);
            println!("{winner:?} wins");
            break;
        }
        side = !side;
    }
    println!("{}", session.status_text());
    println!("final board: {}", grid.to_fen(side));
    Ok(())
}
