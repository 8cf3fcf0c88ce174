// Embedded chess opponent: search engine, evaluator and difficulty control
pub mod board;
pub mod book;
pub mod error;
pub mod profile;
pub mod search;
pub mod session;

pub use board::{CoordMove, Grid, MoveInfo, Outcome, Position};
pub use error::{EngineError, Result};
pub use profile::{ChosenMove, Difficulty, DifficultyTable, MoveSource, SearchProfile, TurnOutcome};
pub use session::{GameSession, ThinkHandle};
