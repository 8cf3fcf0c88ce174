use cozy_chess::Color;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid FEN `{fen}`: {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// The side to move has nothing to play. Hosts treat this as game over.
    #[error("no legal moves for {0:?}")]
    NoLegalMoves(Color),

    #[error("invalid difficulty config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("unknown difficulty level `{0}`")]
    UnknownLevel(String),

    #[error("could not start search worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("search worker thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, EngineError>;
