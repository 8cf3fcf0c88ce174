pub mod alphabeta;
pub mod control;
pub mod eval;
pub mod ordering;
pub mod tt;
pub mod zobrist;

pub use alphabeta::{SearchParams, SearchResult, SearchTables, Searcher};
pub use control::{AbortToken, SearchControl, StopReason, YieldHook};
