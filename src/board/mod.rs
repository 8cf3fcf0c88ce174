pub mod grid;
pub mod moves;
pub mod position;

pub use grid::Grid;
pub use moves::{CoordMove, MoveInfo};
pub use position::{Outcome, Position};
