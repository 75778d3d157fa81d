//! Core Connect Four rules: the 6x7 board with gravity, the two sides, and
//! end-of-game detection.

mod board;
mod outcome;
mod player;

pub use board::{
    column_letter, parse_column, Board, Cell, Coord, Direction, MoveError, ParseBoardError, Run,
    COLS, MAX_PLIES, ROWS,
};
pub use outcome::GameOutcome;
pub use player::Side;
