//! Front ends: a ratatui terminal UI and a line-oriented text mode that reads
//! column letters from stdin.

mod app;
pub mod board_widget;
mod game_view;
pub mod text;

pub use app::App;

use crate::game::Cell;
use crate::session::PlayConfig;

/// Characters used to draw each side's pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSymbols {
    pub engine: char,
    pub opponent: char,
}

impl PieceSymbols {
    pub fn from_config(play: &PlayConfig) -> Self {
        PieceSymbols {
            engine: play.engine_symbol,
            opponent: play.opponent_symbol,
        }
    }

    pub fn for_cell(self, cell: Cell) -> char {
        match cell {
            Cell::Empty => '.',
            Cell::Engine => self.engine,
            Cell::Opponent => self.opponent,
        }
    }
}
