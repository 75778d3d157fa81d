use super::board::Cell;

/// One of the two participants. The engine is the maximizing side in search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Engine,
    Opponent,
}

impl Side {
    /// Get the other side
    pub fn other(self) -> Side {
        match self {
            Side::Engine => Side::Opponent,
            Side::Opponent => Side::Engine,
        }
    }

    /// Convert side to cell type
    pub fn to_cell(self) -> Cell {
        match self {
            Side::Engine => Cell::Engine,
            Side::Opponent => Cell::Opponent,
        }
    }

    pub fn is_engine(self) -> bool {
        self == Side::Engine
    }

    /// Get side name for display
    pub fn name(self) -> &'static str {
        match self {
            Side::Engine => "Engine",
            Side::Opponent => "Opponent",
        }
    }
}
