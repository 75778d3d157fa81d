use std::fmt;

use super::player::Side;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;
/// Number of plies after which the board is full.
pub const MAX_PLIES: usize = ROWS * COLS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Engine,
    Opponent,
}

impl Cell {
    /// The side owning a piece in this cell, if any.
    pub fn owner(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Engine => Some(Side::Engine),
            Cell::Opponent => Some(Side::Opponent),
        }
    }
}

/// A square of the board. Row 0 is the top row, row 5 the bottom one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }

    /// Step `(dr, dc)` away from this square, or `None` if that leaves the grid.
    pub fn offset(self, dr: isize, dc: isize) -> Option<Coord> {
        let row = self.row as isize + dr;
        let col = self.col as isize + dc;
        if (0..ROWS as isize).contains(&row) && (0..COLS as isize).contains(&col) {
            Some(Coord::new(row as usize, col as usize))
        } else {
            None
        }
    }

    /// The same square reflected through the centre column.
    pub fn mirrored(self) -> Coord {
        Coord::new(self.row, COLS - 1 - self.col)
    }
}

impl fmt::Display for Coord {
    /// Column letter followed by the visual row number, e.g. `D1` for the bottom centre.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), ROWS - self.row)
    }
}

/// The four line directions through a square. `step` points from the start of a
/// run to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
    /// Bottom-left to top-right (`/`).
    Rising,
    /// Top-left to bottom-right (`\`).
    Falling,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::Rising,
        Direction::Falling,
    ];

    pub fn step(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
            Direction::Rising => (-1, 1),
            Direction::Falling => (1, 1),
        }
    }
}

/// A maximal run of same-owner pieces along one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: Coord,
    pub end: Coord,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("column {0} does not exist")]
    InvalidColumn(usize),

    #[error("column {} is full", column_letter(*.0))]
    ColumnFull(usize),

    #[error("the game is already over")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBoardError {
    #[error("unexpected symbol {symbol:?} at row {row}, col {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },

    #[error("row {0} does not have {COLS} cells")]
    RowLength(usize),

    #[error("piece at {0} has an empty square below it")]
    FloatingPiece(Coord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
    heights: [u8; COLS],
    pieces: u8,
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; COLS]; ROWS],
            heights: [0; COLS],
            pieces: 0,
        }
    }

    /// Build a board from six rows written top to bottom, using `E` for engine
    /// pieces, `O` for opponent pieces and `.` for empty squares.
    pub fn from_rows(rows: [&str; ROWS]) -> Result<Self, ParseBoardError> {
        let mut board = Board::new();
        for (row, text) in rows.iter().enumerate() {
            let symbols: Vec<char> = text.chars().collect();
            if symbols.len() != COLS {
                return Err(ParseBoardError::RowLength(row));
            }
            for (col, &symbol) in symbols.iter().enumerate() {
                let cell = match symbol {
                    '.' | ' ' => Cell::Empty,
                    'E' => Cell::Engine,
                    'O' => Cell::Opponent,
                    _ => return Err(ParseBoardError::UnknownSymbol { symbol, row, col }),
                };
                board.cells[row][col] = cell;
            }
        }

        for col in 0..COLS {
            let mut height = 0;
            for row in (0..ROWS).rev() {
                if board.cells[row][col] == Cell::Empty {
                    continue;
                }
                if row + 1 < ROWS && board.cells[row + 1][col] == Cell::Empty {
                    return Err(ParseBoardError::FloatingPiece(Coord::new(row, col)));
                }
                height += 1;
            }
            board.heights[col] = height;
            board.pieces += height;
        }

        Ok(board)
    }

    /// Get the cell at a specific position
    /// Row 0 is the top, row 5 is the bottom
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    pub fn cell(&self, at: Coord) -> Cell {
        self.cells[at.row][at.col]
    }

    pub fn is_empty_at(&self, at: Coord) -> bool {
        self.cell(at) == Cell::Empty
    }

    /// Number of pieces on the board.
    pub fn pieces(&self) -> usize {
        self.pieces as usize
    }

    /// Number of pieces already stacked in `col`.
    pub fn column_height(&self, col: usize) -> usize {
        self.heights[col] as usize
    }

    /// Check if a column is full
    pub fn is_column_full(&self, col: usize) -> bool {
        if col >= COLS {
            return true;
        }
        self.cells[0][col] != Cell::Empty
    }

    /// True iff a piece can still be dropped into `col`.
    pub fn is_legal(&self, col: usize) -> bool {
        !self.is_column_full(col)
    }

    /// Row a piece dropped into `col` would land on.
    pub fn playable_row(&self, col: usize) -> Option<usize> {
        if self.is_column_full(col) {
            None
        } else {
            Some(ROWS - 1 - self.column_height(col))
        }
    }

    /// True iff `at` is empty and is the lowest empty square of its column.
    pub fn is_playable(&self, at: Coord) -> bool {
        self.playable_row(at.col) == Some(at.row)
    }

    /// One candidate square per non-full column, left to right.
    pub fn legal_moves(&self) -> Vec<Coord> {
        (0..COLS)
            .filter_map(|col| self.playable_row(col).map(|row| Coord::new(row, col)))
            .collect()
    }

    /// Drop a piece for `side` in a column, returns the square where it landed
    pub fn apply(&mut self, col: usize, side: Side) -> Result<Coord, MoveError> {
        if col >= COLS {
            return Err(MoveError::InvalidColumn(col));
        }
        let row = self.playable_row(col).ok_or(MoveError::ColumnFull(col))?;
        let at = Coord::new(row, col);
        self.place(at, side);
        Ok(at)
    }

    /// Put a piece on a square already known to be the playable one of its column.
    pub(crate) fn place(&mut self, at: Coord, side: Side) {
        debug_assert!(self.is_playable(at), "{at} is not playable");
        self.cells[at.row][at.col] = side.to_cell();
        self.heights[at.col] += 1;
        self.pieces += 1;
    }

    /// Check if the board is completely full
    pub fn is_full(&self) -> bool {
        self.pieces() == MAX_PLIES
    }

    /// Walk outward from `at` in both senses of `direction` and return the run of
    /// pieces sharing `at`'s owner. An empty square yields a run of length 0.
    pub fn run_through(&self, at: Coord, direction: Direction) -> Run {
        let piece = self.cell(at);
        if piece == Cell::Empty {
            return Run {
                start: at,
                end: at,
                len: 0,
            };
        }

        let (dr, dc) = direction.step();
        let mut len = 1;
        let mut start = at;
        while let Some(prev) = start.offset(-dr, -dc) {
            if self.cell(prev) != piece {
                break;
            }
            start = prev;
            len += 1;
        }

        let mut end = at;
        while let Some(next) = end.offset(dr, dc) {
            if self.cell(next) != piece {
                break;
            }
            end = next;
            len += 1;
        }

        Run { start, end, len }
    }

    /// Check if the last move at `last_move` completed four in a row.
    pub fn has_four_in_a_row_through(&self, last_move: Coord) -> bool {
        Direction::ALL
            .iter()
            .any(|&direction| self.run_through(last_move, direction).len >= 4)
    }

    /// Whole-board scan for any four in a row.
    pub fn has_any_four(&self) -> bool {
        (0..ROWS).any(|row| {
            (0..COLS).any(|col| {
                let at = Coord::new(row, col);
                self.cell(at) != Cell::Empty && self.has_four_in_a_row_through(at)
            })
        })
    }

    /// The board reflected through the centre column.
    pub fn mirrored(&self) -> Board {
        let mut mirrored = *self;
        for row in 0..ROWS {
            for col in 0..COLS {
                mirrored.cells[row][COLS - 1 - col] = self.cells[row][col];
            }
        }
        for col in 0..COLS {
            mirrored.heights[COLS - 1 - col] = self.heights[col];
        }
        mirrored
    }

    /// Validate a human-entered column letter (`A`-`G`, either case) against the
    /// current board.
    pub fn is_legal_letter(&self, input: &str) -> bool {
        parse_column(input).is_some_and(|col| self.is_legal(col))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

pub fn column_letter(col: usize) -> char {
    (b'A' + col as u8) as char
}

/// Parse a single column letter, `A`-`G` or `a`-`g`.
pub fn parse_column(input: &str) -> Option<usize> {
    let mut chars = input.trim().chars();
    let letter = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match letter {
        'a'..='g' => Some(letter as usize - 'a' as usize),
        'A'..='G' => Some(letter as usize - 'A' as usize),
        _ => None,
    }
}
