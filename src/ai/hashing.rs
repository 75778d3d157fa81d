use crate::game::{Board, Cell, Coord, Side, COLS, ROWS};

/// Fixed-point scale applied to every square contribution.
const SCALE: f64 = 1e9;
/// Raw hashes are multiplied by ten until they reach this floor.
const BUCKET_FLOOR: f64 = 100_000.0;

/// Per-square hash contributions for each occupant kind.
///
/// Contributions come from closed-form functions of the square position and are
/// stored in fixed point so that updating a hash one move at a time gives exactly
/// the same bits as summing the whole board.
#[derive(Debug, Clone)]
pub struct SquareKeys {
    engine: [[i64; COLS]; ROWS],
    opponent: [[i64; COLS]; ROWS],
    empty: [[i64; COLS]; ROWS],
}

impl SquareKeys {
    pub fn new() -> Self {
        let mut keys = SquareKeys {
            engine: [[0; COLS]; ROWS],
            opponent: [[0; COLS]; ROWS],
            empty: [[0; COLS]; ROWS],
        };
        for row in 0..ROWS {
            for col in 0..COLS {
                let x = ((row + 1) * (col + 1)) as f64 + (col + 1) as f64 / 7.0;
                keys.engine[row][col] = to_fixed(cot_degrees(x + 5.0) / 5.0);
                keys.opponent[row][col] = to_fixed((x + 1.0).log10());
                keys.empty[row][col] = to_fixed((x + 1.0).sqrt() - 1.3);
            }
        }
        keys
    }

    pub fn contribution(&self, at: Coord, cell: Cell) -> i64 {
        match cell {
            Cell::Engine => self.engine[at.row][at.col],
            Cell::Opponent => self.opponent[at.row][at.col],
            Cell::Empty => self.empty[at.row][at.col],
        }
    }

    /// Sum the contributions of all 42 squares.
    pub fn full_hash(&self, board: &Board) -> PositionHash {
        let mut sum = 0;
        for row in 0..ROWS {
            for col in 0..COLS {
                let at = Coord::new(row, col);
                sum += self.contribution(at, board.cell(at));
            }
        }
        PositionHash(sum)
    }

    /// Hash of the position reached when `side` fills the empty square `at`.
    pub fn after_move(&self, hash: PositionHash, at: Coord, side: Side) -> PositionHash {
        PositionHash(hash.0 - self.contribution(at, Cell::Empty) + self.contribution(at, side.to_cell()))
    }
}

impl Default for SquareKeys {
    fn default() -> Self {
        Self::new()
    }
}

fn cot_degrees(degrees: f64) -> f64 {
    1.0 / degrees.to_radians().tan()
}

fn to_fixed(value: f64) -> i64 {
    (value * SCALE).round() as i64
}

/// Pre-bucket hash of a position, in fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionHash(i64);

impl PositionHash {
    /// The real-valued sum of contributions.
    pub fn raw(self) -> f64 {
        self.0 as f64 / SCALE
    }

    /// Scale the raw hash by ten until it reaches the floor, round, and fold it
    /// into `buckets`.
    pub fn bucket(self, buckets: usize) -> usize {
        let mut value = self.raw();
        if value.is_nan() || value <= 0.0 || buckets == 0 {
            return 0;
        }
        while value < BUCKET_FLOOR {
            value *= 10.0;
        }
        (value.round() as u64 % buckets as u64) as usize
    }
}
