use crate::game::{Board, Coord, Side};

use super::evaluation::Evaluation;
use super::hashing::PositionHash;

pub const DEFAULT_BUCKETS: usize = 1_000_005;

/// A searched position remembered between nodes, iterations and turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub board: Board,
    pub to_move: Side,
    pub evaluation: Evaluation,
    /// How many plies below this position the evaluation was computed to.
    pub depth: i32,
    /// Exact result that more search cannot change.
    pub indisputable: bool,
    /// Legal moves ordered best first. Empty for indisputable entries.
    pub move_order: Vec<Coord>,
}

impl TableEntry {
    fn same_position(&self, board: &Board, to_move: Side) -> bool {
        self.to_move == to_move && self.board == *board
    }
}

/// Bucketed memo of positions. Collisions are chained inside a bucket and
/// resolved by comparing the full board and side to move.
#[derive(Debug)]
pub struct TranspositionTable {
    buckets: Vec<Vec<TableEntry>>,
    occupied: Vec<usize>,
    entries: usize,
}

impl TranspositionTable {
    pub fn new(buckets: usize) -> Self {
        let buckets = buckets.max(1);
        TranspositionTable {
            buckets: vec![Vec::new(); buckets],
            occupied: Vec::new(),
            entries: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Number of stored positions.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of buckets holding at least one entry.
    pub fn occupied_buckets(&self) -> usize {
        self.occupied.len()
    }

    pub fn lookup(&self, hash: PositionHash, board: &Board, to_move: Side) -> Option<&TableEntry> {
        self.buckets[hash.bucket(self.capacity())]
            .iter()
            .find(|entry| entry.same_position(board, to_move))
    }

    /// Store `entry` unless the same position is already stored with an equal or
    /// greater depth.
    pub fn insert_or_upgrade(&mut self, hash: PositionHash, entry: TableEntry) {
        let index = hash.bucket(self.capacity());
        let bucket = &mut self.buckets[index];

        if let Some(existing) = bucket
            .iter_mut()
            .find(|existing| existing.same_position(&entry.board, entry.to_move))
        {
            if entry.depth > existing.depth {
                *existing = entry;
            }
            return;
        }

        bucket.push(entry);
        self.entries += 1;
        if bucket.len() == 1 {
            self.occupied.push(index);
        }
    }

    /// Empty every occupied bucket. Cost follows occupancy, not capacity.
    pub fn reset(&mut self) {
        for index in self.occupied.drain(..) {
            self.buckets[index].clear();
        }
        self.entries = 0;
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS)
    }
}
