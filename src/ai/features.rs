//! Incremental threat tracking.
//!
//! After every move the four lines through the new piece are inspected and the
//! empty squares that would lengthen a run of the mover's pieces are appended to
//! one of four lists (engine/opponent x two-run/three-run). Children inherit their
//! parent's lists, so threat detection at a node only costs the work done for its
//! last move.

use crate::game::{Board, Coord, Direction, Run, Side, COLS, ROWS};

/// An empty square that extends a run of its owner's pieces, together with the
/// squares one step further along the line on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionSquare {
    pub square: Coord,
    pub next: Option<Coord>,
    pub other_next: Option<Coord>,
}

impl ExtensionSquare {
    /// True if one of the further squares already holds a piece of `side`, so that
    /// filling `square` would complete four in a row.
    pub fn connects(&self, board: &Board, side: Side) -> bool {
        [self.next, self.other_next]
            .into_iter()
            .flatten()
            .any(|at| board.cell(at) == side.to_cell())
    }

    pub fn mirrored(&self) -> Self {
        ExtensionSquare {
            square: self.square.mirrored(),
            next: self.next.map(Coord::mirrored),
            other_next: self.other_next.map(Coord::mirrored),
        }
    }
}

/// Length of the run an extension square belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    Two,
    Three,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineFeatures {
    engine_two: Vec<ExtensionSquare>,
    engine_three: Vec<ExtensionSquare>,
    opponent_two: Vec<ExtensionSquare>,
    opponent_three: Vec<ExtensionSquare>,
}

impl LineFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the lists for an arbitrary board by treating every piece as if it
    /// had just been played.
    pub fn scan(board: &Board) -> Self {
        let mut features = LineFeatures::new();
        for col in 0..COLS {
            for row in (0..ROWS).rev() {
                let at = Coord::new(row, col);
                if board.is_empty_at(at) {
                    break;
                }
                features.record_move(board, at);
            }
        }
        features.dedup();
        features
    }

    pub fn list(&self, side: Side, degree: Degree) -> &[ExtensionSquare] {
        match (side, degree) {
            (Side::Engine, Degree::Two) => &self.engine_two,
            (Side::Engine, Degree::Three) => &self.engine_three,
            (Side::Opponent, Degree::Two) => &self.opponent_two,
            (Side::Opponent, Degree::Three) => &self.opponent_three,
        }
    }

    fn list_mut(&mut self, side: Side, degree: Degree) -> &mut Vec<ExtensionSquare> {
        match (side, degree) {
            (Side::Engine, Degree::Two) => &mut self.engine_two,
            (Side::Engine, Degree::Three) => &mut self.engine_three,
            (Side::Opponent, Degree::Two) => &mut self.opponent_two,
            (Side::Opponent, Degree::Three) => &mut self.opponent_three,
        }
    }

    pub fn push(&mut self, side: Side, degree: Degree, entry: ExtensionSquare) {
        self.list_mut(side, degree).push(entry);
    }

    /// Total number of recorded entries across the four lists.
    pub fn len(&self) -> usize {
        self.engine_two.len()
            + self.engine_three.len()
            + self.opponent_two.len()
            + self.opponent_three.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inspect the four lines through `last_move` and record new extension squares
    /// for whoever owns that piece. Returns the owner if the move completed four in
    /// a row; the remaining directions are skipped in that case.
    pub fn record_move(&mut self, board: &Board, last_move: Coord) -> Option<Side> {
        let mover = board.cell(last_move).owner()?;
        for direction in Direction::ALL {
            let run = board.run_through(last_move, direction);
            match run.len {
                0 => {}
                1 => {
                    if direction != Direction::Vertical {
                        self.record_split_pairs(board, last_move, mover, direction);
                    }
                }
                2 => self.record_run_ends(board, run, mover, direction, Degree::Two),
                3 => self.record_run_ends(board, run, mover, direction, Degree::Three),
                _ => return Some(mover),
            }
        }
        None
    }

    /// A lone piece with one empty square and then another own piece beyond it.
    fn record_split_pairs(&mut self, board: &Board, last_move: Coord, mover: Side, direction: Direction) {
        let (dr, dc) = direction.step();
        for (vr, vc) in [(-dr, -dc), (dr, dc)] {
            let Some(far) = last_move.offset(2 * vr, 2 * vc) else {
                continue;
            };
            if board.cell(far) != mover.to_cell() {
                continue;
            }
            let Some(square) = last_move.offset(vr, vc) else {
                continue;
            };
            if !board.is_empty_at(square) {
                continue;
            }
            self.push(
                mover,
                Degree::Two,
                ExtensionSquare {
                    square,
                    next: square.offset(2 * vr, 2 * vc),
                    other_next: last_move.offset(-vr, -vc),
                },
            );
        }
    }

    fn record_run_ends(&mut self, board: &Board, run: Run, mover: Side, direction: Direction, degree: Degree) {
        let (dr, dc) = direction.step();

        // Below a vertical run there is nothing left to fill.
        if direction == Direction::Vertical {
            if let Some(above) = run.start.offset(-dr, -dc) {
                if board.is_empty_at(above) {
                    self.push(
                        mover,
                        degree,
                        ExtensionSquare {
                            square: above,
                            next: above.offset(-dr, -dc),
                            other_next: None,
                        },
                    );
                }
            }
            return;
        }

        let preceding = run.start.offset(-dr, -dc);
        let succeeding = run.end.offset(dr, dc);

        if let Some(square) = preceding.filter(|&at| board.is_empty_at(at)) {
            self.push(
                mover,
                degree,
                ExtensionSquare {
                    square,
                    next: square.offset(-dr, -dc),
                    other_next: succeeding,
                },
            );
        }
        if let Some(square) = succeeding.filter(|&at| board.is_empty_at(at)) {
            self.push(
                mover,
                degree,
                ExtensionSquare {
                    square,
                    next: square.offset(dr, dc),
                    other_next: preceding,
                },
            );
        }
    }

    /// Drop entries whose square has been filled since they were recorded.
    pub fn purge_filled(&mut self, board: &Board) {
        for list in [
            &mut self.engine_two,
            &mut self.engine_three,
            &mut self.opponent_two,
            &mut self.opponent_three,
        ] {
            list.retain(|entry| board.is_empty_at(entry.square));
        }
    }

    fn dedup(&mut self) {
        for list in [
            &mut self.engine_two,
            &mut self.engine_three,
            &mut self.opponent_two,
            &mut self.opponent_three,
        ] {
            let mut seen: Vec<ExtensionSquare> = Vec::with_capacity(list.len());
            list.retain(|entry| {
                if seen.contains(entry) {
                    false
                } else {
                    seen.push(*entry);
                    true
                }
            });
        }
    }

    /// Squares playable right now that complete four in a row for either side.
    /// The side to move comes first, and within a side two-run entries are checked
    /// before three-run entries.
    pub fn critical_moves(&self, board: &Board, to_move: Side) -> Vec<Coord> {
        let mut moves = Vec::new();
        for side in [to_move, to_move.other()] {
            for degree in [Degree::Two, Degree::Three] {
                for entry in self.list(side, degree) {
                    let completes = degree == Degree::Three || entry.connects(board, side);
                    if completes && board.is_playable(entry.square) && !moves.contains(&entry.square) {
                        moves.push(entry.square);
                    }
                }
            }
        }
        moves
    }

    /// Empty squares, playable or not, that would complete four in a row for `side`.
    pub fn winning_squares(&self, board: &Board, side: Side) -> Vec<Coord> {
        let mut squares = Vec::new();
        for entry in self.list(side, Degree::Three) {
            if board.is_empty_at(entry.square) && !squares.contains(&entry.square) {
                squares.push(entry.square);
            }
        }
        for entry in self.list(side, Degree::Two) {
            if board.is_empty_at(entry.square)
                && entry.connects(board, side)
                && !squares.contains(&entry.square)
            {
                squares.push(entry.square);
            }
        }
        squares
    }

    /// Every entry reflected through the centre column, list order preserved.
    pub fn mirrored(&self) -> Self {
        let mirror = |list: &[ExtensionSquare]| list.iter().map(ExtensionSquare::mirrored).collect();
        LineFeatures {
            engine_two: mirror(&self.engine_two),
            engine_three: mirror(&self.engine_three),
            opponent_two: mirror(&self.opponent_two),
            opponent_three: mirror(&self.opponent_three),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;
    use rand::SeedableRng;

    fn play(board: &mut Board, features: &mut LineFeatures, col: usize, side: Side) -> Option<Side> {
        let at = board.apply(col, side).unwrap();
        features.record_move(board, at)
    }

    fn squares(list: &[ExtensionSquare]) -> Vec<Coord> {
        list.iter().map(|entry| entry.square).collect()
    }

    #[test]
    fn horizontal_pair_records_both_ends() {
        let mut board = Board::new();
        let mut features = LineFeatures::new();
        play(&mut board, &mut features, 2, Side::Engine);
        play(&mut board, &mut features, 3, Side::Engine);

        let two = features.list(Side::Engine, Degree::Two);
        assert!(two.contains(&ExtensionSquare {
            square: Coord::new(5, 1),
            next: Some(Coord::new(5, 0)),
            other_next: Some(Coord::new(5, 4)),
        }));
        assert!(two.contains(&ExtensionSquare {
            square: Coord::new(5, 4),
            next: Some(Coord::new(5, 5)),
            other_next: Some(Coord::new(5, 1)),
        }));
        assert!(features.list(Side::Opponent, Degree::Two).is_empty());
    }

    #[test]
    fn three_run_skips_blocked_end() {
        let mut board = Board::new();
        let mut features = LineFeatures::new();
        play(&mut board, &mut features, 0, Side::Opponent);
        play(&mut board, &mut features, 1, Side::Engine);
        play(&mut board, &mut features, 2, Side::Engine);
        play(&mut board, &mut features, 3, Side::Engine);

        assert_eq!(squares(features.list(Side::Engine, Degree::Three)), vec![Coord::new(5, 4)]);
    }

    #[test]
    fn vertical_runs_only_look_upward() {
        let mut board = Board::new();
        let mut features = LineFeatures::new();
        play(&mut board, &mut features, 4, Side::Opponent);
        assert!(features.is_empty());

        play(&mut board, &mut features, 4, Side::Opponent);
        assert_eq!(
            features.list(Side::Opponent, Degree::Two),
            &[ExtensionSquare {
                square: Coord::new(3, 4),
                next: Some(Coord::new(2, 4)),
                other_next: None,
            }]
        );
    }

    #[test]
    fn split_pair_records_the_gap() {
        let mut board = Board::new();
        let mut features = LineFeatures::new();
        play(&mut board, &mut features, 1, Side::Engine);
        play(&mut board, &mut features, 3, Side::Engine);

        assert_eq!(
            features.list(Side::Engine, Degree::Two),
            &[ExtensionSquare {
                square: Coord::new(5, 2),
                next: Some(Coord::new(5, 0)),
                other_next: Some(Coord::new(5, 4)),
            }]
        );
    }

    #[test]
    fn split_pair_with_filled_gap_is_ignored() {
        let mut board = Board::new();
        let mut features = LineFeatures::new();
        play(&mut board, &mut features, 1, Side::Engine);
        play(&mut board, &mut features, 2, Side::Opponent);
        play(&mut board, &mut features, 3, Side::Engine);

        assert!(features.list(Side::Engine, Degree::Two).is_empty());
    }

    #[test]
    fn four_reports_the_mover() {
        let mut board = Board::new();
        let mut features = LineFeatures::new();
        for col in 0..3 {
            assert_eq!(play(&mut board, &mut features, col, Side::Opponent), None);
        }
        assert_eq!(play(&mut board, &mut features, 3, Side::Opponent), Some(Side::Opponent));
    }

    #[test]
    fn critical_moves_put_side_to_move_first() {
        let mut board = Board::new();
        let mut features = LineFeatures::new();
        // Engine three on the bottom row, opponent three stacked in column 6.
        for col in 0..3 {
            play(&mut board, &mut features, col, Side::Engine);
        }
        for _ in 0..3 {
            play(&mut board, &mut features, 6, Side::Opponent);
        }

        assert_eq!(
            features.critical_moves(&board, Side::Opponent),
            vec![Coord::new(2, 6), Coord::new(5, 3)]
        );
        assert_eq!(
            features.critical_moves(&board, Side::Engine),
            vec![Coord::new(5, 3), Coord::new(2, 6)]
        );
    }

    #[test]
    fn unplayable_threats_are_not_critical() {
        let board = Board::from_rows([
            ".......", ".......", ".......", "EEE....", "OOO....", "OEO....",
        ])
        .unwrap();
        let features = LineFeatures::scan(&board);

        // (3,3) needs two more pieces below it; (4,3) is blocked for now too.
        assert!(features.winning_squares(&board, Side::Engine).contains(&Coord::new(3, 3)));
        assert!(features.winning_squares(&board, Side::Opponent).contains(&Coord::new(4, 3)));
        assert!(features.critical_moves(&board, Side::Engine).is_empty());
    }

    #[test]
    fn purge_drops_filled_squares() {
        let mut board = Board::new();
        let mut features = LineFeatures::new();
        play(&mut board, &mut features, 2, Side::Engine);
        play(&mut board, &mut features, 3, Side::Engine);
        board.apply(4, Side::Opponent).unwrap();

        features.purge_filled(&board);
        assert_eq!(squares(features.list(Side::Engine, Degree::Two)), vec![Coord::new(5, 1)]);
    }

    #[test]
    fn critical_moves_are_exactly_the_immediate_wins() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..300 {
            let mut board = Board::new();
            let mut features = LineFeatures::new();
            let mut side = Side::Engine;
            loop {
                let legal = board.legal_moves();
                let critical = features.critical_moves(&board, side);
                for mv in &legal {
                    let wins = [Side::Engine, Side::Opponent].iter().any(|&s| {
                        let mut probe = board;
                        let at = probe.apply(mv.col, s).unwrap();
                        probe.has_four_in_a_row_through(at)
                    });
                    assert_eq!(wins, critical.contains(mv), "move {mv} on {board:?}");
                }
                assert_eq!(
                    {
                        let mut scanned = LineFeatures::scan(&board).critical_moves(&board, side);
                        scanned.sort_by_key(|c| (c.row, c.col));
                        scanned
                    },
                    {
                        let mut tracked = critical.clone();
                        tracked.sort_by_key(|c| (c.row, c.col));
                        tracked
                    }
                );

                let Some(&mv) = legal.choose(&mut rng) else {
                    break;
                };
                if play(&mut board, &mut features, mv.col, side).is_some() {
                    break;
                }
                side = side.other();
            }
        }
    }

    #[test]
    fn mirrored_features_match_mirrored_board() {
        let board = Board::from_rows([
            ".......", ".......", ".......", "O......", "EE.....", "OEE.O..",
        ])
        .unwrap();
        let features = LineFeatures::scan(&board);
        let mirrored = features.mirrored();
        assert_eq!(mirrored.len(), features.len());

        let mut expected = LineFeatures::scan(&board.mirrored()).winning_squares(&board.mirrored(), Side::Engine);
        let mut actual = mirrored.winning_squares(&board.mirrored(), Side::Engine);
        expected.sort_by_key(|c| (c.row, c.col));
        actual.sort_by_key(|c| (c.row, c.col));
        assert_eq!(actual, expected);
    }
}
