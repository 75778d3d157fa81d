use crate::game::{Board, Coord, Side, COLS, ROWS};

use super::features::{Degree, ExtensionSquare, LineFeatures};

/// Trait for scoring a quiet position from the engine's point of view.
pub trait Heuristic: Send {
    fn evaluate(&self, board: &Board, features: &LineFeatures) -> i32;
}

/// Points per unit of height weight for a square that completes four.
const WINNING_WEIGHT: i32 = 10;
/// Points per unit of height weight for a square that only makes three.
const POTENTIAL_WEIGHT: i32 = 3;
/// Multiplier for a winning square directly above or below another one.
const STACKED_MULTIPLIER: i32 = 5;

type Marks = [[bool; COLS]; ROWS];

#[derive(Debug, Clone, Copy)]
struct ScoredSquare {
    square: Coord,
    value: i32,
}

/// Default heuristic: scores each side's tracked extension squares, weighting
/// low squares and deep columns, with parity barriers and stacking bonuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreatHeuristic;

impl ThreatHeuristic {
    /// Per column, the lowest square that wins for both sides. Squares at or above
    /// it are decided by parity and are not scored.
    fn column_barriers(board: &Board, features: &LineFeatures) -> [Option<usize>; COLS] {
        let engine = features.winning_squares(board, Side::Engine);
        let opponent = features.winning_squares(board, Side::Opponent);

        let mut barriers = [None; COLS];
        for square in engine.iter().filter(|square| opponent.contains(square)) {
            let barrier: &mut Option<usize> = &mut barriers[square.col];
            if barrier.is_none_or(|row| row < square.row) {
                *barrier = Some(square.row);
            }
        }
        barriers
    }

    fn accessible(barriers: &[Option<usize>; COLS], at: Coord) -> bool {
        barriers[at.col].is_none_or(|barrier| at.row > barrier)
    }

    fn height_weight(board: &Board, at: Coord) -> i32 {
        (at.row + 1 + board.column_height(at.col)) as i32
    }

    fn is_stacked(marks: &Marks, at: Coord) -> bool {
        let below = at.row + 1 < ROWS && marks[at.row + 1][at.col];
        let above = at.row > 0 && marks[at.row - 1][at.col];
        below || above
    }

    fn score_winning_square(board: &Board, marks: &mut Marks, at: Coord) -> ScoredSquare {
        let mut value = WINNING_WEIGHT * Self::height_weight(board, at);
        if Self::is_stacked(marks, at) {
            value *= STACKED_MULTIPLIER;
        }
        marks[at.row][at.col] = true;
        ScoredSquare { square: at, value }
    }

    fn has_open_continuation(
        board: &Board,
        marks: &Marks,
        barriers: &[Option<usize>; COLS],
        entry: &ExtensionSquare,
    ) -> bool {
        [entry.next, entry.other_next]
            .into_iter()
            .flatten()
            .any(|at| board.is_empty_at(at) && !marks[at.row][at.col] && Self::accessible(barriers, at))
    }

    /// Collect the scored squares of one side, marking its winning squares.
    fn side_squares(
        board: &Board,
        features: &LineFeatures,
        side: Side,
        barriers: &[Option<usize>; COLS],
        marks: &mut Marks,
    ) -> Vec<ScoredSquare> {
        let mut scored = Vec::new();
        let usable = |marks: &Marks, at: Coord| {
            board.is_empty_at(at) && !marks[at.row][at.col] && Self::accessible(barriers, at)
        };

        for entry in features.list(side, Degree::Three) {
            if usable(marks, entry.square) {
                scored.push(Self::score_winning_square(board, marks, entry.square));
            }
        }

        for entry in features.list(side, Degree::Two) {
            let at = entry.square;
            if !usable(marks, at) {
                continue;
            }
            if entry.connects(board, side) {
                scored.push(Self::score_winning_square(board, marks, at));
            } else if Self::has_open_continuation(board, marks, barriers, entry) {
                // Not marked: it only turns a two into a three.
                scored.push(ScoredSquare {
                    square: at,
                    value: POTENTIAL_WEIGHT * Self::height_weight(board, at),
                });
            }
        }

        scored
    }

    /// Discount a square sitting just above a rival winning square, or two rows
    /// above one of the side's own.
    fn discount(at: Coord, own: &Marks, rival: &Marks) -> f64 {
        if at.row + 1 < ROWS && rival[at.row + 1][at.col] {
            0.25
        } else if at.row + 2 < ROWS && own[at.row + 2][at.col] {
            0.75
        } else {
            1.0
        }
    }
}

impl Heuristic for ThreatHeuristic {
    fn evaluate(&self, board: &Board, features: &LineFeatures) -> i32 {
        let barriers = Self::column_barriers(board, features);

        let mut engine_marks = [[false; COLS]; ROWS];
        let mut opponent_marks = [[false; COLS]; ROWS];
        let engine = Self::side_squares(board, features, Side::Engine, &barriers, &mut engine_marks);
        let opponent =
            Self::side_squares(board, features, Side::Opponent, &barriers, &mut opponent_marks);

        let mut score = 0.0;
        for scored in &engine {
            score += f64::from(scored.value) * Self::discount(scored.square, &engine_marks, &opponent_marks);
        }
        for scored in &opponent {
            score -= f64::from(scored.value) * Self::discount(scored.square, &opponent_marks, &engine_marks);
        }

        score.round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;
    use rand::SeedableRng;

    fn three(square: Coord) -> ExtensionSquare {
        ExtensionSquare {
            square,
            next: None,
            other_next: None,
        }
    }

    #[test]
    fn heuristic_empty_board_is_zero() {
        let h = ThreatHeuristic;
        assert_eq!(h.evaluate(&Board::new(), &LineFeatures::new()), 0);
    }

    #[test]
    fn open_three_on_bottom_row() {
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", ".......", "EEE....",
        ])
        .unwrap();
        let features = LineFeatures::scan(&board);
        // (5,3): weight 10 * (5 + 1 + 0)
        assert_eq!(ThreatHeuristic.evaluate(&board, &features), 60);
    }

    #[test]
    fn stacked_threats_multiply() {
        let board = Board::new();
        let mut features = LineFeatures::new();
        features.push(Side::Engine, Degree::Three, three(Coord::new(5, 3)));
        features.push(Side::Engine, Degree::Three, three(Coord::new(4, 3)));
        // 60 for the lower square, 5 * 50 for the one stacked on it
        assert_eq!(ThreatHeuristic.evaluate(&board, &features), 310);
    }

    #[test]
    fn square_above_rival_threat_is_discounted() {
        let board = Board::new();
        let mut features = LineFeatures::new();
        features.push(Side::Engine, Degree::Three, three(Coord::new(3, 3)));
        features.push(Side::Opponent, Degree::Three, three(Coord::new(4, 3)));
        // 40 * 0.25 - 50
        assert_eq!(ThreatHeuristic.evaluate(&board, &features), -40);
    }

    #[test]
    fn square_two_above_own_threat_is_discounted() {
        let board = Board::new();
        let mut features = LineFeatures::new();
        features.push(Side::Engine, Degree::Three, three(Coord::new(3, 3)));
        features.push(Side::Engine, Degree::Three, three(Coord::new(5, 3)));
        // 40 * 0.75 + 60
        assert_eq!(ThreatHeuristic.evaluate(&board, &features), 90);
    }

    #[test]
    fn shared_winning_square_blocks_its_column() {
        let board = Board::new();
        let mut features = LineFeatures::new();
        features.push(Side::Engine, Degree::Three, three(Coord::new(4, 3)));
        features.push(Side::Engine, Degree::Three, three(Coord::new(5, 3)));
        features.push(Side::Engine, Degree::Three, three(Coord::new(2, 3)));
        features.push(Side::Opponent, Degree::Three, three(Coord::new(4, 3)));
        // Only (5,3) lies below the barrier at row 4.
        assert_eq!(ThreatHeuristic.evaluate(&board, &features), 60);
    }

    #[test]
    fn two_run_entries_score_by_continuation() {
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", ".......", "EE.E.O.",
        ])
        .unwrap();
        let mut features = LineFeatures::new();
        // Completes four through the piece at (5,3)
        features.push(
            Side::Engine,
            Degree::Two,
            ExtensionSquare {
                square: Coord::new(5, 2),
                next: Some(Coord::new(5, 3)),
                other_next: None,
            },
        );
        // Only makes three, but (3,4) is still open
        features.push(
            Side::Engine,
            Degree::Two,
            ExtensionSquare {
                square: Coord::new(4, 4),
                next: Some(Coord::new(3, 4)),
                other_next: None,
            },
        );
        // Dead: the only continuation is taken by the opponent
        features.push(
            Side::Engine,
            Degree::Two,
            ExtensionSquare {
                square: Coord::new(5, 6),
                next: Some(Coord::new(5, 5)),
                other_next: None,
            },
        );
        // 10 * 6 + 3 * (5 + 0)
        assert_eq!(ThreatHeuristic.evaluate(&board, &features), 75);
    }

    #[test]
    fn mirrored_position_scores_the_same() {
        let mut rng = StdRng::seed_from_u64(19);
        let h = ThreatHeuristic;
        for _ in 0..200 {
            let mut board = Board::new();
            let mut features = LineFeatures::new();
            let mut side = Side::Engine;
            for _ in 0..20 {
                let Some(&mv) = board.legal_moves().choose(&mut rng) else {
                    break;
                };
                let at = board.apply(mv.col, side).unwrap();
                if features.record_move(&board, at).is_some() {
                    break;
                }
                side = side.other();
            }
            assert_eq!(
                h.evaluate(&board, &features),
                h.evaluate(&board.mirrored(), &features.mirrored()),
                "asymmetric score for {board:?}"
            );
        }
    }
}
