use super::{Board, Coord, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(Side),
    Draw,
}

impl GameOutcome {
    /// Outcome of the game right after `mover` landed a piece on `last_move`,
    /// or `None` if play continues.
    pub fn after_move(board: &Board, last_move: Coord, mover: Side) -> Option<GameOutcome> {
        if board.has_four_in_a_row_through(last_move) {
            Some(GameOutcome::Winner(mover))
        } else if board.is_full() {
            Some(GameOutcome::Draw)
        } else {
            None
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            GameOutcome::Winner(Side::Engine) => "The engine wins.",
            GameOutcome::Winner(Side::Opponent) => "You win!",
            GameOutcome::Draw => "It's a draw.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_detection() {
        let mut board = Board::new();
        let mut last = None;

        // Engine builds a horizontal line, opponent stacks on top of it
        for col in 0..4 {
            let at = board.apply(col, Side::Engine).unwrap();
            last = Some(at);
            if col < 3 {
                board.apply(col, Side::Opponent).unwrap();
            }
        }

        let last = last.unwrap();
        assert_eq!(
            GameOutcome::after_move(&board, last, Side::Engine),
            Some(GameOutcome::Winner(Side::Engine))
        );
    }

    #[test]
    fn test_draw_on_full_board_without_four() {
        let board = Board::from_rows([
            "EEOOEEO", "EEOOEEO", "OOEEOOE", "EEOOEEO", "OOEEOOE", "OOEEOOE",
        ])
        .unwrap();
        assert!(!board.has_any_four());
        assert_eq!(
            GameOutcome::after_move(&board, Coord::new(0, 0), Side::Engine),
            Some(GameOutcome::Draw)
        );
    }

    #[test]
    fn test_game_continues() {
        let mut board = Board::new();
        let at = board.apply(3, Side::Opponent).unwrap();
        assert_eq!(GameOutcome::after_move(&board, at, Side::Opponent), None);
    }
}
