use crate::error::EngineError;
use crate::game::{Board, Coord, Side, MAX_PLIES};

use super::evaluation::Evaluation;
use super::features::LineFeatures;
use super::hashing::{PositionHash, SquareKeys};

/// One position in the search tree.
///
/// A node owns its children exclusively. Parents discard a child's own subtree
/// once its value has been folded in, so only the root of a finished search keeps
/// one level of children around for move selection.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub(crate) board: Board,
    pub(crate) to_move: Side,
    pub(crate) depth: i32,
    pub(crate) pieces: usize,
    pub(crate) last_move: Option<Coord>,
    /// One candidate square per open column, in search order.
    pub(crate) legal_moves: Vec<Coord>,
    pub(crate) alpha: Option<Evaluation>,
    pub(crate) beta: Option<Evaluation>,
    pub(crate) features: LineFeatures,
    pub(crate) hash: PositionHash,
    /// Side that completed four with the last move.
    pub(crate) winner: Option<Side>,
    pub(crate) evaluation: Option<Evaluation>,
    pub(crate) indisputable: bool,
    pub(crate) children: Vec<SearchNode>,
    pub(crate) pruned: bool,
    pub(crate) from_pruned_child: bool,
}

impl SearchNode {
    /// A search root for `board`, with `features` carried over from the previous
    /// ply. Stale entries are purged and `last_move` is recorded.
    pub(crate) fn root(
        board: Board,
        to_move: Side,
        last_move: Option<Coord>,
        mut features: LineFeatures,
        keys: &SquareKeys,
    ) -> Self {
        features.purge_filled(&board);
        let winner = last_move.and_then(|at| features.record_move(&board, at));
        SearchNode {
            board,
            to_move,
            depth: 0,
            pieces: board.pieces(),
            last_move,
            legal_moves: board.legal_moves(),
            alpha: None,
            beta: None,
            features,
            hash: keys.full_hash(&board),
            winner,
            evaluation: None,
            indisputable: false,
            children: Vec::new(),
            pruned: false,
            from_pruned_child: false,
        }
    }

    /// The position after playing `legal_moves[index]`, inheriting the current
    /// alpha/beta window.
    pub(crate) fn child(&self, index: usize, keys: &SquareKeys) -> SearchNode {
        let mv = self.legal_moves[index];
        let mut board = self.board;
        board.place(mv, self.to_move);

        let mut legal_moves = self.legal_moves.clone();
        if mv.row == 0 {
            legal_moves.remove(index);
        } else {
            legal_moves[index] = Coord::new(mv.row - 1, mv.col);
        }

        let mut features = self.features.clone();
        let winner = features.record_move(&board, mv);

        SearchNode {
            board,
            to_move: self.to_move.other(),
            depth: self.depth + 1,
            pieces: self.pieces + 1,
            last_move: Some(mv),
            legal_moves,
            alpha: self.alpha,
            beta: self.beta,
            features,
            hash: keys.after_move(self.hash, mv, self.to_move),
            winner,
            evaluation: None,
            indisputable: false,
            children: Vec::new(),
            pruned: false,
            from_pruned_child: false,
        }
    }

    /// Put `front` at the head of the move list, keeping the relative order of
    /// the remaining moves.
    pub(crate) fn move_to_front(&mut self, front: &[Coord]) {
        let mut reordered: Vec<Coord> = front
            .iter()
            .copied()
            .filter(|mv| self.legal_moves.contains(mv))
            .collect();
        reordered.extend(self.legal_moves.iter().copied().filter(|mv| !front.contains(mv)));
        debug_assert_eq!(reordered.len(), self.legal_moves.len());
        self.legal_moves = reordered;
    }

    pub(crate) fn resolve(&mut self, evaluation: Evaluation, indisputable: bool) -> Evaluation {
        self.evaluation = Some(evaluation);
        self.indisputable = indisputable;
        evaluation
    }

    /// Children's moves ordered best first for the side to move.
    pub(crate) fn ranked_moves(&self) -> Vec<Coord> {
        let mut ranked: Vec<(Evaluation, Coord)> = self
            .children
            .iter()
            .filter_map(|child| Some((child.evaluation?, child.last_move?)))
            .collect();
        match self.to_move {
            Side::Engine => ranked.sort_by(|a, b| b.0.cmp(&a.0)),
            Side::Opponent => ranked.sort_by(|a, b| a.0.cmp(&b.0)),
        }
        ranked.into_iter().map(|(_, mv)| mv).collect()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Side {
        self.to_move
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn pieces(&self) -> usize {
        self.pieces
    }

    /// The move that produced this position.
    pub fn last_move(&self) -> Result<Coord, EngineError> {
        self.last_move.ok_or(EngineError::MissingLastMove)
    }

    pub fn legal_moves(&self) -> &[Coord] {
        &self.legal_moves
    }

    /// The four extension-square lists, to be handed to the next `advance`.
    pub fn features(&self) -> &LineFeatures {
        &self.features
    }

    /// `None` until the node has been searched.
    pub fn evaluation(&self) -> Option<Evaluation> {
        self.evaluation
    }

    pub fn is_indisputable(&self) -> bool {
        self.indisputable
    }

    pub fn children(&self) -> &[SearchNode] {
        &self.children
    }

    /// Take ownership of the child reached by `mv`, discarding its siblings.
    pub fn into_child(self, mv: Coord) -> Option<SearchNode> {
        self.children
            .into_iter()
            .find(|child| child.last_move == Some(mv))
    }

    pub fn did_engine_win(&self) -> bool {
        self.winner == Some(Side::Engine)
    }

    pub fn did_opponent_win(&self) -> bool {
        self.winner == Some(Side::Opponent)
    }

    pub fn is_game_drawn(&self) -> bool {
        self.winner.is_none() && self.pieces == MAX_PLIES
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_some() || self.pieces == MAX_PLIES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_updates_board_moves_and_hash() {
        let keys = SquareKeys::new();
        let root = SearchNode::root(Board::new(), Side::Engine, None, LineFeatures::new(), &keys);
        let child = root.child(3, &keys);

        assert_eq!(child.board.get(5, 3), crate::game::Cell::Engine);
        assert_eq!(child.to_move, Side::Opponent);
        assert_eq!(child.depth, 1);
        assert_eq!(child.pieces, 1);
        assert_eq!(child.legal_moves[3], Coord::new(4, 3));
        assert_eq!(child.legal_moves.len(), 7);
        assert_eq!(child.hash, keys.full_hash(&child.board));
        assert_eq!(child.last_move(), Ok(Coord::new(5, 3)));
    }

    #[test]
    fn filling_a_column_removes_it_from_the_move_list() {
        let keys = SquareKeys::new();
        let board = Board::from_rows([
            ".......", "E......", "O......", "E......", "O......", "E......",
        ])
        .unwrap();
        let root = SearchNode::root(board, Side::Opponent, Some(Coord::new(1, 0)), LineFeatures::new(), &keys);
        assert_eq!(root.legal_moves[0], Coord::new(0, 0));

        let child = root.child(0, &keys);
        assert_eq!(child.legal_moves.len(), 6);
        assert!(child.legal_moves.iter().all(|mv| mv.col != 0));
    }

    #[test]
    fn empty_root_has_no_last_move() {
        let keys = SquareKeys::new();
        let root = SearchNode::root(Board::new(), Side::Opponent, None, LineFeatures::new(), &keys);
        assert_eq!(root.last_move(), Err(EngineError::MissingLastMove));
        assert!(!root.is_game_over());
    }

    #[test]
    fn move_to_front_keeps_the_rest_in_order() {
        let keys = SquareKeys::new();
        let mut root = SearchNode::root(Board::new(), Side::Engine, None, LineFeatures::new(), &keys);
        root.move_to_front(&[Coord::new(5, 4), Coord::new(5, 1)]);
        let cols: Vec<usize> = root.legal_moves.iter().map(|mv| mv.col).collect();
        assert_eq!(cols, vec![4, 1, 0, 2, 3, 5, 6]);
    }

    #[test]
    fn into_child_keeps_only_the_chosen_subtree() {
        let keys = SquareKeys::new();
        let mut root = SearchNode::root(Board::new(), Side::Engine, None, LineFeatures::new(), &keys);
        root.children = (0..root.legal_moves.len()).map(|index| root.child(index, &keys)).collect();

        let chosen = root.clone().into_child(Coord::new(5, 2)).unwrap();
        assert_eq!(chosen.last_move(), Ok(Coord::new(5, 2)));
        assert_eq!(chosen.to_move(), Side::Opponent);
        assert!(root.into_child(Coord::new(4, 2)).is_none());
    }

    #[test]
    fn root_records_a_winning_last_move() {
        let keys = SquareKeys::new();
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", ".......", "OOOO...",
        ])
        .unwrap();
        let root = SearchNode::root(board, Side::Engine, Some(Coord::new(5, 3)), LineFeatures::new(), &keys);
        assert!(root.did_opponent_win());
        assert!(!root.did_engine_win());
        assert!(root.is_game_over());
    }
}
