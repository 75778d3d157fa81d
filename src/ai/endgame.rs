//! Move selection at the root, including the sharpening of forced results:
//! the fastest route to a known win and the most stubborn defence in a known
//! loss.

use log::trace;
use rand::seq::SliceRandom;

use crate::error::EngineError;
use crate::game::{Coord, Side};

use super::evaluation::Evaluation;
use super::minimax::Engine;
use super::node::SearchNode;

/// A move that forces a win within `plies` plies of the mover's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickWin {
    pub mv: Coord,
    pub plies: u32,
}

impl Engine {
    /// Pick the move to play from a searched root where the engine is to move.
    pub fn best_move_for_engine(&mut self, node: &SearchNode) -> Result<Coord, EngineError> {
        if node.is_game_over() {
            return Err(EngineError::GameOver);
        }
        if node.to_move != Side::Engine {
            return Err(EngineError::NotEngineTurn);
        }

        let rebuilt;
        let children: &[SearchNode] = if node.children.is_empty() {
            // The root came straight from the table; search each move one ply.
            rebuilt = self.one_ply_children(node);
            &rebuilt
        } else {
            &node.children
        };

        match node.evaluation {
            Some(Evaluation::ForcedWin) => {
                if let Some(win) = self.fastest_win(node, self.config.quick_win_horizon) {
                    trace!("winning with {} in {} plies", win.mv, win.plies);
                    return Ok(win.mv);
                }
            }
            Some(Evaluation::ForcedLoss) => return self.most_stubborn_defence(node),
            _ => {}
        }

        self.pick_among_best(node.evaluation, children)
    }

    /// The move that wins fastest for the side to move in `node`, if one wins
    /// within `max_plies` plies against every reply.
    pub fn fastest_win(&mut self, node: &SearchNode, max_plies: u32) -> Option<QuickWin> {
        if max_plies < 1 || node.is_game_over() {
            return None;
        }
        let player = node.to_move;

        for &mv in &node.legal_moves {
            let mut board = node.board;
            board.place(mv, player);
            if board.has_four_in_a_row_through(mv) {
                return Some(QuickWin { mv, plies: 1 });
            }
        }
        if max_plies < 3 {
            return None;
        }

        let mut best: Option<QuickWin> = None;
        for &mv in &node.legal_moves {
            let after = self.searched_after(node, mv);
            if after.evaluation != Some(Evaluation::win_for(player)) || after.legal_moves.is_empty() {
                continue;
            }

            let mut slowest = 1;
            let mut refuted = false;
            for &reply in &after.legal_moves {
                let answered = self.searched_after(&after, reply);
                if answered.evaluation == Some(Evaluation::win_for(player.other())) {
                    refuted = true;
                    break;
                }
                match self.fastest_win(&answered, max_plies - 2) {
                    Some(win) => slowest = slowest.max(win.plies),
                    None => {
                        refuted = true;
                        break;
                    }
                }
            }
            if refuted {
                continue;
            }

            let plies = slowest + 2;
            if best.is_none_or(|current| plies < current.plies) {
                best = Some(QuickWin { mv, plies });
            }
        }
        best
    }

    /// In a lost position, play the move after which the opponent needs the most
    /// plies to win, or any move after which no win within the defence horizon
    /// is found.
    pub(crate) fn most_stubborn_defence(&mut self, node: &SearchNode) -> Result<Coord, EngineError> {
        let mut best: Option<QuickWin> = None;
        for &mv in &node.legal_moves {
            let after = self.searched_after(node, mv);
            match self.fastest_win(&after, self.config.defense_horizon) {
                None => {
                    trace!("{mv} holds out beyond {} plies", self.config.defense_horizon);
                    return Ok(mv);
                }
                Some(win) => {
                    if best.is_none_or(|current| win.plies > current.plies) {
                        best = Some(QuickWin { mv, plies: win.plies });
                    }
                }
            }
        }
        best.map(|defence| defence.mv).ok_or(EngineError::NoCandidateMove)
    }

    /// Shuffle the children and take the first whose value is at least the
    /// root's. Falls back to the best child.
    fn pick_among_best(
        &mut self,
        target: Option<Evaluation>,
        children: &[SearchNode],
    ) -> Result<Coord, EngineError> {
        let mut order: Vec<usize> = (0..children.len()).collect();
        order.shuffle(&mut self.rng);

        let good_enough = order.into_iter().find(|&index| {
            match (children[index].evaluation, target) {
                (Some(value), Some(target)) => value >= target,
                (Some(_), None) => true,
                (None, _) => false,
            }
        });
        if let Some(index) = good_enough {
            return children[index].last_move();
        }

        children
            .iter()
            .filter_map(|child| Some((child.evaluation?, child)))
            .max_by_key(|(value, _)| *value)
            .ok_or(EngineError::NoCandidateMove)
            .and_then(|(_, child)| child.last_move())
    }

    fn one_ply_children(&mut self, node: &SearchNode) -> Vec<SearchNode> {
        node.legal_moves
            .iter()
            .map(|&mv| self.searched_after(node, mv))
            .collect()
    }

    /// Play `mv` for the side to move in `parent` and search the result as a
    /// fresh root at depth limit 1.
    fn searched_after(&mut self, parent: &SearchNode, mv: Coord) -> SearchNode {
        let mut board = parent.board;
        board.place(mv, parent.to_move);
        let mut root = SearchNode::root(
            board,
            parent.to_move.other(),
            Some(mv),
            parent.features.clone(),
            &self.keys,
        );
        self.search(1).analyze(&mut root);
        root
    }
}
