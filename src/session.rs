//! A game between the engine and a human opponent.
//!
//! The session owns the engine (and with it the transposition table), the
//! caller-side board and the current searched root. Extension lists are threaded
//! from each root into the next search.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::ai::{Engine, Evaluation, RootPosition, SearchNode};
use crate::error::{EngineError, SessionError};
use crate::game::{Board, Coord, GameOutcome, MoveError, Side};

/// How a game is set up and presented.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    pub engine_first: bool,
    pub engine_symbol: char,
    pub opponent_symbol: char,
    /// Opening book to start games from. Games start on the empty board when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openings: Option<PathBuf>,
    /// Pause before showing an engine move in text mode.
    pub engine_move_delay_ms: u64,
}

impl Default for PlayConfig {
    fn default() -> Self {
        PlayConfig {
            engine_first: false,
            engine_symbol: 'O',
            opponent_symbol: 'X',
            openings: None,
            engine_move_delay_ms: 800,
        }
    }
}

impl PlayConfig {
    pub fn first_player(&self) -> Side {
        if self.engine_first {
            Side::Engine
        } else {
            Side::Opponent
        }
    }

    pub fn engine_move_delay(&self) -> Duration {
        Duration::from_millis(self.engine_move_delay_ms)
    }
}

pub struct GameSession {
    engine: Engine,
    board: Board,
    position: SearchNode,
    history: Vec<Coord>,
}

impl GameSession {
    /// New game on the empty board, searched with the full thinking budget.
    pub fn start(mut engine: Engine, first: Side) -> Self {
        info!("new game, {} moves first", first.name());
        let position = engine.new_game_root(first);
        GameSession {
            engine,
            board: Board::new(),
            position,
            history: Vec::new(),
        }
    }

    /// Replay `line` from the empty board so that `to_move` is to play once it
    /// ends.
    pub fn start_from_opening(mut engine: Engine, to_move: Side, line: &[Coord]) -> Result<Self, SessionError> {
        let (board, position) = replay_opening(&mut engine, to_move, line)?;
        Ok(GameSession {
            engine,
            board,
            position,
            history: line.to_vec(),
        })
    }

    pub fn restart(&mut self, first: Side) {
        info!("new game, {} moves first", first.name());
        self.position = self.engine.new_game_root(first);
        self.board = Board::new();
        self.history.clear();
    }

    pub fn restart_from_opening(&mut self, to_move: Side, line: &[Coord]) -> Result<(), SessionError> {
        let (board, position) = replay_opening(&mut self.engine, to_move, line)?;
        self.board = board;
        self.position = position;
        self.history = line.to_vec();
        Ok(())
    }

    /// Drop an opponent piece in `col` and search the reply with the full budget.
    pub fn play_opponent(&mut self, col: usize) -> Result<Coord, SessionError> {
        if self.is_over() {
            return Err(MoveError::GameOver.into());
        }
        if self.to_move() != Side::Opponent {
            return Err(SessionError::NotOpponentTurn);
        }

        let at = self.board.apply(col, Side::Opponent)?;
        self.position = self
            .engine
            .advance(self.board, Side::Engine, at, self.position.features());
        self.history.push(at);
        self.log_position();
        Ok(at)
    }

    /// Pick and play the engine's move. The new root is searched with a zero
    /// budget since the opponent's reply triggers the real search.
    pub fn play_engine(&mut self) -> Result<Coord, SessionError> {
        let mv = self.engine.best_move_for_engine(&self.position)?;
        if !self.board.is_playable(mv) {
            return Err(EngineError::NoCandidateMove.into());
        }
        let at = self.board.apply(mv.col, Side::Engine)?;

        let position = RootPosition::AfterMove {
            board: self.board,
            to_move: Side::Opponent,
            last_move: at,
            features: self.position.features().clone(),
        };
        self.position = self.engine.think(&position, Duration::ZERO, false);
        self.history.push(at);
        self.log_position();
        Ok(at)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Side {
        self.position.to_move()
    }

    pub fn position(&self) -> &SearchNode {
        &self.position
    }

    /// Current evaluation from the engine's point of view.
    pub fn evaluation(&self) -> Option<Evaluation> {
        self.position.evaluation()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Every move played so far, opening moves included.
    pub fn history(&self) -> &[Coord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<Coord> {
        self.history.last().copied()
    }

    /// Result read off the caller-side board around the last move.
    pub fn outcome(&self) -> Option<GameOutcome> {
        let at = self.last_move()?;
        let mover = self.board.cell(at).owner()?;
        GameOutcome::after_move(&self.board, at, mover)
    }

    pub fn is_over(&self) -> bool {
        self.position.is_game_over()
    }

    #[cfg(test)]
    pub(crate) fn replace_board(&mut self, board: Board) {
        self.board = board;
    }

    fn log_position(&self) {
        let stats = self.engine.stats();
        debug!(
            "after {} moves: {} to move, evaluation {}, depth {}, {} nodes",
            self.history.len(),
            self.to_move().name(),
            self.evaluation().map_or_else(|| "unresolved".to_string(), |e| e.to_string()),
            stats.depth_limit,
            stats.nodes,
        );
    }
}

/// Play out an opening line. Intermediate positions are searched with a zero
/// budget and every position starts a fresh table, so nothing learned while
/// setting up carries into the game.
fn replay_opening(engine: &mut Engine, to_move: Side, line: &[Coord]) -> Result<(Board, SearchNode), SessionError> {
    let first = if line.len() % 2 == 0 { to_move } else { to_move.other() };
    if line.is_empty() {
        return Ok((Board::new(), engine.new_game_root(first)));
    }
    info!("replaying a {}-move opening, {} moves first", line.len(), first.name());

    let budget = engine.config().thinking_time();
    let mut board = Board::new();
    let mut position = engine.think(&RootPosition::NewGame { to_move: first }, Duration::ZERO, true);
    let mut side = first;

    for (index, &mv) in line.iter().enumerate() {
        if position.is_game_over() {
            return Err(SessionError::OpeningEndsGame(index));
        }
        if !board.is_playable(mv) {
            return Err(SessionError::UnplayableOpening {
                index,
                row: mv.row,
                col: mv.col,
            });
        }
        board.apply(mv.col, side)?;

        let is_last = index + 1 == line.len();
        let root = RootPosition::AfterMove {
            board,
            to_move: side.other(),
            last_move: mv,
            features: position.features().clone(),
        };
        position = engine.think(&root, if is_last { budget } else { Duration::ZERO }, true);
        side = side.other();
    }

    if position.is_game_over() {
        return Err(SessionError::OpeningEndsGame(line.len()));
    }
    Ok((board, position))
}
