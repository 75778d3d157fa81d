use std::time::{Duration, Instant};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::{Board, Coord, Side, MAX_PLIES};

use super::evaluation::Evaluation;
use super::features::LineFeatures;
use super::hashing::SquareKeys;
use super::heuristic::{Heuristic, ThreatHeuristic};
use super::node::SearchNode;
use super::transposition::{TableEntry, TranspositionTable, DEFAULT_BUCKETS};

/// Engine tuning knobs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wall-clock budget per move. Checked between deepening iterations only.
    pub thinking_time_secs: f64,
    /// Longest forced win, in plies, the engine looks for when winning.
    pub quick_win_horizon: u32,
    /// Horizon used to measure how fast the opponent wins when losing.
    pub defense_horizon: u32,
    pub table_buckets: usize,
    /// Seed for tie-breaking among equally good moves. Random when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            thinking_time_secs: 0.30,
            quick_win_horizon: 9,
            defense_horizon: 7,
            table_buckets: DEFAULT_BUCKETS,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn thinking_time(&self) -> Duration {
        Duration::try_from_secs_f64(self.thinking_time_secs).unwrap_or(Duration::ZERO)
    }
}

/// Counters for the most recent `think` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub table_hits: u64,
    /// Depth limit of the last completed iteration.
    pub depth_limit: i32,
}

/// Where a search starts from.
#[derive(Debug, Clone)]
pub enum RootPosition {
    /// Empty board; searched straight away without consulting the table.
    NewGame { to_move: Side },
    /// `last_move` has just been played on `board`. `features` are the lists from
    /// the position before it.
    AfterMove {
        board: Board,
        to_move: Side,
        last_move: Coord,
        features: LineFeatures,
    },
}

/// State shared by every node of one search iteration.
pub(crate) struct Search<'a> {
    table: &'a mut TranspositionTable,
    keys: &'a SquareKeys,
    heuristic: &'a dyn Heuristic,
    stats: &'a mut SearchStats,
    limit: i32,
}

impl Search<'_> {
    /// Resolve a node: table hit, terminal position, quiet frontier, or a full
    /// minimax expansion.
    pub(crate) fn analyze(&mut self, node: &mut SearchNode) -> Evaluation {
        self.stats.nodes += 1;
        let required = self.limit - node.depth;

        let hit = self
            .table
            .lookup(node.hash, &node.board, node.to_move)
            .filter(|entry| entry.indisputable || entry.depth >= required)
            .map(|entry| (entry.evaluation, entry.indisputable));
        if let Some((evaluation, indisputable)) = hit {
            self.stats.table_hits += 1;
            return node.resolve(evaluation, indisputable);
        }

        if let Some(winner) = node.winner {
            node.resolve(Evaluation::win_for(winner), true);
            self.store(node);
            return Evaluation::win_for(winner);
        }

        if node.pieces == MAX_PLIES {
            node.resolve(Evaluation::DRAW, true);
            self.store(node);
            return Evaluation::DRAW;
        }

        let critical = node.features.critical_moves(&node.board, node.to_move);
        if node.depth >= self.limit && critical.is_empty() {
            let value = self.heuristic.evaluate(&node.board, &node.features);
            node.resolve(Evaluation::Heuristic(value), false);
            self.store(node);
            return Evaluation::Heuristic(value);
        }

        let remembered = self
            .table
            .lookup(node.hash, &node.board, node.to_move)
            .filter(|entry| !entry.move_order.is_empty())
            .map(|entry| entry.move_order.clone());
        match remembered {
            Some(order) => node.legal_moves = order,
            None => node.move_to_front(&critical),
        }

        self.minimax(node)
    }

    /// Expand every legal move, folding child values into this node with
    /// alpha-beta pruning. The engine maximizes, the opponent minimizes.
    pub(crate) fn minimax(&mut self, node: &mut SearchNode) -> Evaluation {
        let side = node.to_move;
        let mut best: Option<Evaluation> = None;
        let mut from_pruned_child = false;
        let mut all_exact = true;

        node.children.reserve(node.legal_moves.len());
        for index in 0..node.legal_moves.len() {
            let mut child = node.child(index, self.keys);
            let value = self.analyze(&mut child);
            let child_pruned = child.pruned;
            all_exact &= child.indisputable;
            // A folded child keeps no subtree of its own.
            child.children = Vec::new();
            node.children.push(child);

            if value.is_win_for(side) {
                node.resolve(value, true);
                self.store(node);
                return value;
            }

            let improves = match best {
                None => true,
                Some(current) => value.better_for(current, side),
            };
            if improves {
                best = Some(value);
                from_pruned_child = child_pruned;
            }
            let current = best.unwrap_or(value);

            match side {
                Side::Engine => {
                    if node.beta.is_some_and(|beta| beta <= current) {
                        return Self::prune(node, current.nudged_up(), from_pruned_child);
                    }
                    if node.alpha.is_none_or(|alpha| current > alpha) {
                        node.alpha = Some(current);
                    }
                }
                Side::Opponent => {
                    if node.alpha.is_some_and(|alpha| alpha >= current) {
                        return Self::prune(node, current.nudged_down(), from_pruned_child);
                    }
                    if node.beta.is_none_or(|beta| current < beta) {
                        node.beta = Some(current);
                    }
                }
            }
        }

        let Some(value) = best else {
            // No moves left on a non-full board cannot happen; treat as a draw.
            node.resolve(Evaluation::DRAW, true);
            self.store(node);
            return Evaluation::DRAW;
        };

        node.from_pruned_child = from_pruned_child;
        node.resolve(value, all_exact && !from_pruned_child);
        if !from_pruned_child {
            self.store(node);
        }
        value
    }

    /// A cut-off node: its value is only a bound, so it is never stored.
    fn prune(node: &mut SearchNode, value: Evaluation, from_pruned_child: bool) -> Evaluation {
        node.pruned = true;
        node.from_pruned_child = from_pruned_child;
        node.resolve(value, false)
    }

    fn store(&mut self, node: &SearchNode) {
        let Some(evaluation) = node.evaluation else {
            return;
        };
        let move_order = if node.indisputable {
            Vec::new()
        } else {
            node.ranked_moves()
        };
        self.table.insert_or_upgrade(
            node.hash,
            TableEntry {
                board: node.board,
                to_move: node.to_move,
                evaluation,
                depth: self.limit - node.depth,
                indisputable: node.indisputable,
                move_order,
            },
        );
    }
}

/// The search engine: owns the transposition table for one game, plus the
/// heuristic and the tie-break RNG.
pub struct Engine {
    pub(crate) table: TranspositionTable,
    pub(crate) keys: SquareKeys,
    heuristic: Box<dyn Heuristic>,
    pub(crate) rng: StdRng,
    pub(crate) config: EngineConfig,
    stats: SearchStats,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_heuristic(config, Box::new(ThreatHeuristic))
    }

    pub fn with_heuristic(config: EngineConfig, heuristic: Box<dyn Heuristic>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Engine {
            table: TranspositionTable::new(config.table_buckets),
            keys: SquareKeys::new(),
            heuristic,
            rng,
            config,
            stats: SearchStats::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn table(&self) -> &TranspositionTable {
        &self.table
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Forget everything learned this game.
    pub fn reset(&mut self) {
        info!("clearing transposition table ({} positions)", self.table.len());
        self.table.reset();
    }

    pub(crate) fn search(&mut self, limit: i32) -> Search<'_> {
        Search {
            table: &mut self.table,
            keys: &self.keys,
            heuristic: self.heuristic.as_ref(),
            stats: &mut self.stats,
            limit,
        }
    }

    /// Start a game: clears the table and searches the empty board.
    pub fn new_game_root(&mut self, to_move: Side) -> SearchNode {
        let budget = self.config.thinking_time();
        self.think(&RootPosition::NewGame { to_move }, budget, true)
    }

    /// Search the position reached by `last_move`.
    pub fn advance(&mut self, board: Board, to_move: Side, last_move: Coord, features: &LineFeatures) -> SearchNode {
        let budget = self.config.thinking_time();
        let position = RootPosition::AfterMove {
            board,
            to_move,
            last_move,
            features: features.clone(),
        };
        self.think(&position, budget, false)
    }

    /// Iterative deepening from depth limit 1 while time remains, the root is not
    /// yet exact, and the next limit still fits on the board. The last completed
    /// iteration is returned.
    pub fn think(&mut self, position: &RootPosition, budget: Duration, starting_new_game: bool) -> SearchNode {
        if starting_new_game {
            self.reset();
        }
        self.stats = SearchStats::default();

        let start = Instant::now();
        let mut limit = 1;
        let mut root = self.search_root(position, limit);
        self.log_iteration(&root, limit, start);

        while start.elapsed() < budget
            && !root.indisputable
            && root.pieces + (limit as usize + 1) <= MAX_PLIES
        {
            limit += 1;
            root = self.search_root(position, limit);
            self.log_iteration(&root, limit, start);
        }

        self.stats.depth_limit = limit;
        root
    }

    /// Build and search a fresh root at the given depth limit.
    pub(crate) fn search_root(&mut self, position: &RootPosition, limit: i32) -> SearchNode {
        match position {
            RootPosition::NewGame { to_move } => {
                let mut root = SearchNode::root(Board::new(), *to_move, None, LineFeatures::new(), &self.keys);
                self.search(limit).minimax(&mut root);
                root
            }
            RootPosition::AfterMove {
                board,
                to_move,
                last_move,
                features,
            } => {
                let mut root = SearchNode::root(*board, *to_move, Some(*last_move), features.clone(), &self.keys);
                self.search(limit).analyze(&mut root);
                root
            }
        }
    }

    fn log_iteration(&self, root: &SearchNode, limit: i32, start: Instant) {
        debug!(
            "depth {limit}: {} after {:?} ({} nodes, {} table hits, {} positions stored)",
            root.evaluation.map_or_else(|| "unresolved".to_string(), |e| e.to_string()),
            start.elapsed(),
            self.stats.nodes,
            self.stats.table_hits,
            self.table.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine(thinking_time_secs: f64) -> Engine {
        Engine::new(EngineConfig {
            thinking_time_secs,
            table_buckets: 100_003,
            seed: Some(7),
            ..EngineConfig::default()
        })
    }

    fn after_move(board: Board, to_move: Side, last_move: Coord) -> RootPosition {
        RootPosition::AfterMove {
            board,
            to_move,
            last_move,
            features: LineFeatures::scan(&board),
        }
    }

    #[test]
    fn reply_to_centre_opening_is_not_terminal() {
        let mut engine = test_engine(0.05);
        let mut board = Board::new();
        let last = board.apply(3, Side::Opponent).unwrap();

        let node = engine.advance(board, Side::Engine, last, &LineFeatures::new());
        assert!(!node.is_game_over());
        assert!(!node.did_engine_win() && !node.did_opponent_win());
        assert_eq!(node.legal_moves().len(), 7);
        assert!(node.evaluation().is_some());
    }

    #[test]
    fn completing_four_is_reported_as_opponent_win() {
        let mut engine = test_engine(0.05);
        let mut board = Board::new();
        let mut features = LineFeatures::new();
        for col in 0..3 {
            let at = board.apply(col, Side::Opponent).unwrap();
            features.record_move(&board, at);
            board.apply(col, Side::Engine).unwrap();
        }
        let last = board.apply(3, Side::Opponent).unwrap();

        let node = engine.advance(board, Side::Engine, last, &features);
        assert!(node.did_opponent_win());
        assert_eq!(node.evaluation(), Some(Evaluation::ForcedLoss));
        assert!(node.is_indisputable());
    }

    #[test]
    fn full_board_without_four_is_a_draw() {
        let mut engine = test_engine(0.05);
        let board = Board::from_rows([
            "EEOOEEO", "EEOOEEO", "OOEEOOE", "EEOOEEO", "OOEEOOE", "OOEEOOE",
        ])
        .unwrap();

        let node = engine.think(&after_move(board, Side::Opponent, Coord::new(0, 0)), Duration::ZERO, true);
        assert!(node.is_game_drawn());
        assert_eq!(node.evaluation(), Some(Evaluation::DRAW));
        assert!(node.is_indisputable());
    }

    #[test]
    fn immediate_win_is_forced() {
        let mut engine = test_engine(0.0);
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", "OO.....", "EEE...O",
        ])
        .unwrap();

        let node = engine.think(&after_move(board, Side::Engine, Coord::new(5, 6)), Duration::ZERO, true);
        assert_eq!(node.evaluation(), Some(Evaluation::ForcedWin));
        assert!(node.is_indisputable());
        assert_eq!(node.legal_moves()[0], Coord::new(5, 3));
    }

    #[test]
    fn forced_result_survives_longer_budget() {
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", "OO.....", "EEE...O",
        ])
        .unwrap();
        let position = after_move(board, Side::Engine, Coord::new(5, 6));

        let short = test_engine(0.0).think(&position, Duration::ZERO, true);
        let long = test_engine(0.0).think(&position, Duration::from_millis(200), true);
        assert_eq!(short.evaluation(), Some(Evaluation::ForcedWin));
        assert_eq!(long.evaluation(), Some(Evaluation::ForcedWin));
    }

    #[test]
    fn zero_budget_runs_a_single_iteration() {
        let mut engine = test_engine(0.0);
        let node = engine.think(&RootPosition::NewGame { to_move: Side::Engine }, Duration::ZERO, true);
        assert_eq!(engine.stats().depth_limit, 1);
        assert_eq!(node.children().len(), 7);
        assert!(node.children().iter().all(|child| child.children().is_empty()));
    }

    #[test]
    fn deepening_stops_when_the_next_limit_would_overfill_the_board() {
        // Six empty squares, none of which can complete a four for either side.
        let board = Board::from_rows([
            "E..OE..", "E.OOEE.", "OOEEOOE", "EEOOEEO", "OOEEOOE", "OOEEOOE",
        ])
        .unwrap();
        assert_eq!(board.pieces(), 36);

        let mut engine = test_engine(0.0);
        let position = after_move(board, Side::Opponent, Coord::new(2, 6));
        let node = engine.think(&position, Duration::from_secs(60), true);
        assert_eq!(engine.stats().depth_limit as usize, MAX_PLIES - board.pieces());
        assert!(!node.is_game_over());
        assert!(!node.children().is_empty());
    }

    #[test]
    fn new_game_resets_the_table() {
        let mut engine = test_engine(0.02);
        engine.new_game_root(Side::Engine);
        assert!(!engine.table().is_empty());

        engine.think(&RootPosition::NewGame { to_move: Side::Opponent }, Duration::ZERO, true);
        // Only the single depth-1 iteration has been stored since the reset.
        assert!(engine.table().len() <= 1 + 7);
    }

    #[test]
    fn root_value_matches_best_child() {
        let mut engine = test_engine(0.05);
        let node = engine.new_game_root(Side::Engine);
        let best = node
            .children()
            .iter()
            .filter_map(SearchNode::evaluation)
            .max()
            .unwrap();
        assert_eq!(node.evaluation(), Some(best));
    }

    struct Flat;

    impl Heuristic for Flat {
        fn evaluate(&self, _board: &Board, _features: &LineFeatures) -> i32 {
            0
        }
    }

    #[test]
    fn custom_heuristic_drives_quiet_positions() {
        let config = EngineConfig {
            table_buckets: 1_009,
            seed: Some(1),
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_heuristic(config, Box::new(Flat));
        let node = engine.think(&RootPosition::NewGame { to_move: Side::Opponent }, Duration::ZERO, true);
        assert_eq!(node.evaluation(), Some(Evaluation::Heuristic(0)));
        assert!(!node.is_indisputable());
    }

    #[test]
    fn search_blocks_open_three() {
        let mut engine = test_engine(0.05);
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", "......E", "OOO...E",
        ])
        .unwrap();
        let node = engine.think(&after_move(board, Side::Engine, Coord::new(5, 2)), Duration::from_millis(50), true);

        // Every other move loses on the spot.
        for child in node.children() {
            if child.last_move().unwrap() != Coord::new(5, 3) {
                assert_eq!(child.evaluation(), Some(Evaluation::ForcedLoss));
            }
        }
    }
}
