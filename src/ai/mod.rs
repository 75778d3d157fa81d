mod endgame;
pub mod evaluation;
pub mod features;
pub mod hashing;
pub mod heuristic;
pub mod minimax;
mod node;
pub mod transposition;

pub use endgame::QuickWin;
pub use evaluation::Evaluation;
pub use features::{Degree, ExtensionSquare, LineFeatures};
pub use heuristic::{Heuristic, ThreatHeuristic};
pub use minimax::{Engine, EngineConfig, RootPosition, SearchStats};
pub use node::SearchNode;
pub use transposition::{TableEntry, TranspositionTable};
