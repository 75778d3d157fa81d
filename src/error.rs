use std::path::PathBuf;

use crate::game::MoveError;

/// Broken search invariants. These abort the current operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("asked for an engine move while it is the opponent's turn")]
    NotEngineTurn,

    #[error("asked for a move in a finished game")]
    GameOver,

    #[error("search finished without a candidate move")]
    NoCandidateMove,

    #[error("position has no last move")]
    MissingLastMove,
}

/// Errors surfaced by a running game session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("illegal move: {0}")]
    Move(#[from] MoveError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("opening line move {index} at ({row},{col}) is not playable")]
    UnplayableOpening { index: usize, row: usize, col: usize },

    #[error("opening line ends the game after move {0}")]
    OpeningEndsGame(usize),

    #[error("it is not the opponent's turn")]
    NotOpponentTurn,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when reading an opening book.
#[derive(Debug, thiserror::Error)]
pub enum OpeningBookError {
    #[error("failed to read opening book {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unexpected character {found:?} on line {line}")]
    UnexpectedChar { line: usize, found: char },

    #[error("line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    #[error("opening book contains no lines")]
    Empty,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        assert_eq!(
            EngineError::NoCandidateMove.to_string(),
            "search finished without a candidate move"
        );
    }

    #[test]
    fn test_session_error_wraps_move_error() {
        let err: SessionError = MoveError::ColumnFull(2).into();
        assert_eq!(err.to_string(), "illegal move: column C is full");
    }

    #[test]
    fn test_opening_book_error_display() {
        let err = OpeningBookError::UnexpectedChar {
            line: 3,
            found: 'x',
        };
        assert_eq!(err.to_string(), "unexpected character 'x' on line 3");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("engine.table_buckets must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: engine.table_buckets must be > 0"
        );
    }
}
