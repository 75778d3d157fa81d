//! # Connect Four Engine
//!
//! An alpha-beta Connect Four engine for the 6x7 board. Threats are tracked
//! incrementally as moves are played, searched positions are memoised in a
//! transposition table, and iterative deepening runs under a wall-clock budget.
//! Ships with a Ratatui terminal UI and a plain-text mode.
//!
//! ## Modules
//!
//! - [`game`]: Board, sides, move application, win and draw detection
//! - [`ai`]: Line features, hashing, transposition table, heuristic, minimax, endgame
//! - [`session`]: A game between the engine and a human opponent
//! - [`opening`]: Opening book of balanced starting lines
//! - [`ui`]: Terminal UI and text mode
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod opening;
pub mod session;
pub mod ui;
