//! Opening book: lines of moves that lead to balanced starting positions.
//!
//! Each line of the file lists `(row,col)` pairs, for example
//! `(5,3) (4,3) (5,2) (5,4)`. Rows count from the top, so row 5 is the bottom.
//! Only digits, parentheses, commas and spaces may appear.

use std::path::{Path, PathBuf};

use log::info;
use rand::Rng;

use crate::error::OpeningBookError;
use crate::game::{Coord, COLS, ROWS};

pub const MIN_LINE_MOVES: usize = 4;
pub const MAX_LINE_MOVES: usize = 9;

/// One sequence of moves from the empty board, alternating sides.
pub type OpeningLine = Vec<Coord>;

/// Opening lines still available to draw. Once every line has been played the
/// book refills itself from the lines it was loaded with.
#[derive(Debug, Clone)]
pub struct OpeningBook {
    source: Option<PathBuf>,
    all: Vec<OpeningLine>,
    remaining: Vec<OpeningLine>,
}

impl OpeningBook {
    pub fn load(path: &Path) -> Result<Self, OpeningBookError> {
        let text = std::fs::read_to_string(path).map_err(|e| OpeningBookError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut book = Self::parse(&text)?;
        book.source = Some(path.to_path_buf());
        info!("loaded {} opening lines from {}", book.all.len(), path.display());
        Ok(book)
    }

    /// Parse and validate the text of an opening book.
    pub fn parse(text: &str) -> Result<Self, OpeningBookError> {
        let mut raw: Vec<&str> = text.split('\n').collect();
        if raw.last().is_some_and(|line| line.trim_end_matches('\r').is_empty()) {
            raw.pop();
        }

        let lines = raw
            .iter()
            .enumerate()
            .map(|(index, line)| parse_line(index + 1, line))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_lines(lines)
    }

    pub fn from_lines(lines: Vec<OpeningLine>) -> Result<Self, OpeningBookError> {
        if lines.is_empty() {
            return Err(OpeningBookError::Empty);
        }
        for (index, line) in lines.iter().enumerate() {
            validate_line(index + 1, line)?;
        }
        Ok(OpeningBook {
            source: None,
            remaining: lines.clone(),
            all: lines,
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Lines in the book as loaded.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Lines not yet drawn since the last refill.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Remove and return a random line.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> OpeningLine {
        if self.remaining.is_empty() {
            info!("every opening has been played, refilling the book");
            self.remaining = self.all.clone();
        }
        let index = rng.random_range(0..self.remaining.len());
        self.remaining.swap_remove(index)
    }
}

fn parse_line(line_number: usize, line: &str) -> Result<OpeningLine, OpeningBookError> {
    let mut moves = Vec::new();
    let mut row = None;

    for found in line.chars() {
        match found {
            '0'..='9' => {
                let digit = found as usize - '0' as usize;
                match row.take() {
                    None => row = Some(digit),
                    Some(r) => moves.push(Coord::new(r, digit)),
                }
            }
            '(' | ')' | ',' | ' ' | '\r' => {}
            _ => {
                return Err(OpeningBookError::UnexpectedChar {
                    line: line_number,
                    found,
                })
            }
        }
    }

    if row.is_some() {
        return Err(OpeningBookError::InvalidLine {
            line: line_number,
            reason: "row without a column".to_string(),
        });
    }
    Ok(moves)
}

fn validate_line(line_number: usize, line: &[Coord]) -> Result<(), OpeningBookError> {
    if !(MIN_LINE_MOVES..=MAX_LINE_MOVES).contains(&line.len()) {
        return Err(OpeningBookError::InvalidLine {
            line: line_number,
            reason: format!(
                "has {} moves, expected {MIN_LINE_MOVES} to {MAX_LINE_MOVES}",
                line.len()
            ),
        });
    }
    if let Some(off) = line.iter().find(|mv| mv.row >= ROWS || mv.col >= COLS) {
        return Err(OpeningBookError::InvalidLine {
            line: line_number,
            reason: format!("({},{}) is off the board", off.row, off.col),
        });
    }
    Ok(())
}
