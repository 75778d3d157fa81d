//! Plain-text play over any reader and writer.

use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::thread;

use crate::error::SessionError;
use crate::game::{column_letter, parse_column, Board, Cell, Coord, GameOutcome, Side, COLS, ROWS};
use crate::session::{GameSession, PlayConfig};

use super::PieceSymbols;

/// The board with letters across the top and row numbers counting up from the
/// bottom.
pub fn render_board(board: &Board, symbols: PieceSymbols) -> String {
    let mut out = String::from("\n   ");
    for col in 0..COLS {
        let _ = write!(out, " {}  ", column_letter(col));
    }
    out.push_str("\n\n");

    for row in 0..ROWS {
        let _ = write!(out, "{} | ", ROWS - row);
        for col in 0..COLS {
            let symbol = match board.cell(Coord::new(row, col)) {
                Cell::Empty => ' ',
                cell => symbols.for_cell(cell),
            };
            let _ = write!(out, "{symbol} | ");
        }
        out.push_str("\n  |---|---|---|---|---|---|---|\n");
    }
    out
}

fn announce_move(mover: Side, at: Coord) -> String {
    match mover {
        Side::Engine => format!("The computer just moved to square: {at}"),
        Side::Opponent => format!("You just moved to square: {at}"),
    }
}

fn final_message(outcome: GameOutcome) -> &'static str {
    match outcome {
        GameOutcome::Winner(Side::Engine) => "The computer won!",
        GameOutcome::Winner(Side::Opponent) => "You won!",
        GameOutcome::Draw => "The game is a draw!",
    }
}

/// Prompt until the input names a column that still has room. `None` at end of
/// input.
pub fn read_column<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    board: &Board,
) -> Result<Option<usize>, SessionError> {
    write!(output, "Enter a column from 'A'-'G' (or 'a'-'g') to move: ")?;
    output.flush()?;

    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if board.is_legal_letter(&line) {
            return Ok(parse_column(&line));
        }
        write!(output, "You entered an invalid move. Please try again: ")?;
        output.flush()?;
    }
}

/// Play one game to the end. Returns `None` if the input ran out first.
pub fn play<R: BufRead, W: Write>(
    session: &mut GameSession,
    play: &PlayConfig,
    input: &mut R,
    output: &mut W,
) -> Result<Option<GameOutcome>, SessionError> {
    let symbols = PieceSymbols::from_config(play);

    writeln!(output, "\nSTARTING POSITION:")?;
    write!(output, "{}", render_board(session.board(), symbols))?;

    while !session.is_over() {
        match session.to_move() {
            Side::Engine => {
                thread::sleep(play.engine_move_delay());
                let at = session.play_engine()?;
                writeln!(output, "\n{}", announce_move(Side::Engine, at))?;
            }
            Side::Opponent => {
                writeln!(output)?;
                let Some(col) = read_column(input, output, session.board())? else {
                    return Ok(None);
                };
                let at = session.play_opponent(col)?;
                writeln!(output, "\n{}", announce_move(Side::Opponent, at))?;
            }
        }
        write!(output, "{}", render_board(session.board(), symbols))?;
    }

    let outcome = session.outcome();
    if let Some(outcome) = outcome {
        writeln!(output, "\n{}\n", final_message(outcome))?;
    }
    Ok(outcome)
}
