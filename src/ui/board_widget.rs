use crate::game::{column_letter, Board, Cell, Coord, COLS, ROWS};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::PieceSymbols;

fn cell_span(cell: Cell, symbols: PieceSymbols, highlighted: bool) -> Span<'static> {
    let color = match cell {
        Cell::Empty => Color::DarkGray,
        Cell::Engine => Color::Red,
        Cell::Opponent => Color::Yellow,
    };
    let mut style = Style::default().fg(color);
    if highlighted {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }
    Span::styled(format!(" {} ", symbols.for_cell(cell)), style)
}

/// Board lines with column letters on top, row numbers on the left and a marker
/// under the selected column. The last move is highlighted.
pub fn board_lines(
    board: &Board,
    selected_column: Option<usize>,
    last_move: Option<Coord>,
    symbols: PieceSymbols,
) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(ROWS + 4);

    let mut header = vec![Span::raw("   ")];
    for col in 0..COLS {
        let label = format!(" {} ", column_letter(col));
        if selected_column == Some(col) {
            header.push(Span::styled(
                label,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ));
        } else {
            header.push(Span::raw(label));
        }
    }
    header.push(Span::raw("  "));
    lines.push(Line::from(header));

    lines.push(Line::from("  ╔═════════════════════╗"));
    for row in 0..ROWS {
        let mut spans = vec![Span::raw(format!("{} ║", ROWS - row))];
        for col in 0..COLS {
            let at = Coord::new(row, col);
            spans.push(cell_span(board.cell(at), symbols, last_move == Some(at)));
        }
        spans.push(Span::raw("║ "));
        lines.push(Line::from(spans));
    }
    lines.push(Line::from("  ╚═════════════════════╝"));

    let mut indicator = vec![Span::raw("   ")];
    for col in 0..COLS {
        if selected_column == Some(col) {
            indicator.push(Span::styled(" ▲ ", Style::default().fg(Color::Cyan)));
        } else {
            indicator.push(Span::raw("   "));
        }
    }
    indicator.push(Span::raw("  "));
    lines.push(Line::from(indicator));

    lines
}

pub fn render_board(
    frame: &mut Frame,
    board: &Board,
    selected_column: Option<usize>,
    last_move: Option<Coord>,
    symbols: PieceSymbols,
    area: Rect,
) {
    let widget = Paragraph::new(board_lines(board, selected_column, last_move, symbols))
        .alignment(Alignment::Center);
    frame.render_widget(widget, area);
}
