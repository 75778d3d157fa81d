use crate::game::Side;
use crate::session::GameSession;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::board_widget;
use super::PieceSymbols;

pub fn render(
    frame: &mut Frame,
    session: &GameSession,
    selected_column: usize,
    message: Option<&str>,
    symbols: PieceSymbols,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(11),   // Board
            Constraint::Length(3), // Engine info
            Constraint::Length(3), // Message
            Constraint::Length(3), // Controls
        ])
        .split(frame.area());

    render_header(frame, session, symbols, chunks[0]);
    let selected = (!session.is_over() && session.to_move() == Side::Opponent).then_some(selected_column);
    board_widget::render_board(frame, session.board(), selected, session.last_move(), symbols, chunks[1]);
    render_engine_info(frame, session, chunks[2]);
    render_message(frame, message, chunks[3]);
    render_controls(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, session: &GameSession, symbols: PieceSymbols, area: Rect) {
    let (status, color) = match session.outcome() {
        Some(outcome) => (outcome.describe().to_string(), Color::Green),
        None => match session.to_move() {
            Side::Opponent => (format!("Your move ({})", symbols.opponent), Color::Yellow),
            Side::Engine => (format!("Engine is thinking ({})", symbols.engine), Color::Red),
        },
    };

    let header = Paragraph::new(status)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Connect Four"));

    frame.render_widget(header, area);
}

fn render_engine_info(frame: &mut Frame, session: &GameSession, area: Rect) {
    let stats = session.engine().stats();
    let evaluation = session
        .evaluation()
        .map_or_else(|| "-".to_string(), |e| e.to_string());
    let line = Line::from(vec![
        Span::styled("Eval ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("{evaluation}  |  ")),
        Span::styled("Depth ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("{}  |  ", stats.depth_limit)),
        Span::styled("Nodes ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("{}  |  ", stats.nodes)),
        Span::styled("Table ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(session.engine().table().len().to_string()),
    ]);

    let info = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Engine"));
    frame.render_widget(info, area);
}

fn render_message(frame: &mut Frame, message: Option<&str>, area: Rect) {
    let msg_widget = Paragraph::new(message.unwrap_or(""))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(msg_widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let line = Line::from("←/→: Move  |  A-G: Drop in column  |  Enter: Drop  |  S: Swap who starts  |  R: Restart  |  Q: Quit");

    let controls = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));

    frame.render_widget(controls, area);
}
