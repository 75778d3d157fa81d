use crate::error::SessionError;
use crate::game::{parse_column, Side, COLS};
use crate::opening::OpeningBook;
use crate::session::{GameSession, PlayConfig};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use log::error;
use rand::rngs::StdRng;
use ratatui::{backend::Backend, Terminal};
use std::io;

use super::PieceSymbols;

pub struct App {
    session: GameSession,
    play: PlayConfig,
    symbols: PieceSymbols,
    book: Option<OpeningBook>,
    rng: StdRng,
    selected_column: usize,
    pending_drop: Option<usize>,
    should_quit: bool,
    message: Option<String>,
}

impl App {
    pub fn new(session: GameSession, play: PlayConfig, book: Option<OpeningBook>, rng: StdRng) -> Self {
        App {
            session,
            symbols: PieceSymbols::from_config(&play),
            play,
            book,
            rng,
            selected_column: 3, // Start in middle
            pending_drop: None,
            should_quit: false,
            message: None,
        }
    }

    /// Main application loop. Engine and opening errors end it.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), SessionError>
    where
        B::Error: Into<io::Error>,
    {
        loop {
            terminal.draw(|f| self.render(f)).map_err(Into::<io::Error>::into)?;

            if self.should_quit {
                break;
            }

            if !self.tick()? {
                self.handle_events()?;
            }
        }
        Ok(())
    }

    /// Play a queued opponent drop or the engine's move. Returns false when
    /// waiting for input.
    fn tick(&mut self) -> Result<bool, SessionError> {
        if let Some(col) = self.pending_drop.take() {
            self.drop_piece(col);
            return Ok(true);
        }
        if !self.session.is_over() && self.session.to_move() == Side::Engine {
            self.engine_move()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn handle_events(&mut self) -> Result<(), SessionError> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key)?;
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<(), SessionError> {
        // Clear message on any key press
        self.message = None;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Left => {
                self.selected_column = self.selected_column.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.selected_column + 1 < COLS {
                    self.selected_column += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.queue_drop(self.selected_column);
            }
            KeyCode::Char('r') => {
                self.new_game()?;
            }
            KeyCode::Char('s') => {
                self.play.engine_first = !self.play.engine_first;
                self.new_game()?;
            }
            KeyCode::Char(letter) => {
                if let Some(col) = parse_column(letter.encode_utf8(&mut [0; 4])) {
                    self.selected_column = col;
                    self.queue_drop(col);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn queue_drop(&mut self, col: usize) {
        if self.session.is_over() {
            self.message = Some("Game over! Press 'r' to restart.".to_string());
            return;
        }
        self.pending_drop = Some(col);
        self.message = Some("Thinking...".to_string());
    }

    fn drop_piece(&mut self, col: usize) {
        match self.session.play_opponent(col) {
            Ok(_) => {
                self.message = self.session.outcome().map(|outcome| outcome.describe().to_string());
            }
            Err(err) => {
                self.message = Some(err.to_string());
            }
        }
    }

    fn engine_move(&mut self) -> Result<(), SessionError> {
        let at = self.session.play_engine().inspect_err(|err| error!("engine move failed: {err}"))?;
        self.message = Some(match self.session.outcome() {
            Some(outcome) => outcome.describe().to_string(),
            None => format!("Engine played {at}"),
        });
        Ok(())
    }

    /// Start over, from a random opening line when a book is loaded.
    fn new_game(&mut self) -> Result<(), SessionError> {
        let first = self.play.first_player();
        self.selected_column = 3;
        self.pending_drop = None;

        if let Some(book) = self.book.as_mut() {
            let line = book.draw(&mut self.rng);
            self.session
                .restart_from_opening(first, &line)
                .inspect_err(|err| error!("opening {line:?} cannot be replayed: {err}"))?;
            self.message = Some(format!("New game from a {}-move opening!", line.len()));
            return Ok(());
        }

        self.session.restart(first);
        self.message = Some("New game started!".to_string());
        Ok(())
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        super::game_view::render(
            frame,
            &self.session,
            self.selected_column,
            self.message.as_deref(),
            self.symbols,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Engine, EngineConfig};
    use crate::error::EngineError;
    use crate::game::Coord;
    use crossterm::event::KeyModifiers;
    use rand::SeedableRng;

    fn quick_app(book: Option<OpeningBook>) -> App {
        let engine = Engine::new(EngineConfig {
            thinking_time_secs: 0.01,
            table_buckets: 10_007,
            seed: Some(5),
            ..EngineConfig::default()
        });
        let play = PlayConfig::default();
        let session = GameSession::start(engine, play.first_player());
        App::new(session, play, book, StdRng::seed_from_u64(5))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    #[test]
    fn test_column_selection_is_clamped() {
        let mut app = quick_app(None);
        for _ in 0..10 {
            press(&mut app, KeyCode::Right);
        }
        assert_eq!(app.selected_column, COLS - 1);
        for _ in 0..10 {
            press(&mut app, KeyCode::Left);
        }
        assert_eq!(app.selected_column, 0);
    }

    #[test]
    fn test_letter_drops_and_engine_replies() {
        let mut app = quick_app(None);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.pending_drop, Some(4));

        assert!(app.tick().unwrap());
        assert_eq!(app.session.board().cell(Coord::new(5, 4)), crate::game::Cell::Opponent);
        assert!(app.tick().unwrap());
        assert_eq!(app.session.board().pieces(), 2);
        assert!(!app.tick().unwrap());
    }

    #[test]
    fn test_engine_error_ends_the_app() {
        let mut app = quick_app(None);
        press(&mut app, KeyCode::Char('s'));
        let full = crate::game::Board::from_rows([
            "EEOOEEO", "EEOOEEO", "OOEEOOE", "EEOOEEO", "OOEEOOE", "OOEEOOE",
        ])
        .unwrap();
        app.session.replace_board(full);

        assert!(matches!(
            app.tick(),
            Err(SessionError::Engine(EngineError::NoCandidateMove))
        ));
    }

    #[test]
    fn test_unplayable_opening_ends_the_app() {
        let book = OpeningBook::parse("(0,0) (1,0) (2,0) (3,0)\n").unwrap();
        let mut app = quick_app(Some(book));
        let result = app.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE));
        assert!(matches!(result, Err(SessionError::UnplayableOpening { index: 0, .. })));
    }

    #[test]
    fn test_toggle_first_player_restarts() {
        let mut app = quick_app(None);
        press(&mut app, KeyCode::Char('s'));
        assert!(app.play.engine_first);
        assert_eq!(app.session.to_move(), Side::Engine);
        assert_eq!(app.session.board().pieces(), 0);
    }

    #[test]
    fn test_restart_uses_opening_book() {
        let book = OpeningBook::parse("(5,3) (4,3) (5,2) (5,4)\n").unwrap();
        let mut app = quick_app(Some(book));
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.session.board().pieces(), 4);
        assert_eq!(app.session.to_move(), Side::Opponent);
    }

    #[test]
    fn test_quit() {
        let mut app = quick_app(None);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }
}
