use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};

use connect_four_engine::ai::Engine;
use connect_four_engine::config::AppConfig;
use connect_four_engine::opening::OpeningBook;
use connect_four_engine::session::{GameSession, PlayConfig};
use connect_four_engine::ui::{text, App};

/// Play Connect Four against an alpha-beta search engine.
#[derive(Parser)]
#[command(name = "connect-four", about = "Play Connect Four against a search engine")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override thinking time per move, in seconds
    #[arg(long)]
    think: Option<f64>,

    /// Let the engine move first
    #[arg(long)]
    engine_first: bool,

    /// Opening book to start games from
    #[arg(long)]
    openings: Option<PathBuf>,

    /// Seed for tie-breaking and opening selection
    #[arg(long)]
    seed: Option<u64>,

    /// Play in plain text on stdin/stdout instead of the terminal UI
    #[arg(long)]
    text: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(secs) = cli.think {
        config.engine.thinking_time_secs = secs;
    }
    if cli.engine_first {
        config.play.engine_first = true;
    }
    if cli.openings.is_some() {
        config.play.openings = cli.openings.clone();
    }
    if cli.seed.is_some() {
        config.engine.seed = cli.seed;
    }
    config.validate().context("invalid settings")?;

    let mut book = match &config.play.openings {
        Some(path) => Some(
            OpeningBook::load(path).with_context(|| format!("loading openings from {}", path.display()))?,
        ),
        None => None,
    };
    let mut rng = match config.engine.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    info!(
        "thinking {:.2}s per move, {} buckets",
        config.engine.thinking_time_secs, config.engine.table_buckets
    );
    let engine = Engine::new(config.engine.clone());
    let first = config.play.first_player();
    let session = match book.as_mut() {
        Some(book) => {
            let line = book.draw(&mut rng);
            GameSession::start_from_opening(engine, first, &line)
                .with_context(|| format!("replaying opening {line:?}"))?
        }
        None => GameSession::start(engine, first),
    };

    if cli.text {
        run_text(session, &config.play, book, rng)
    } else {
        run_tui(session, config.play, book, rng)
    }
}

fn run_text(mut session: GameSession, play: &PlayConfig, mut book: Option<OpeningBook>, mut rng: StdRng) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    loop {
        let outcome = text::play(&mut session, play, &mut input, &mut output)?;
        if outcome.is_none() {
            return Ok(());
        }

        write!(output, "To play again, press 1 and enter: ")?;
        output.flush()?;
        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 || answer.trim() != "1" {
            return Ok(());
        }

        match book.as_mut() {
            Some(book) => {
                let line = book.draw(&mut rng);
                session
                    .restart_from_opening(play.first_player(), &line)
                    .with_context(|| format!("replaying opening {line:?}"))?;
            }
            None => session.restart(play.first_player()),
        }
    }
}

fn run_tui(session: GameSession, play: PlayConfig, book: Option<OpeningBook>, rng: StdRng) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, play, book, rng);
    let res = app.run(&mut terminal);

    // Restore terminal even on error
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    res.context("terminal UI failed")
}
