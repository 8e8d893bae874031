use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use primo::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    logging,
    runtime::{EventLoop, QuizEvent, TerminalEvents},
    store::SqliteSessionStore,
    App, Control, Difficulty, Mode, QuizService,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;

/// prime or composite? a timed number quiz for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Decide whether each number is prime or composite. Time Attack ranks ten questions by points per second; Survival scores as many as you can answer before the clock runs out."
)]
pub struct Cli {
    /// name the records are kept under
    #[clap(short = 'u', long, default_value = "player")]
    player: String,

    /// start straight into this mode instead of the menu
    #[clap(short, long, value_enum)]
    mode: Option<Mode>,

    /// difficulty to select (early, mid, late)
    #[clap(short, long, value_enum, default_value_t = Difficulty::Early)]
    difficulty: Difficulty,

    /// JSON config file with question count, timings and number ranges
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// session database path
    #[clap(long)]
    db: Option<PathBuf>,

    /// seed the question generator for a repeatable run
    #[clap(long)]
    seed: Option<u64>,

    /// write logs here (filter with PRIMO_LOG)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_file = cli.log_file.clone().or_else(AppDirs::log_path);
    logging::init(log_file.as_deref())?;

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = config_store.load();
    config.validate()?;

    let db_path = cli
        .db
        .clone()
        .or_else(AppDirs::db_path)
        .unwrap_or_else(|| PathBuf::from("primo_sessions.db"));
    let store = SqliteSessionStore::open(&db_path)?;
    tracing::info!(db = %db_path.display(), player = %cli.player, "starting");

    let mut service = QuizService::new(config, store);
    if let Some(seed) = cli.seed {
        service = service.with_seed(seed);
    }
    let mut app = App::new(service, cli.player.clone())?;
    app.difficulty = cli.difficulty;

    let result = with_terminal(
        || Ok(enable_raw_mode()?),
        || run_tui(&mut app, cli.mode),
        restore_terminal,
    );

    if let Err(err) = &result {
        tracing::error!(%err, "quit on error");
    }
    result
}

/// Runs `body` between `enter` and `leave`. `leave` runs whenever `enter`
/// succeeded, and an error from `body` wins over one from `leave`.
fn with_terminal<T>(
    enter: impl FnOnce() -> Result<(), Box<dyn Error>>,
    body: impl FnOnce() -> Result<T, Box<dyn Error>>,
    leave: impl FnOnce() -> Result<(), Box<dyn Error>>,
) -> Result<T, Box<dyn Error>> {
    enter()?;
    let result = body();
    let restored = leave();
    let value = result?;
    restored?;
    Ok(value)
}

fn restore_terminal() -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;
    Ok(())
}

fn run_tui(app: &mut App<SqliteSessionStore>, mode: Option<Mode>) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size().unwrap_or_default();
    app.set_viewport(size.width, size.height);
    if let Some(mode) = mode {
        app.mode = mode;
        app.start()?;
    }

    start_tui(&mut terminal, app)
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<SqliteSessionStore>,
) -> Result<(), Box<dyn Error>> {
    let events = EventLoop::new(
        TerminalEvents::spawn(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match events.step() {
            QuizEvent::Tick => {
                if !app.is_animating() {
                    continue;
                }
                app.on_tick();
            }
            QuizEvent::Resize => {
                let size = terminal.size().unwrap_or_default();
                app.set_viewport(size.width, size.height);
            }
            QuizEvent::Key(key) => {
                if app.on_key(key)? == Control::Quit {
                    break;
                }
            }
            QuizEvent::Closed => {
                tracing::warn!("terminal input closed, quitting");
                break;
            }
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}
