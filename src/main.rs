use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use questrun::app::App;
use questrun::config::Config;
use questrun::launcher::{self, CONFIG_ENV};
use questrun::quest::{Program, QuestRunner};
use questrun::tui::{CHROME_HEIGHT, Renderer, handle_key};

/// Poll interval for quest output (milliseconds)
const POLL_INTERVAL_MS: u64 = 10;

#[derive(Parser, Debug)]
#[command(
    name = "questrun",
    author,
    version,
    about = "Run a quest and interact with it from a Lua console",
    long_about = None
)]
struct Args {
    /// Quest to run on startup
    quest_path: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum lines kept in the console log (0 for unlimited)
    #[arg(short = 'b', long)]
    max_buffer_lines: Option<usize>,

    /// Write application logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Log to a file if requested; the terminal belongs to the console
fn init_console_logging(level: &str, log_file: Option<&Path>) -> io::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

/// Launcher mode logs to stderr: stdout carries the quest output
fn init_launcher_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Initialize the terminal for TUI
fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to its original state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Run the application
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    if app.quest_path().is_some() {
        app.start_quest();
    }

    let mut events = EventStream::new();
    let mut poll_interval = tokio::time::interval(Duration::from_millis(POLL_INTERVAL_MS));

    loop {
        // Update visible lines based on terminal size
        let size = terminal.size()?;
        app.console_mut()
            .set_visible_lines(size.height.saturating_sub(CHROME_HEIGHT) as usize);

        terminal.draw(|frame| {
            Renderer::render(frame, app);
        })?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    handle_key(app, key);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => break,
            },
            _ = poll_interval.tick() => app.poll_runner(),
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn launcher_main(arguments: &[String]) -> ExitCode {
    let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_launcher_logging(&config.log_level);

    match launcher::run(&config, arguments) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn console_main(args: Args) -> questrun::Result<()> {
    let config = Config::load(args.config.as_deref())?;
    init_console_logging(&config.log_level, args.log_file.as_deref())?;
    info!("starting questrun v{}", env!("CARGO_PKG_VERSION"));

    let program = match Program::current_exe() {
        Ok(program) => Some(match &args.config {
            Some(path) => program.with_env(CONFIG_ENV, path.clone()),
            None => program,
        }),
        Err(e) => {
            warn!(error = %e, "cannot resolve the current executable");
            None
        }
    };
    let runner = QuestRunner::new(program, config.settings.clone());
    let max_buffer_lines = args.max_buffer_lines.unwrap_or(config.max_buffer_lines);
    let mut app = App::new(runner, args.quest_path, max_buffer_lines);

    let mut terminal = init_terminal()?;
    let result = run_app(&mut terminal, &mut app).await;
    restore_terminal(&mut terminal)?;

    app.shutdown().await;
    info!("questrun exiting");

    Ok(result?)
}

#[tokio::main]
async fn main() -> ExitCode {
    match launcher::launcher_arguments(std::env::args_os().skip(1)) {
        Some(Ok(arguments)) => return launcher_main(&arguments),
        Some(Err(e)) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
        None => {}
    }

    let args = Args::parse();
    match console_main(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
