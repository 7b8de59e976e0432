//! `parqtodo` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging and bring the task store up.
//! - Run one subcommand, or the interactive shell when none is given.
//!
//! # Invariants
//! - All task semantics live in `parqtodo_core`; this crate only maps
//!   input to actions and actions to terminal output.

mod action;
mod args;
mod render;
mod shell;

use action::{Action, Outcome, HELP};
use args::Cli;
use clap::Parser;
use log::info;
use parqtodo_core::{
    init_logging, BridgeError, CacheError, ConfigError, FileSnapshotCache, LoggingError,
    StoreHandle, TaskListView,
};
use render::{format_rows, paint_view, Palette};
use rustyline::error::ReadlineError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

const HISTORY_FILE: &str = ".parqtodo_history";

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    Cache(CacheError),
    Bridge(BridgeError),
    Readline(ReadlineError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Cache(err) => write!(f, "{err}"),
            Self::Bridge(err) => write!(f, "{err}"),
            Self::Readline(err) => write!(f, "line editor failed: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Cache(err) => Some(err),
            Self::Bridge(err) => Some(err),
            Self::Readline(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<CacheError> for CliError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

impl From<BridgeError> for CliError {
    fn from(value: BridgeError) -> Self {
        Self::Bridge(value)
    }
}

impl From<ReadlineError> for CliError {
    fn from(value: ReadlineError) -> Self {
        Self::Readline(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("parqtodo: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.resolve_config(|name| std::env::var(name).ok())?;
    let log_dir = std::path::absolute(&config.log_dir)
        .map_err(|err| LoggingError::InvalidDir(err.to_string()))?;
    init_logging(&config.log_level, &log_dir)?;
    info!(
        "event=cli_start module=cli status=ok cache_dir={}",
        config.cache_dir.display()
    );

    let cache = Arc::new(FileSnapshotCache::open(&config.cache_dir)?);
    let handle = StoreHandle::new();
    handle.start(config.bridge.clone(), cache)?;

    let palette = if std::io::stdout().is_terminal() {
        Palette::for_theme(Default::default())
    } else {
        Palette::plain()
    };
    let mut view = TaskListView::new();
    let bridge = match handle.wait_ready() {
        Ok(bridge) => bridge,
        Err(err) => {
            view.mark_unavailable(err.to_string());
            eprintln!("{}", paint_view(&view, &palette));
            return Err(err.into());
        }
    };
    view.load(&*bridge)?;

    let action = match cli.command.and_then(Action::from_command) {
        Some(action) => action,
        None => return shell::run(&mut view, &bridge, &config.cache_dir.join(HISTORY_FILE)),
    };
    match action.execute(&mut view, &bridge)? {
        Outcome::View => println!("{}", paint_view(&view, &palette)),
        Outcome::Cleared(removed) => {
            println!("removed {removed} tasks");
            println!("{}", paint_view(&view, &palette));
        }
        Outcome::Json(body) => println!("{body}"),
        Outcome::Rows(rows) => println!("{}", format_rows(&rows)),
        Outcome::Help => println!("{HELP}"),
        Outcome::Theme(_) | Outcome::Quit => {}
    }
    Ok(())
}
