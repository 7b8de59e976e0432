//! Command-line surface.
//!
//! Flags override the matching `PARQTODO_*` environment variables; anything
//! left unset falls back to the environment and then to built-in defaults.

use clap::{Parser, Subcommand};
use parqtodo_core::config::{CACHE_DIR_ENV, ENGINE_BUNDLE_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
use parqtodo_core::{AppConfig, ConfigError};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "parqtodo", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the snapshot cache
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory for rolling log files
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Engine bundle, worker|inline
    #[arg(long, global = true)]
    pub bundle: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print every task
    List {
        /// Emit JSON instead of the rendered list
        #[arg(long, action)]
        json: bool,
    },
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Replace the title of a task
    Edit {
        id: i64,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Delete a task
    Delete { id: i64 },
    /// Flip the completed flag of a task
    Toggle { id: i64 },
    /// Delete every task
    Clear,
    /// Run a read-only SQL query against the engine
    Sql { query: String },
    /// Interactive shell (default)
    Shell,
}

impl Cli {
    /// Resolves configuration with flags layered over `env`.
    pub fn resolve_config(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|name| self.flag_value(name).or_else(|| env(name)))
    }

    fn flag_value(&self, var: &str) -> Option<String> {
        match var {
            CACHE_DIR_ENV => self.cache_dir.as_ref().map(|dir| dir.display().to_string()),
            LOG_DIR_ENV => self.log_dir.as_ref().map(|dir| dir.display().to_string()),
            LOG_LEVEL_ENV => self.log_level.clone(),
            ENGINE_BUNDLE_ENV => self.bundle.clone(),
            _ => None,
        }
    }
}
