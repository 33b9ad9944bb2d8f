//! # livelist
//!
//! Demo CLI for livelist: a persisted list of events kept on screen by a
//! [`SyncController`](list_controller::SyncController).
//!
//! ## Commands
//!
//! - `add`: Add an event at the end of the list
//! - `delete`: Delete a row
//! - `move`: Move a row within its section
//! - `list`: Show the list
//! - `status`: Show list status
//!
//! ## Example
//!
//! ```bash
//! livelist add
//! livelist add
//! livelist move 0 1
//! livelist delete 0
//!
//! # Trace every surface primitive
//! livelist -v list
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod session;
mod surface;

use commands::{add, delete, list, move_row, status};
use config::Config;
use session::Session;

/// Demo CLI for livelist.
#[derive(Parser, Debug)]
#[command(name = "livelist")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory holding the store and optional livelist.toml
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: <data-dir>/livelist.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log controller and surface activity at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add an event at the end of the list
    Add,

    /// Delete a row
    Delete {
        /// Row to delete
        row: usize,

        /// Section containing the row
        #[arg(long, default_value = "0")]
        section: usize,
    },

    /// Move a row within its section
    Move {
        /// Current row
        from: usize,

        /// Destination row
        to: usize,

        /// Section containing the row
        #[arg(long, default_value = "0")]
        section: usize,
    },

    /// Show the list
    List,

    /// Show list status
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    let config = Config::resolve(cli.config.as_deref(), &data_dir)?;
    let session = Session::open(&data_dir, &config)?;

    match cli.command {
        Commands::Add => add::run(&session)?,
        Commands::Delete { row, section } => delete::run(&session, section, row)?,
        Commands::Move { from, to, section } => move_row::run(&session, section, from, to)?,
        Commands::List => list::run(&session)?,
        Commands::Status => status::run(&session)?,
    }

    print!("{}", session.render());
    Ok(())
}

/// Install the log subscriber. `RUST_LOG` wins unless `-v` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

/// Get the default data directory for livelist.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "livelist", "livelist")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_move_with_section() {
        let cli = Cli::parse_from(["livelist", "move", "0", "2", "--section", "1"]);
        match cli.command {
            Commands::Move { from, to, section } => {
                assert_eq!((from, to, section), (0, 2, 1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["livelist", "list", "-v", "--data-dir", "/tmp/x"]);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }
}
