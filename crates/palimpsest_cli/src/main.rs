//! PALIMPSEST CLI
//!
//! Inspect, replay, heal and slice recorded edit histories.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod commands;
mod config;
mod load;
mod progress;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use commands::{At, SliceArgs};
use config::Config;
use palimpsest_core::Timestamp;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "palimpsest")]
#[command(about = "PALIMPSEST - replay and provenance for recorded edit histories", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./palimpsest.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Point of a file's history
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Position {
    /// Record index
    #[arg(long)]
    index: Option<usize>,
    /// Time in milliseconds since the Unix epoch
    #[arg(long)]
    time: Option<u64>,
}

impl Position {
    fn at(&self) -> Result<At> {
        match (self.index, self.time) {
            (Some(index), _) => Ok(At::Index(index)),
            (None, Some(time)) => Ok(At::Time(Timestamp::from_millis(time))),
            (None, None) => Err(eyre!("either --index or --time is required")),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a log
    Inspect {
        /// Path to log file
        #[arg(short, long)]
        log: PathBuf,
    },
    /// Print a file's content at a point of its history
    Restore {
        /// Path to log file
        #[arg(short, long)]
        log: PathBuf,
        #[command(flatten)]
        position: Position,
        /// Replay incrementally from the content at this index
        #[arg(long)]
        from: Option<usize>,
    },
    /// Print the record index visible at a time
    Find {
        /// Path to log file
        #[arg(short, long)]
        log: PathBuf,
        /// Time in milliseconds since the Unix epoch
        #[arg(long)]
        time: u64,
    },
    /// Bridge close/reopen gaps with synthetic edits
    Heal {
        /// Path to log file
        #[arg(short, long)]
        log: PathBuf,
        /// Where to write the healed log
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Build a project's dependency graph
    Graph {
        /// Directory of log files
        #[arg(short, long)]
        project: PathBuf,
    },
    /// Slice a project's dependency graph from a snippet
    Slice {
        /// Directory of log files
        #[arg(short, long)]
        project: PathBuf,
        /// File the snippet is read from
        #[arg(short, long)]
        file: String,
        /// First char of the snippet
        #[arg(long)]
        start: usize,
        /// End of the snippet, exclusive
        #[arg(long)]
        end: usize,
        #[command(flatten)]
        position: Position,
        /// Follow dependents instead of dependencies
        #[arg(long)]
        forward: bool,
    },
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| eyre!("failed to initialize tracing subscriber: {e}"))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Inspect { log } => commands::inspect(&log, &config, &mut out),
        Commands::Restore {
            log,
            position,
            from,
        } => commands::restore(&log, position.at()?, from, &config, &mut out),
        Commands::Find { log, time } => {
            commands::find(&log, Timestamp::from_millis(time), &config, &mut out)
        }
        Commands::Heal { log, out: path } => commands::heal_log(&log, &path, &config, &mut out),
        Commands::Graph { project } => {
            let mut progress = commands::progress_for(cli.quiet);
            progress.cancel_on_interrupt()?;
            commands::graph(&project, &config, &mut progress, &mut out)
        }
        Commands::Slice {
            project,
            file,
            start,
            end,
            position,
            forward,
        } => {
            let args = SliceArgs {
                project_dir: &project,
                file: &file,
                start,
                end,
                at: position.at()?,
                forward,
            };
            let mut progress = commands::progress_for(cli.quiet);
            progress.cancel_on_interrupt()?;
            commands::slice(&args, &config, &mut progress, &mut out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_restore_requires_one_position() {
        assert!(Cli::try_parse_from(["palimpsest", "restore", "--log", "f.jsonl"]).is_err());
        assert!(
            Cli::try_parse_from([
                "palimpsest", "restore", "--log", "f.jsonl", "--index", "1", "--time", "2"
            ])
            .is_err()
        );

        let cli = Cli::try_parse_from(["palimpsest", "restore", "--log", "f.jsonl", "--time", "7"])
            .unwrap();
        match cli.command {
            Commands::Restore { position, .. } => {
                assert_eq!(position.at().unwrap(), At::Time(Timestamp::from_millis(7)));
            }
            _ => panic!("expected restore"),
        }
    }

    #[test]
    fn test_slice_arguments() {
        let cli = Cli::try_parse_from([
            "palimpsest", "--quiet", "slice", "--project", "logs", "--file", "a.rs", "--start", "0",
            "--end", "4", "--index", "3", "--forward",
        ])
        .unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Slice {
                file,
                start,
                end,
                position,
                forward,
                ..
            } => {
                assert_eq!(file, "a.rs");
                assert_eq!((start, end), (0, 4));
                assert_eq!(position.at().unwrap(), At::Index(3));
                assert!(forward);
            }
            _ => panic!("expected slice"),
        }
    }
}
