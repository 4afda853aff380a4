use anyhow::Result;
use camsort::config::{NamingScheme, Settings};
use camsort::{Command, RunOptions, logging, run_command};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "camsort", version)]
#[command(about = "Sort camera media by type and capture time, and prune orphaned raw files")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct CommonArgs {
    /// Report what would happen without touching any file
    #[arg(long, global = true)]
    dry_run: bool,

    /// Log every file as it is handled
    #[arg(long, global = true)]
    debug: bool,

    /// Print plans and reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Move processed images, raw images and videos into numbered directories
    Reorganize {
        /// Camera card or dump directory, searched recursively
        #[arg(long)]
        src: PathBuf,

        /// Root of the sorted backup
        #[arg(long)]
        dst: PathBuf,

        /// Add to category directories left by an earlier run
        #[arg(long)]
        merge: bool,

        /// Keep camera file names instead of renumbering
        #[arg(long)]
        keep_names: bool,
    },
    /// Delete raw files that have no processed image of the same name
    PruneOrphans {
        /// Directory holding the processed images
        #[arg(long)]
        processed_dir: PathBuf,

        /// Directory holding the raw images
        #[arg(long)]
        raw_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let subscriber = logging::subscriber(cli.common.debug);
    tracing::subscriber::with_default(subscriber, || match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    })
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.common.config.as_deref())?;

    let command = match cli.command {
        CliCommand::Reorganize {
            src,
            dst,
            merge,
            keep_names,
        } => {
            if merge {
                settings.relocation.allow_existing_destination = true;
            }
            if keep_names {
                settings.relocation.naming = NamingScheme::Original;
            }
            Command::Reorganize {
                source: src,
                destination: dst,
            }
        }
        CliCommand::PruneOrphans {
            processed_dir,
            raw_dir,
        } => Command::PruneOrphans {
            processed_dir,
            raw_dir,
        },
    };

    let options = RunOptions {
        dry_run: cli.common.dry_run,
        json: cli.common.json,
        progress: !cli.common.debug,
    };
    run_command(&command, &settings, options)
}
