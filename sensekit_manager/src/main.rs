use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use sensekit_manager::commands;

#[derive(Parser)]
#[command(name = "sensekit")]
#[command(about = "SenseKit - check init strings and device files")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an init string and list the resources it describes
    Check {
        /// Init string, e.g. "gpio,25;i2c,0,0x3C"
        init: String,
        /// Print JSON instead of a table
        #[arg(long = "json")]
        json: bool,
    },

    /// Validate a devices file
    Config {
        /// Devices file (optional, searches standard locations)
        path: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long = "json")]
        json: bool,
    },

    /// List resource kinds and their parameters
    Kinds,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run_command(cli.command) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Check { init, json } => commands::check::run_check(&init, json),
        Commands::Config { path, json } => commands::config::run_config(path, json),
        Commands::Kinds => {
            commands::kinds::run_kinds();
            Ok(())
        }
    }
}
