//! swapdb CLI
//!
//! Maintenance tools for databases opened through swapdb. The backend is
//! resolved from the `SWAPDB_POSTGRES*` environment variables exactly as an
//! application would resolve it.
//!
//! # Commands
//!
//! - `inspect` - Show the resolved backend and its tables
//! - `vacuum` - Reclaim unused space

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// swapdb command-line database tools.
#[derive(Parser)]
#[command(name = "swapdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the embedded database file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved backend and its tables
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Reclaim unused space
    Vacuum,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Database path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Vacuum => {
            let path = cli.path.ok_or("Database path required for vacuum")?;
            commands::vacuum::run(&path)?;
        }
        Commands::Version => {
            println!("swapdb CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("swapdb Core v{}", swapdb_core::VERSION);
        }
    }

    Ok(())
}
