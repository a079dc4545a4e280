//! CLI commands module
//!
//! This module contains all CLI command implementations.

pub mod comment;
pub mod config;
pub mod context;
pub mod init;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gallery-comments - comments on photo gallery items
#[derive(Debug, Parser)]
#[command(name = "gallery-comments")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Data directory (default: platform data directory)
    #[arg(long, global = true, env = "GALLERY_COMMENTS_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file path (default: <data-dir>/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the data directory, seed catalog and config file
    Init(init::InitArgs),

    /// Create, moderate and inspect comments
    #[command(subcommand)]
    Comment(comment::CommentCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

/// Run the CLI application
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let paths = context::Paths::resolve(cli.data_dir, cli.config);

    match cli.command {
        Commands::Init(args) => init::execute(&paths, args),
        Commands::Comment(cmd) => comment::execute(&paths, cmd),
        Commands::Config(cmd) => config::execute(&paths, cmd),
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
