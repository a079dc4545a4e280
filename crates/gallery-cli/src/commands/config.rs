//! Config command
//!
//! Inspect gallery-comments configuration.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::context::Paths;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show effective configuration
    Show {
        /// Show as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the config file location
    Path,
}

/// Execute the config command
pub fn execute(paths: &Paths, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => show_config(paths, json),
        ConfigCommand::Path => {
            println!("{}", paths.config_path().display());
            Ok(())
        }
    }
}

fn show_config(paths: &Paths, as_json: bool) -> Result<()> {
    let config = paths.load_config()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let config_path = paths.config_path();
    println!("{}", "Configuration:".bold().underline());
    if config_path.exists() {
        println!("{}", config_path.display().to_string().dimmed());
    } else {
        println!("{}", "(defaults, no config file)".dimmed());
    }
    println!("data dir: {}", paths.data_dir(&config).display());
    println!();
    println!("{}", config.to_toml_string()?);

    Ok(())
}
