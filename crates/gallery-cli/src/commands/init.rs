//! Init command
//!
//! Create the data directory, seed catalog and default configuration.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use gallery_core::config::Config;
use gallery_storage::{Catalog, FileSystemStorage};
use std::fs;

use super::context::Paths;

/// Arguments for the init command
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing catalog and configuration
    #[arg(long)]
    pub force: bool,
}

/// Execute the init command
pub fn execute(paths: &Paths, args: InitArgs) -> Result<()> {
    let config_path = paths.config_path();
    let config = if config_path.exists() && !args.force {
        paths.load_config()?
    } else {
        Config::default()
    };
    let data_dir = paths.data_dir(&config);

    println!("Initializing gallery-comments in {}...", data_dir.display());

    if Catalog::exists_in(&data_dir) && !args.force {
        eprintln!(
            "{} Already initialized. Use --force to reseed the catalog.",
            "⚠".yellow()
        );
        return Ok(());
    }

    FileSystemStorage::new(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    println!("{} Created comments directory", "✓".green());

    let catalog = Catalog::seed_default(&data_dir).context("Failed to seed catalog")?;
    println!(
        "{} Seeded catalog with {} items and {} identities",
        "✓".green(),
        catalog.items().len(),
        catalog.identities().len()
    );

    if !config_path.exists() || args.force {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, config.to_toml_string()?)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("{} Wrote {}", "✓".green(), config_path.display());
    }

    println!("\n{}", "Next steps:".bold());
    println!(
        "  {}",
        "gallery-comments comment create --item 1 --guest-name <name> --text <text>".cyan()
    );

    Ok(())
}
