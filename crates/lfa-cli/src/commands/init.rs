use anyhow::{Context, Result};
use std::path::PathBuf;

use lfa_core::config::{user_config_path, write_default_config};

/// Write a default configuration file.
///
/// Targets `~/lfa/lfa.yml` unless a path is given. Existing files are kept
/// unless `force` is set.
pub fn cmd_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => user_config_path().context("Could not determine home directory")?,
    };

    write_default_config(&path, force)?;

    println!("Wrote default configuration to {}", path.display());
    println!();
    println!("Edit it to set the confidence floor, report delimiter,");
    println!("output directory and training cadence.");

    Ok(())
}
