//! CLI subcommand implementations.

pub mod dump;
pub mod formats;
pub mod play;

use anyhow::Context;
use caudal_config::Config;
use std::path::PathBuf;

/// Load the configuration tree from `--config`, or fall back to an empty
/// tree so literal names still resolve.
pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(Config::empty()),
    }
}
