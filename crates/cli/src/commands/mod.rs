//! CLI commands for the sector allocation diagnostic.

pub mod baselines;
pub mod history;
pub mod run_daily;

pub use baselines::{run_baselines, BaselinesArgs};
pub use history::{run_history, HistoryArgs};
pub use run_daily::{run_run_daily, RunDailyArgs};

use anyhow::Result;
use clap::Args;
use sector_alloc_core::{AppConfig, ConfigLoader};
use std::path::PathBuf;

/// Configuration source shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Explicit TOML config file (replaces config/Config.toml)
    #[arg(short, long, env = "SECTOR_ALLOC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile layered over config/Config.toml (reads config/Config.{profile}.toml)
    #[arg(long)]
    pub profile: Option<String>,
}

impl ConfigArgs {
    /// Loads and validates the configuration.
    ///
    /// # Errors
    /// Returns an error if a config file cannot be parsed or fails validation.
    pub fn load(&self) -> Result<AppConfig> {
        match (&self.config, &self.profile) {
            (Some(path), _) => ConfigLoader::load_from(path),
            (None, Some(profile)) => ConfigLoader::load_with_profile(profile),
            (None, None) => ConfigLoader::load(),
        }
    }
}
