use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Prefix for environment overrides, e.g. `SECTOR_ALLOC_NORMALIZATION__WINDOW=42`.
pub const ENV_PREFIX: &str = "SECTOR_ALLOC_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by merging defaults, TOML, environment variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load() -> Result<AppConfig> {
        Self::finish(
            Self::base()
                .merge(Toml::file("config/Config.toml"))
                .merge(Env::prefixed(ENV_PREFIX).split("__"))
                .join(Json::file("config/Config.json")),
        )
    }

    /// Loads configuration with a specific profile layered over the base TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        Self::finish(
            Self::base()
                .merge(Toml::file("config/Config.toml"))
                .merge(Toml::file(format!("config/Config.{profile}.toml")))
                .merge(Env::prefixed(ENV_PREFIX).split("__"))
                .join(Json::file("config/Config.json")),
        )
    }

    /// Loads configuration from an explicit TOML file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load_from(path: &Path) -> Result<AppConfig> {
        Self::finish(
            Self::base()
                .merge(Toml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }

    fn finish(figment: Figment) -> Result<AppConfig> {
        let config: AppConfig = figment
            .extract()
            .context("Failed to extract configuration")?;
        config.validate()?;
        tracing::debug!(
            entities = config.universe.entities.len(),
            window = config.normalization.window,
            min_observations = config.normalization.min_observations,
            "Loaded configuration"
        );
        Ok(config)
    }
}
