use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;
use tracing::debug;

/// Prefix for environment overrides, e.g. `BINOPT_ENGINE__PAYOUT=0.85`.
pub const ENV_PREFIX: &str = "BINOPT_";

pub struct ConfigLoader;

impl ConfigLoader {
    fn base() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
    }

    /// Loads configuration by merging defaults, `config/Config.toml`,
    /// `config/Config.json` and `BINOPT_` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        let config: AppConfig = Self::base()
            .merge(Toml::file("config/Config.toml"))
            .merge(Json::file("config/Config.json"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to load configuration")?;

        debug!(journal = %config.journal.path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads configuration from an explicit TOML file, still honouring
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let config: AppConfig = Self::base()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}
