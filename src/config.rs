//! Settings layered from built-in defaults, an optional `config.toml` in the
//! data directory, and `LIBRARY_DESK__*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db::{self, DB_FILE_NAME};
use crate::error::LibraryResult;
use crate::models::FinePolicy;

pub const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "LIBRARY_DESK";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub seed_sample_data: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub fines: FinePolicy,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from the default data directory (`~/.library-desk`) and the
    /// environment.
    pub fn load() -> LibraryResult<Self> {
        Self::load_from(&db::data_dir()?)
    }

    /// Load with `data_dir` as the home of the database, logs, and
    /// `config.toml`.
    pub fn load_from(data_dir: &Path) -> LibraryResult<Self> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        Self::build(data_dir, Some(environment))
    }

    fn build(data_dir: &Path, environment: Option<Environment>) -> LibraryResult<Self> {
        let defaults = FinePolicy::default();
        let mut builder = Config::builder()
            .set_default(
                "database.path",
                data_dir.join(DB_FILE_NAME).to_string_lossy().into_owned(),
            )?
            .set_default("database.seed_sample_data", true)?
            .set_default("fines.daily_rate", defaults.daily_rate.to_string())?
            .set_default("fines.cap", defaults.cap.to_string())?
            .set_default("logging.level", "info")?
            .set_default(
                "logging.directory",
                data_dir.join("logs").to_string_lossy().into_owned(),
            )?
            .add_source(File::from(data_dir.join(CONFIG_FILE_NAME)).required(false));

        if let Some(environment) = environment {
            builder = builder.add_source(environment);
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fines.daily_rate < Decimal::ZERO {
            return Err(ConfigError::Message(
                "fines.daily_rate cannot be negative".to_string(),
            ));
        }
        if self.fines.cap < Decimal::ZERO {
            return Err(ConfigError::Message(
                "fines.cap cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::error::LibraryError;

    #[test]
    fn defaults_live_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::build(dir.path(), None).unwrap();

        assert_eq!(config.database.path, dir.path().join("library.sqlite"));
        assert!(config.database.seed_sample_data);
        assert_eq!(config.fines, FinePolicy::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.directory, dir.path().join("logs"));
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[fines]\ndaily_rate = \"0.25\"\ncap = \"5.00\"\n\n[database]\nseed_sample_data = false\n",
        )
        .unwrap();

        let config = AppConfig::build(dir.path(), None).unwrap();
        assert_eq!(config.fines.daily_rate, Decimal::new(25, 2));
        assert_eq!(config.fines.cap, Decimal::new(500, 2));
        assert!(!config.database.seed_sample_data);
    }

    #[test]
    fn negative_cap_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[fines]\ncap = \"-1\"\n").unwrap();

        let err = AppConfig::build(dir.path(), None).unwrap_err();
        assert!(matches!(err, LibraryError::Config(_)), "{err:?}");
    }
}
