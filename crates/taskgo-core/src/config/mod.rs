//! Application configuration schemas.
//!
//! Configuration is read once at startup from optional TOML files and the
//! environment via the `config` crate. There is no hot reload.

pub mod app;
pub mod logging;
pub mod rate_limit;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::logging::LoggingConfig;
pub use self::rate_limit::RateLimitConfig;

use crate::result::AppResult;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-client admission control settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration for the given environment name.
    ///
    /// Sources, lowest precedence first: `config/default.toml`,
    /// `config/{env}.toml`, `TASKGO__*` environment variables, and finally
    /// the `RATE_LIMIT_RPS` / `RATE_LIMIT_BURST` overrides. All files are
    /// optional.
    pub fn load(env: &str) -> AppResult<Self> {
        let built = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TASKGO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = built.try_deserialize()?;
        config.rate_limit.apply_env_overrides();
        config.rate_limit.validate()?;

        Ok(config)
    }
}
