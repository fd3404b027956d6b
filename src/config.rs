//! Bot configuration module
//!
//! Handles loading configuration from `.env` and environment variables,
//! layered over defaults with the `config` crate. The result is immutable
//! and shared read-only for the life of the process.

use crate::error::BotError;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment};
use serde::de::DeserializeOwned;
use std::net::{IpAddr, SocketAddr};
use twilight_gateway::Intents;

/// Bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Discord bot token
    pub discord_token: String,

    /// Total number of shards run by this process
    pub total_shards: u64,

    /// Debug mode: commands are also registered to `debug_guild_id`
    /// and the stats reporter is never updated
    pub debug: bool,

    /// Guild that receives guild-scoped registration in debug mode
    pub debug_guild_id: Option<u64>,

    /// Whether to report the server count to top.gg
    pub use_topgg: bool,

    /// Bot client (application) id used by the stats reporter
    pub bot_client_id: Option<u64>,

    /// top.gg API token
    pub topgg_token: Option<String>,

    /// Request listener bind address
    pub http_addr: SocketAddr,

    /// Prometheus exporter port (exporter disabled when unset)
    pub metrics_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl BotConfig {
    /// Load configuration from `.env` and environment variables
    pub fn from_env() -> Result<Self, BotError> {
        dotenvy::dotenv().ok();

        let source = Config::builder()
            .add_source(
                Environment::default()
                    .try_parsing(true)
                    .ignore_empty(true),
            );

        let source = with_defaults(source)
            .and_then(|builder| builder.build())
            .map_err(|e| BotError::Config(e.to_string()))?;

        Self::from_source(&source)
    }

    /// Build configuration from an already layered source.
    ///
    /// Keys are the lower-cased environment variable names.
    pub fn from_source(source: &Config) -> Result<Self, BotError> {
        let discord_token = optional::<String>(source, "discord_token")?
            .or(optional::<String>(source, "discord_bot_token")?)
            .ok_or_else(|| {
                BotError::Config("DISCORD_TOKEN or DISCORD_BOT_TOKEN must be set".to_string())
            })?;

        let total_shards = required::<u64>(source, "total_shards")?;
        if total_shards == 0 {
            return Err(BotError::Config("TOTAL_SHARDS must be at least 1".to_string()));
        }

        let debug = required::<bool>(source, "debug_mode")?;
        let debug_guild_id = optional::<u64>(source, "debug_guild_id")?;
        if debug && debug_guild_id.unwrap_or(0) == 0 {
            return Err(BotError::Config(
                "DEBUG_GUILD_ID must be set to a non-zero id when DEBUG_MODE is enabled".to_string(),
            ));
        }

        let use_topgg = required::<bool>(source, "use_topgg")?;
        let bot_client_id = optional::<u64>(source, "bot_client_id")?;
        if use_topgg && bot_client_id.is_none() {
            return Err(BotError::Config(
                "BOT_CLIENT_ID must be set when USE_TOPGG is enabled".to_string(),
            ));
        }
        let topgg_token = optional::<String>(source, "topgg_token")?;

        let http_host: IpAddr = required::<String>(source, "http_host")?
            .parse()
            .map_err(|e| BotError::Config(format!("HTTP_HOST must be an IP address: {e}")))?;
        let http_port = required::<u16>(source, "http_port")?;

        let metrics_port = optional::<u16>(source, "metrics_port")?;
        let log_level = required::<String>(source, "log_level")?;

        Ok(Self {
            discord_token,
            total_shards,
            debug,
            debug_guild_id,
            use_topgg,
            bot_client_id,
            topgg_token,
            http_addr: SocketAddr::new(http_host, http_port),
            metrics_port,
            log_level,
        })
    }

    /// Guild that receives guild-scoped registration, only in debug mode
    pub fn registration_guild(&self) -> Option<u64> {
        self.debug.then_some(self.debug_guild_id).flatten()
    }

    /// Get configured Discord intents
    ///
    /// Guild create/delete are all the runtime needs; interactions are
    /// delivered regardless of intents.
    pub fn intents() -> Intents {
        Intents::GUILDS
    }
}

/// Default values for every optional setting.
pub fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("total_shards", 1)?
        .set_default("debug_mode", false)?
        .set_default("use_topgg", false)?
        .set_default("http_host", "127.0.0.1")?
        .set_default("http_port", 8080)?
        .set_default("log_level", "info")
}

fn required<T: DeserializeOwned>(source: &Config, key: &str) -> Result<T, BotError> {
    optional(source, key)?
        .ok_or_else(|| BotError::Config(format!("{} must be set", key.to_uppercase())))
}

fn optional<T: DeserializeOwned>(source: &Config, key: &str) -> Result<Option<T>, BotError> {
    match source.get::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(BotError::Config(format!(
            "{} is invalid: {e}",
            key.to_uppercase()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(overrides: &[(&str, &str)]) -> Result<BotConfig, BotError> {
        let mut builder = with_defaults(Config::builder()).unwrap();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value).unwrap();
        }
        BotConfig::from_source(&builder.build().unwrap())
    }

    #[test]
    fn test_intents_are_minimal() {
        let intents = BotConfig::intents();

        assert!(intents.contains(Intents::GUILDS));
        assert!(!intents.contains(Intents::GUILD_MEMBERS));
        assert!(!intents.contains(Intents::MESSAGE_CONTENT));
    }

    #[test]
    fn test_default_values() {
        let config = load(&[("discord_token", "token")]).unwrap();

        assert_eq!(config.total_shards, 1);
        assert!(!config.debug);
        assert!(!config.use_topgg);
        assert_eq!(config.http_addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.registration_guild(), None);
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn test_bot_token_alias() {
        let config = load(&[("discord_bot_token", "alias")]).unwrap();
        assert_eq!(config.discord_token, "alias");
    }

    #[test]
    fn test_debug_requires_guild() {
        let err = load(&[("discord_token", "t"), ("debug_mode", "true")]).unwrap_err();
        assert!(err.to_string().contains("DEBUG_GUILD_ID"));

        let config = load(&[
            ("discord_token", "t"),
            ("debug_mode", "true"),
            ("debug_guild_id", "1234"),
        ])
        .unwrap();
        assert_eq!(config.registration_guild(), Some(1234));
    }

    #[test]
    fn test_guild_ignored_outside_debug() {
        let config = load(&[("discord_token", "t"), ("debug_guild_id", "1234")]).unwrap();
        assert_eq!(config.registration_guild(), None);
    }

    #[test]
    fn test_topgg_requires_client_id() {
        let err = load(&[("discord_token", "t"), ("use_topgg", "true")]).unwrap_err();
        assert!(err.to_string().contains("BOT_CLIENT_ID"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(load(&[("discord_token", "t"), ("total_shards", "zero")]).is_err());
        assert!(load(&[("discord_token", "t"), ("total_shards", "0")]).is_err());
        assert!(load(&[("discord_token", "t"), ("http_host", "localhost")]).is_err());
    }
}
