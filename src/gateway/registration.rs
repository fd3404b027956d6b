//! Application command registration

use crate::error::BotError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use twilight_http::Client;
use twilight_model::application::command::Command;
use twilight_model::id::marker::{ApplicationMarker, GuildMarker};
use twilight_model::id::Id;

/// Registration RPCs of the platform
///
/// Both calls overwrite the full command set, so repeating one is harmless
/// to the platform; the runtime still issues each at most once per process.
#[async_trait]
pub trait CommandRegistrar: Send + Sync {
    /// Register commands for every guild (slow propagation)
    async fn register_globally(&self, commands: &[Command]) -> Result<(), BotError>;

    /// Register commands to a single guild (fast propagation)
    async fn register_to_guild(&self, guild_id: u64, commands: &[Command])
        -> Result<(), BotError>;
}

/// Registrar backed by the Twilight HTTP interaction client
pub struct HttpRegistrar {
    http: Arc<Client>,
    application_id: Id<ApplicationMarker>,
}

impl HttpRegistrar {
    pub fn new(http: Arc<Client>, application_id: Id<ApplicationMarker>) -> Self {
        Self {
            http,
            application_id,
        }
    }
}

#[async_trait]
impl CommandRegistrar for HttpRegistrar {
    async fn register_globally(&self, commands: &[Command]) -> Result<(), BotError> {
        self.http
            .interaction(self.application_id)
            .set_global_commands(commands)
            .await
            .map_err(|e| BotError::Registration {
                scope: "global".to_string(),
                source: Box::new(e),
            })?;

        info!(count = commands.len(), "Registered commands globally");
        Ok(())
    }

    async fn register_to_guild(
        &self,
        guild_id: u64,
        commands: &[Command],
    ) -> Result<(), BotError> {
        let scope = format!("guild:{guild_id}");
        let guild = Id::<GuildMarker>::new_checked(guild_id)
            .ok_or_else(|| BotError::Config(format!("invalid guild id {guild_id}")))?;

        self.http
            .interaction(self.application_id)
            .set_guild_commands(guild, commands)
            .await
            .map_err(|e| BotError::Registration {
                scope,
                source: Box::new(e),
            })?;

        info!(guild_id, count = commands.len(), "Registered commands to guild");
        Ok(())
    }
}
