//! `/ping`: liveness check

use super::{CommandHandler, ExecutionContext, HandlerResult};
use crate::services::Services;
use async_trait::async_trait;
use twilight_model::application::command::{Command, CommandType};
use twilight_util::builder::command::CommandBuilder;

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    fn name(&self) -> &str {
        "ping"
    }

    fn definition(&self) -> Command {
        CommandBuilder::new(self.name(), "Check that the bot is alive", CommandType::ChatInput)
            .build()
    }

    async fn execute(&self, ctx: &ExecutionContext, services: &Services) -> HandlerResult {
        let reply = format!("Pong! (shard {})", ctx.shard_id);
        services.responder.reply(&ctx.interaction, &reply).await?;
        Ok(())
    }
}
