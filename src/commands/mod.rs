//! Command handler modules
//!
//! Every module the bot ships is listed in [`register_all`]; there is no
//! runtime discovery.

mod context;
mod ping;

pub use context::ExecutionContext;
pub use ping::Ping;

use crate::error::{BotError, BoxError};
use crate::router::CommandRouter;
use crate::services::Services;
use async_trait::async_trait;
use std::sync::Arc;
use twilight_model::application::command::Command;

/// Result of one handler execution
pub type HandlerResult = Result<(), BoxError>;

/// A slash command implementation
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Top-level command name the router dispatches on
    fn name(&self) -> &str;

    /// Definition registered with the platform
    fn definition(&self) -> Command;

    /// Run the command. Subcommands are read from `ctx.interaction`.
    async fn execute(&self, ctx: &ExecutionContext, services: &Services) -> HandlerResult;
}

/// Register every built-in command module with the router
pub fn register_all(router: &mut CommandRouter) -> Result<(), BotError> {
    router.register(Arc::new(Ping))?;
    Ok(())
}
