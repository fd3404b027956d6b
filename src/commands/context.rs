//! Per-interaction execution context

use crate::events;
use twilight_model::application::interaction::Interaction;
use uuid::Uuid;

/// Everything a handler knows about the interaction it is running for.
///
/// Created by the router for a single dispatch and dropped when the handler
/// returns.
#[derive(Debug)]
pub struct ExecutionContext {
    /// Correlation id carried on every log line of this dispatch
    pub dispatch_id: Uuid,
    /// Shard the interaction arrived on
    pub shard_id: u64,
    /// The interaction as the platform sent it
    pub interaction: Interaction,
}

impl ExecutionContext {
    pub fn new(shard_id: u64, interaction: Interaction) -> Self {
        Self {
            dispatch_id: Uuid::new_v4(),
            shard_id,
            interaction,
        }
    }

    /// Top-level command name, if the interaction is a command
    pub fn command_name(&self) -> Option<&str> {
        events::command_data(&self.interaction).map(|data| data.name.as_str())
    }

    /// Subcommand path below the top-level name
    pub fn subcommand(&self) -> Option<String> {
        events::subcommand(&self.interaction)
    }

    pub fn command_path(&self) -> Option<String> {
        events::command_path(&self.interaction)
    }
}
