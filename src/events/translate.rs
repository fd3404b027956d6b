//! Gateway event translation
//!
//! Converts Twilight events into [`BotEvent`]s. Only the four event kinds the
//! runtime subscribes to are translated; everything else is dropped here.

use twilight_model::application::interaction::application_command::{
    CommandData, CommandDataOption, CommandOptionValue,
};
use twilight_model::application::interaction::{Interaction, InteractionData, InteractionType};
use twilight_model::gateway::event::Event;

/// Typed runtime event
#[derive(Debug, Clone)]
pub enum BotEvent {
    /// Shard finished its handshake; carries the guilds it will serve
    ShardReady { shard_id: u64, guild_ids: Vec<u64> },
    /// Guild created on a shard. May be a guild becoming available after
    /// READY rather than a real join; `ShardState` tells the two apart.
    GuildJoined { shard_id: u64, guild_id: u64 },
    /// Guild removed from a shard (outages are filtered out before this)
    GuildLeft { shard_id: u64, guild_id: u64 },
    /// User-triggered interaction
    InteractionReceived(Box<InteractionEvent>),
}

impl BotEvent {
    /// Shard the event arrived on
    pub fn shard_id(&self) -> u64 {
        match self {
            Self::ShardReady { shard_id, .. }
            | Self::GuildJoined { shard_id, .. }
            | Self::GuildLeft { shard_id, .. } => *shard_id,
            Self::InteractionReceived(interaction) => interaction.shard_id,
        }
    }

    /// Static name used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ShardReady { .. } => "shard_ready",
            Self::GuildJoined { .. } => "guild_joined",
            Self::GuildLeft { .. } => "guild_left",
            Self::InteractionReceived(_) => "interaction_received",
        }
    }
}

/// Interaction handed to the command router, untouched
#[derive(Debug, Clone)]
pub struct InteractionEvent {
    pub shard_id: u64,
    pub interaction: Interaction,
}

impl InteractionEvent {
    pub fn new(shard_id: u64, interaction: Interaction) -> Self {
        Self {
            shard_id,
            interaction,
        }
    }

    pub fn id(&self) -> u64 {
        self.interaction.id.get()
    }

    /// Top-level command name; `None` for non-command interactions
    pub fn command_name(&self) -> Option<&str> {
        command_data(&self.interaction).map(|data| data.name.as_str())
    }

    /// Full command path, e.g. `"uno start"`
    pub fn command_path(&self) -> Option<String> {
        command_path(&self.interaction)
    }
}

/// Slash-command data of an interaction.
///
/// Autocomplete carries the same data shape but is not a command invocation.
pub fn command_data(interaction: &Interaction) -> Option<&CommandData> {
    match (&interaction.kind, &interaction.data) {
        (InteractionType::ApplicationCommand, Some(InteractionData::ApplicationCommand(data))) => {
            Some(data)
        }
        _ => None,
    }
}

/// Subcommand path below the top-level name ("group sub" or "sub")
pub fn subcommand(interaction: &Interaction) -> Option<String> {
    subcommand_path(&command_data(interaction)?.options)
}

/// Top-level name followed by the subcommand path
pub fn command_path(interaction: &Interaction) -> Option<String> {
    let name = &command_data(interaction)?.name;
    Some(match subcommand(interaction) {
        Some(sub) => format!("{name} {sub}"),
        None => name.clone(),
    })
}

/// Translate a Twilight event to a [`BotEvent`]
///
/// Returns None for events the runtime doesn't subscribe to (e.g. heartbeats)
/// and for guild deletions caused by an outage.
pub fn translate_event(event: Event, shard_id: u64) -> Option<BotEvent> {
    match event {
        Event::Ready(ready) => Some(BotEvent::ShardReady {
            shard_id,
            guild_ids: ready.guilds.iter().map(|guild| guild.id.get()).collect(),
        }),

        Event::GuildCreate(guild) => Some(BotEvent::GuildJoined {
            shard_id,
            guild_id: guild.id().get(),
        }),

        // unavailable == Some(true) is an outage, the bot is still a member
        Event::GuildDelete(guild) if guild.unavailable != Some(true) => {
            Some(BotEvent::GuildLeft {
                shard_id,
                guild_id: guild.id.get(),
            })
        }

        Event::InteractionCreate(interaction) => Some(BotEvent::InteractionReceived(Box::new(
            InteractionEvent::new(shard_id, interaction.0),
        ))),

        _ => None,
    }
}

/// Walk nested subcommand groups down to the invoked subcommand
fn subcommand_path(options: &[CommandDataOption]) -> Option<String> {
    let first = options.first()?;
    match &first.value {
        CommandOptionValue::SubCommand(_) => Some(first.name.clone()),
        CommandOptionValue::SubCommandGroup(inner) => Some(match subcommand_path(inner) {
            Some(sub) => format!("{} {sub}", first.name),
            None => first.name.clone(),
        }),
        _ => None,
    }
}

/// Slash-command interaction as the gateway delivers it, for tests
#[cfg(test)]
pub(crate) fn command_interaction(
    id: u64,
    name: &str,
    options: serde_json::Value,
) -> Interaction {
    serde_json::from_value(serde_json::json!({
        "id": id.to_string(),
        "application_id": "200",
        "type": 2,
        "token": format!("token-{id}"),
        "guild_id": "1",
        "locale": "en-US",
        "authorizing_integration_owners": {},
        "data": {
            "id": "300",
            "name": name,
            "type": 1,
            "options": options,
        },
    }))
    .expect("valid interaction payload")
}
