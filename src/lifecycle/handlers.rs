//! Event subscriptions
//!
//! The table of what runs for each [`BotEvent`]. Built once at startup and
//! never changed afterwards.

use crate::error::BotError;
use crate::events::{BotEvent, InteractionEvent};
use crate::gateway::CommandRegistrar;
use crate::metrics;
use crate::router::CommandRouter;
use crate::status::StatusAggregator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use twilight_model::application::command::Command;

/// Command registration, performed at most once per process.
///
/// The first shard-ready claims it. A failed attempt releases the claim so
/// a later shard-ready retries; a scope that already succeeded is not
/// registered again.
pub struct CommandRegistration {
    registrar: Arc<dyn CommandRegistrar>,
    commands: Vec<Command>,
    debug_guild: Option<u64>,
    claimed: AtomicBool,
    global_done: AtomicBool,
    guild_done: AtomicBool,
}

impl CommandRegistration {
    /// `debug_guild` additionally registers the commands to that guild
    pub fn new(
        registrar: Arc<dyn CommandRegistrar>,
        commands: Vec<Command>,
        debug_guild: Option<u64>,
    ) -> Self {
        Self {
            registrar,
            commands,
            debug_guild,
            claimed: AtomicBool::new(false),
            global_done: AtomicBool::new(false),
            guild_done: AtomicBool::new(false),
        }
    }

    /// Register if nobody has yet.
    ///
    /// Returns `Ok(false)` when registration was already done (or is in
    /// progress on another shard).
    pub async fn register_once(&self) -> Result<bool, BotError> {
        if self.claimed.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        match self.register().await {
            Ok(()) => Ok(true),
            Err(e) => {
                self.claimed.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Only called by the claim holder
    async fn register(&self) -> Result<(), BotError> {
        if !self.global_done.load(Ordering::SeqCst) {
            self.registrar.register_globally(&self.commands).await?;
            self.global_done.store(true, Ordering::SeqCst);
        }

        if let Some(guild_id) = self.debug_guild {
            if !self.guild_done.load(Ordering::SeqCst) {
                warn!(guild_id, "WARNING: Running in debug mode");
                self.registrar
                    .register_to_guild(guild_id, &self.commands)
                    .await?;
                self.guild_done.store(true, Ordering::SeqCst);
            }
        }

        Ok(())
    }
}

/// Subscribers of every runtime event
pub struct EventHandlers {
    router: Arc<CommandRouter>,
    status: Arc<StatusAggregator>,
    registration: Arc<CommandRegistration>,
}

impl EventHandlers {
    pub fn new(
        router: Arc<CommandRouter>,
        status: Arc<StatusAggregator>,
        registration: Arc<CommandRegistration>,
    ) -> Self {
        Self {
            router,
            status,
            registration,
        }
    }

    /// Hand the event to its subscribers on a new task.
    ///
    /// The caller (a shard loop) never waits for handling.
    pub fn publish(self: &Arc<Self>, event: BotEvent) {
        let handlers = Arc::clone(self);
        tokio::spawn(async move { handlers.handle(event).await });
    }

    /// Run the subscribers of one event to completion
    pub async fn handle(&self, event: BotEvent) {
        match event {
            BotEvent::InteractionReceived(event) => {
                let InteractionEvent {
                    shard_id,
                    interaction,
                } = *event;
                self.router.dispatch(shard_id, interaction).await;
            }
            BotEvent::ShardReady {
                shard_id,
                guild_ids,
            } => {
                info!(shard_id, guilds = guild_ids.len(), "Shard ready");
                let (registered, _) =
                    tokio::join!(self.registration.register_once(), self.status.recompute());
                match registered {
                    Ok(true) => info!(shard_id, "Application commands registered"),
                    Ok(false) => {}
                    Err(e) => {
                        metrics::record_error(&e);
                        error!(shard_id, error = %e, "Command registration failed");
                    }
                }
            }
            BotEvent::GuildJoined { shard_id, guild_id } => {
                info!(shard_id, guild_id, "Joined guild");
                self.status.recompute().await;
            }
            BotEvent::GuildLeft { shard_id, guild_id } => {
                info!(shard_id, guild_id, "Left guild");
                self.status.recompute().await;
            }
        }
    }
}
