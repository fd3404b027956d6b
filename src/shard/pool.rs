//! Shard pool implementation
//!
//! Runs every Discord shard of the bot in this process and forwards the
//! events the runtime subscribes to.

use crate::error::BotError;
use crate::events::translate_event;
use crate::lifecycle::EventHandlers;
use crate::metrics;
use crate::shard::state::{ShardHealth, ShardState};

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use twilight_gateway::{Config, EventTypeFlags, Intents, MessageSender, Shard, StreamExt as _};
use twilight_model::gateway::{event::Event, ShardId};

/// Circuit breaker: mark shard dead after N consecutive errors without success
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// Events deserialized by the shards; everything else is skipped by Twilight
fn wanted_events() -> EventTypeFlags {
    EventTypeFlags::READY
        | EventTypeFlags::RESUMED
        | EventTypeFlags::GUILD_CREATE
        | EventTypeFlags::GUILD_DELETE
        | EventTypeFlags::INTERACTION_CREATE
}

/// Pool of every shard run by this process
pub struct ShardPool {
    shards: Vec<Shard>,
    state: ShardState,
    shutdown_tx: broadcast::Sender<()>,
}

impl ShardPool {
    /// Create a new shard pool
    ///
    /// # Arguments
    /// * `total_shards` - Shard count of the bot
    /// * `token` - Discord bot token
    /// * `intents` - Discord gateway intents
    pub fn new(total_shards: u64, token: String, intents: Intents) -> Result<Self, BotError> {
        info!(total_shards, "Creating shard pool");

        // u64 to u32 at the Twilight API boundary
        let total_shards_u32 = u32::try_from(total_shards)
            .map_err(|_| BotError::ShardIdOverflow { value: total_shards })?;

        let state = ShardState::new(0..total_shards);

        let shards = (0..total_shards_u32)
            .map(|shard_id| {
                let config = Config::new(token.clone(), intents);
                Shard::with_config(ShardId::new(shard_id, total_shards_u32), config)
            })
            .collect();

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            shards,
            state,
            shutdown_tx,
        })
    }

    /// Shared membership and health
    pub fn state(&self) -> ShardState {
        self.state.clone()
    }

    /// Command senders of every shard, for presence updates
    pub fn senders(&self) -> Vec<(u64, MessageSender)> {
        self.shards
            .iter()
            .map(|shard| (u64::from(shard.id().number()), shard.sender()))
            .collect()
    }

    /// Sender used to stop every shard once [`run`](Self::run) has taken the pool
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run all shards in the pool
    ///
    /// Spawns a task for each shard and waits for all to complete.
    pub async fn run(self, handlers: Arc<EventHandlers>) -> Result<(), BotError> {
        let mut handles = Vec::with_capacity(self.shards.len());

        for shard in self.shards {
            let shard_id: u64 = shard.id().number().into();
            let state = self.state.clone();
            let handlers = Arc::clone(&handlers);
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            let handle = tokio::spawn(async move {
                tokio::select! {
                    result = run_shard(shard, state, handlers) => {
                        if let Err(e) = result {
                            metrics::record_error(&e);
                            error!(shard_id, error = %e, "Shard task failed");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!(shard_id, "Shard received shutdown signal");
                    }
                }
            });

            handles.push(handle);
        }

        for handle in handles {
            let _ = handle.await;
        }

        info!(
            ready_shards = self.state.ready_shards(),
            "Shard pool shut down"
        );
        Ok(())
    }
}

/// Run a single shard's event loop
///
/// Events are forwarded in the order the shard receives them; handling
/// runs on separate tasks so a slow handler never stalls the shard.
async fn run_shard(
    mut shard: Shard,
    state: ShardState,
    handlers: Arc<EventHandlers>,
) -> Result<(), BotError> {
    let shard_id: u64 = shard.id().number().into();

    state.set_health(shard_id, ShardHealth::Connecting);
    info!(shard_id, "Shard starting");

    let mut consecutive_errors: u32 = 0;

    while let Some(item) = shard.next_event(wanted_events()).await {
        let event = match item {
            Ok(event) => {
                consecutive_errors = 0;
                event
            }
            Err(source) => {
                consecutive_errors += 1;
                warn!(shard_id, error = %source, consecutive = consecutive_errors, "Error receiving event");

                // Immediate fatal: reconnect failure
                if matches!(
                    source.kind(),
                    twilight_gateway::error::ReceiveMessageErrorType::Reconnect
                ) {
                    state.set_health(shard_id, ShardHealth::Dead);
                    return Err(BotError::ShardReconnectFailed {
                        shard_id,
                        source: Box::new(source),
                    });
                }

                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    state.set_health(shard_id, ShardHealth::Dead);
                    return Err(BotError::ShardCircuitBroken {
                        shard_id,
                        count: consecutive_errors,
                        max: MAX_CONSECUTIVE_ERRORS,
                    });
                }

                state.set_health(shard_id, ShardHealth::Disconnected);
                continue;
            }
        };

        if let Event::Resumed = event {
            state.set_health(shard_id, ShardHealth::Ready);
            info!(shard_id, "Shard resumed");
            continue;
        }

        let Some(bot_event) = translate_event(event, shard_id) else {
            continue;
        };

        if state.apply(&bot_event) {
            handlers.publish(bot_event);
        } else {
            debug!(shard_id, kind = bot_event.kind(), "Membership unchanged, event dropped");
        }
    }

    // Stream ended, shard closed
    info!(shard_id, "Shard event stream ended");
    Ok(())
}
