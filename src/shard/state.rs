//! Shard state tracking
//!
//! Tracks health and guild membership of every shard run by this process.
//! Membership is mutated only by the shard event loops; every other
//! component reads it.

use crate::events::BotEvent;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Health status for a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardHealth {
    /// Shard is connecting
    Connecting,
    /// Shard is ready and receiving events
    Ready,
    /// Shard lost its connection and is retrying
    Disconnected,
    /// Shard encountered a fatal error
    Dead,
}

#[derive(Debug)]
struct ShardEntry {
    health: ShardHealth,
    guilds: HashSet<u64>,
}

/// Shared state across all shards in the process
#[derive(Debug, Clone)]
pub struct ShardState {
    shards: Arc<DashMap<u64, ShardEntry>>,
}

impl ShardState {
    /// Create a new shard state tracker
    pub fn new(shard_ids: impl Iterator<Item = u64>) -> Self {
        let shards = DashMap::new();
        for shard_id in shard_ids {
            shards.insert(
                shard_id,
                ShardEntry {
                    health: ShardHealth::Connecting,
                    guilds: HashSet::new(),
                },
            );
        }

        Self {
            shards: Arc::new(shards),
        }
    }

    /// Update shard health
    pub fn set_health(&self, shard_id: u64, health: ShardHealth) {
        if let Some(mut entry) = self.shards.get_mut(&shard_id) {
            entry.health = health;
        }
    }

    /// Apply a membership-affecting event to the shard it arrived on.
    ///
    /// Returns false when the event changes nothing and should not be
    /// forwarded: a GUILD_CREATE for a guild the shard already knows (a
    /// guild becoming available after READY) or a GUILD_DELETE for a guild
    /// it doesn't. Every other event is forwarded.
    pub fn apply(&self, event: &BotEvent) -> bool {
        match event {
            BotEvent::ShardReady {
                shard_id,
                guild_ids,
            } => {
                if let Some(mut entry) = self.shards.get_mut(shard_id) {
                    entry.guilds = guild_ids.iter().copied().collect();
                }
                self.set_health(*shard_id, ShardHealth::Ready);
                true
            }
            BotEvent::GuildJoined { shard_id, guild_id } => self
                .shards
                .get_mut(shard_id)
                .is_some_and(|mut entry| entry.guilds.insert(*guild_id)),
            BotEvent::GuildLeft { shard_id, guild_id } => self
                .shards
                .get_mut(shard_id)
                .is_some_and(|mut entry| entry.guilds.remove(guild_id)),
            BotEvent::InteractionReceived(_) => true,
        }
    }

    /// Get total guilds across all shards, summed from live membership
    pub fn total_guilds(&self) -> u64 {
        self.shards.iter().map(|e| e.guilds.len() as u64).sum()
    }

    /// Get count of ready shards
    pub fn ready_shards(&self) -> usize {
        self.shards
            .iter()
            .filter(|e| e.health == ShardHealth::Ready)
            .count()
    }
}
