//! Presence updates

use crate::error::{BotError, BoxError};
use async_trait::async_trait;
use tracing::debug;
use twilight_gateway::MessageSender;
use twilight_model::gateway::payload::outgoing::update_presence::{
    UpdatePresence, UpdatePresenceError,
};
use twilight_model::gateway::presence::{Activity, ActivityType, MinimalActivity, Status};

/// Destination of the bot's displayed status
#[async_trait]
pub trait PresenceSink: Send + Sync {
    /// Replace the displayed status on every shard
    async fn set_presence(&self, status: &str) -> Result<(), BotError>;
}

/// Presence sink writing to each shard's gateway connection
pub struct ShardPresence {
    senders: Vec<(u64, MessageSender)>,
}

impl ShardPresence {
    pub fn new(senders: Vec<(u64, MessageSender)>) -> Self {
        Self { senders }
    }
}

#[async_trait]
impl PresenceSink for ShardPresence {
    /// Queues the update on every shard; returns the first failure after
    /// trying them all.
    async fn set_presence(&self, status: &str) -> Result<(), BotError> {
        let mut first_error = None;

        for (shard_id, sender) in &self.senders {
            let result = presence_payload(status)
                .map_err(|e| Box::new(e) as BoxError)
                .and_then(|payload| {
                    sender
                        .command(&payload)
                        .map_err(|e| Box::new(e) as BoxError)
                });

            match result {
                Ok(()) => debug!(shard_id, status, "Presence queued"),
                Err(source) => {
                    first_error.get_or_insert(BotError::Presence {
                        shard_id: *shard_id,
                        source,
                    });
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

fn presence_payload(status: &str) -> Result<UpdatePresence, UpdatePresenceError> {
    let activity = Activity::from(MinimalActivity {
        kind: ActivityType::Playing,
        name: status.to_string(),
        url: None,
    });

    UpdatePresence::new(vec![activity], false, None, Status::Online)
}
