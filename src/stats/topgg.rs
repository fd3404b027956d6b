//! top.gg API client

use crate::error::BotError;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Production API root
pub const TOPGG_API: &str = "https://top.gg/api";

/// Receiver of the aggregate server count
#[async_trait]
pub trait StatsReporter: Send + Sync {
    async fn update_server_count(&self, server_count: u64) -> Result<(), BotError>;
}

#[derive(Debug, Deserialize)]
struct BotInfo {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatsPayload {
    server_count: u64,
}

/// Authenticated top.gg client for one bot
pub struct TopGgClient {
    http: reqwest::Client,
    base_url: String,
    bot_id: u64,
    token: String,
    updates_sent: AtomicU64,
    update_failures: AtomicU64,
}

impl TopGgClient {
    /// Authenticate against the production API
    pub async fn authenticate(bot_id: u64, token: &str) -> Result<Arc<Self>, BotError> {
        Self::authenticate_at(TOPGG_API, bot_id, token).await
    }

    /// Authenticate against an explicit API root.
    ///
    /// Fetches the bot's own listing with the token; a rejected token or an
    /// unknown bot fails here instead of on the first update.
    pub async fn authenticate_at(
        base_url: &str,
        bot_id: u64,
        token: &str,
    ) -> Result<Arc<Self>, BotError> {
        let http = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        let info: BotInfo = http
            .get(format!("{base_url}/bots/{bot_id}"))
            .header(AUTHORIZATION, token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| BotError::StatsAuth(Box::new(e)))?
            .json()
            .await
            .map_err(|e| BotError::StatsAuth(Box::new(e)))?;

        info!(bot_id, username = ?info.username, "Authenticated with top.gg");

        Ok(Arc::new(Self {
            http,
            base_url,
            bot_id,
            token: token.to_string(),
            updates_sent: AtomicU64::new(0),
            update_failures: AtomicU64::new(0),
        }))
    }

    /// Get total successful updates
    pub fn updates_sent(&self) -> u64 {
        self.updates_sent.load(Ordering::Relaxed)
    }

    /// Get total failed updates
    pub fn update_failures(&self) -> u64 {
        self.update_failures.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StatsReporter for TopGgClient {
    async fn update_server_count(&self, server_count: u64) -> Result<(), BotError> {
        let result = self
            .http
            .post(format!("{}/bots/{}/stats", self.base_url, self.bot_id))
            .header(AUTHORIZATION, &self.token)
            .json(&StatsPayload { server_count })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match result {
            Ok(_) => {
                self.updates_sent.fetch_add(1, Ordering::Relaxed);
                debug!(server_count, "Server count published to top.gg");
                Ok(())
            }
            Err(e) => {
                self.update_failures.fetch_add(1, Ordering::Relaxed);
                Err(BotError::StatsUpdate {
                    count: server_count,
                    source: Box::new(e),
                })
            }
        }
    }
}
