//! Presence and server-count publishing
//!
//! Every recomputation reads live shard membership; nothing is cached
//! between calls, so concurrent recomputations need no lock. The last
//! presence write wins.

use crate::gateway::PresenceSink;
use crate::metrics;
use crate::shard::ShardState;
use crate::stats::StatsReporter;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Displayed status for a guild total
pub fn presence_text(total_guilds: u64) -> String {
    format!("serving {total_guilds} servers")
}

/// Keeps presence and the external server count in line with membership
pub struct StatusAggregator {
    shards: ShardState,
    presence: Arc<dyn PresenceSink>,
    reporter: Option<Arc<dyn StatsReporter>>,
    debug: bool,
}

impl StatusAggregator {
    /// `reporter` is skipped entirely while `debug` is set
    pub fn new(
        shards: ShardState,
        presence: Arc<dyn PresenceSink>,
        reporter: Option<Arc<dyn StatsReporter>>,
        debug: bool,
    ) -> Self {
        Self {
            shards,
            presence,
            reporter,
            debug,
        }
    }

    /// Recompute the guild total and push it out.
    ///
    /// Presence and the reporter are pushed concurrently and independently;
    /// failures are logged, never returned. Returns the total pushed.
    pub async fn recompute(&self) -> u64 {
        let total = self.shards.total_guilds();
        let status = presence_text(total);
        info!(total_guilds = total, "Updating guild count");
        metrics::set_guilds_total(total);

        let push_presence = async {
            match self.presence.set_presence(&status).await {
                Ok(()) => {
                    metrics::record_presence_update(true);
                    debug!(status = %status, "Presence updated");
                }
                Err(e) => {
                    metrics::record_presence_update(false);
                    metrics::record_error(&e);
                    warn!(error = %e, "Failed to update presence");
                }
            }
        };

        let push_stats = async {
            let Some(reporter) = self.reporter.as_ref().filter(|_| !self.debug) else {
                return;
            };
            if let Err(e) = reporter.update_server_count(total).await {
                metrics::record_error(&e);
                warn!(error = %e, "Failed to report server count");
            }
        };

        tokio::join!(push_presence, push_stats);
        total
    }
}
