//! Startup ordering and process lifetime
//!
//! [`run`] performs the startup sequence step by step, then waits on the
//! shutdown future. Fatal steps return the error; everything after the
//! shards are started only logs.

mod handlers;

pub use handlers::{CommandRegistration, EventHandlers};

use crate::commands;
use crate::config::BotConfig;
use crate::error::BotError;
use crate::gateway::{self, HttpRegistrar, ShardPresence};
use crate::metrics;
use crate::router::CommandRouter;
use crate::services::{HttpResponder, Services};
use crate::shard::ShardPool;
use crate::stats::{StatsReporter, TopGgClient};
use crate::status::StatusAggregator;
use crate::web::RequestListener;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Run the bot until `shutdown` resolves or every shard has ended.
///
/// Logging must already be installed; every log event of the connection
/// layer and of the router goes to that one subscriber.
pub async fn run(config: BotConfig, shutdown: impl Future<Output = ()>) -> Result<(), BotError> {
    let config = Arc::new(config);

    if let Some(port) = config.metrics_port {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        match metrics::install(addr) {
            Ok(()) => info!(port, "Prometheus exporter listening"),
            Err(e) => warn!(error = %e, "Metrics disabled"),
        }
    }

    // Stats reporter (optional, never fatal)
    let reporter = connect_reporter(&config).await;

    // Command modules
    let http = Arc::new(twilight_http::Client::new(config.discord_token.clone()));
    let services = Services::new(Arc::new(HttpResponder::new(Arc::clone(&http))));
    let mut router = CommandRouter::new(services);
    commands::register_all(&mut router)?;
    let router = Arc::new(router);
    info!(commands = ?router.command_names(), "Command modules registered");

    // Login
    let application_id = gateway::login(&http).await?;

    // Shards
    let pool = ShardPool::new(
        config.total_shards,
        config.discord_token.clone(),
        BotConfig::intents(),
    )?;

    let status = Arc::new(StatusAggregator::new(
        pool.state(),
        Arc::new(ShardPresence::new(pool.senders())),
        reporter,
        config.debug,
    ));
    let registration = Arc::new(CommandRegistration::new(
        Arc::new(HttpRegistrar::new(Arc::clone(&http), application_id)),
        router.definitions(),
        config.registration_guild(),
    ));
    let handlers = Arc::new(EventHandlers::new(router, status, registration));

    let pool_shutdown = pool.shutdown_sender();
    let mut pool_task = tokio::spawn(pool.run(handlers));
    info!(total_shards = config.total_shards, "Gateway connection started");

    // Request listener, independent of the bot
    let listener = Arc::new(RequestListener::new(config.http_addr));
    let listener_task = Arc::clone(&listener).spawn();

    let pool_finished = tokio::select! {
        result = &mut pool_task => {
            match result {
                Ok(Ok(())) => warn!("Every shard has stopped"),
                Ok(Err(e)) => error!(error = %e, "Shard pool error"),
                Err(e) => error!(error = %e, "Shard pool task panicked"),
            }
            true
        }
        () = shutdown => {
            info!("Shutdown signal received");
            false
        }
    };

    info!("Shutting down bot...");
    let _ = pool_shutdown.send(());
    listener.stop();

    if !pool_finished {
        let _ = pool_task.await;
    }
    let _ = listener_task.await;

    info!("Bot shutdown complete");
    Ok(())
}

/// Authenticate the stats reporter when enabled.
///
/// Any failure disables reporting for this session.
async fn connect_reporter(config: &BotConfig) -> Option<Arc<dyn StatsReporter>> {
    if !config.use_topgg {
        info!("Server count reporting disabled");
        return None;
    }

    let (Some(bot_id), Some(token)) = (config.bot_client_id, config.topgg_token.as_deref()) else {
        warn!("USE_TOPGG is set but TOPGG_TOKEN is missing - server count reporting disabled");
        return None;
    };

    match TopGgClient::authenticate(bot_id, token).await {
        Ok(client) => Some(client as Arc<dyn StatsReporter>),
        Err(e) => {
            metrics::record_error(&e);
            warn!(error = %e, "top.gg authentication failed - server count reporting disabled");
            None
        }
    }
}
