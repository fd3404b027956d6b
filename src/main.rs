//! UNO bot - sharded Discord bot runtime using Twilight
//!
//! Starts the shards, routes slash commands to their handler modules,
//! keeps the presence line in step with the guild count and runs a small
//! plaintext web listener beside the bot.

use anyhow::Result;
use tokio::signal;
use tracing::info;
use uno_bot::config::BotConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first to get log level
    let config = BotConfig::from_env()?;

    // One sink for the bot, the gateway connection layer and the web listener
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("uno_bot={}", config.log_level).parse()?)
                .add_directive("twilight_gateway=info".parse()?)
                .add_directive("twilight_http=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .json()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        total_shards = config.total_shards,
        debug = config.debug,
        "Starting UNO bot"
    );

    uno_bot::lifecycle::run(config, shutdown_signal()).await?;
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
