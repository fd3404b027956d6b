//! Domain error types for the bot runtime
//!
//! main.rs is the ONLY module allowed to use anyhow::Result (process boundary).
//! All library code returns Result<T, BotError>.

use std::net::SocketAddr;
use thiserror::Error;

/// Boxed error used for collaborator failures we only log or wrap.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Bot runtime errors
///
/// Every variant carries structured context fields for diagnostics, so a
/// log line can be matched to a failure mode without parsing the message.
///
/// Example log output:
/// ```text
/// BotError::CommandFailed { command: "uno start", .. }
/// → "command 'uno start' failed"
/// ```
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration error (environment variable missing or invalid)
    #[error("configuration error: {0}")]
    Config(String),

    /// Bot token rejected by the platform
    #[error("login rejected")]
    Login(#[source] BoxError),

    /// Two handlers claimed the same command name
    #[error("command '{name}' registered twice")]
    DuplicateCommand { name: String },

    /// Interaction named a command no handler is registered for
    #[error("no handler registered for command '{name}'")]
    UnknownCommand { name: String },

    /// A command handler returned an error
    #[error("command '{command}' failed")]
    CommandFailed {
        command: String,
        #[source]
        source: BoxError,
    },

    /// A command handler panicked; the panic was caught at dispatch
    #[error("command '{command}' panicked: {message}")]
    CommandPanicked { command: String, message: String },

    /// Command registration RPC failed (scope is "global" or "guild:<id>")
    #[error("command registration failed ({scope})")]
    Registration {
        scope: String,
        #[source]
        source: BoxError,
    },

    /// Presence update could not be queued on a shard
    #[error("presence update failed on shard {shard_id}")]
    Presence {
        shard_id: u64,
        #[source]
        source: BoxError,
    },

    /// Stats reporter rejected our credentials
    #[error("stats reporter authentication failed")]
    StatsAuth(#[source] BoxError),

    /// Stats reporter update failed
    #[error("stats reporter update failed (server_count={count})")]
    StatsUpdate {
        count: u64,
        #[source]
        source: BoxError,
    },

    /// Responding to an interaction failed
    #[error("interaction {interaction_id} response failed")]
    InteractionResponse {
        interaction_id: u64,
        #[source]
        source: BoxError,
    },

    /// Request listener could not bind its address
    #[error("request listener failed to bind {addr}")]
    ListenerBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Request listener accept loop died
    #[error("request listener stopped unexpectedly")]
    ListenerServe(#[source] std::io::Error),

    /// Shard exceeded consecutive error threshold (circuit breaker tripped)
    #[error("shard {shard_id} exceeded consecutive error threshold ({count}/{max})")]
    ShardCircuitBroken { shard_id: u64, count: u32, max: u32 },

    /// Shard reconnection failed (fatal, shard marked dead)
    #[error("shard {shard_id} reconnection failed")]
    ShardReconnectFailed {
        shard_id: u64,
        #[source]
        source: BoxError,
    },

    /// Shard ID overflow: u64 value exceeds u32::MAX (Twilight API boundary)
    #[error("shard ID overflow: {value} exceeds u32::MAX")]
    ShardIdOverflow { value: u64 },

    /// Prometheus exporter could not be installed
    #[error("metrics exporter failed: {0}")]
    Metrics(String),
}

impl BotError {
    /// Returns a static label string suitable for Prometheus metrics.
    ///
    /// Used as the `error_type` label on `bot_errors_total`.
    pub fn error_type_label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Login(_) => "login",
            Self::DuplicateCommand { .. } => "duplicate_command",
            Self::UnknownCommand { .. } => "unknown_command",
            Self::CommandFailed { .. } => "command_failed",
            Self::CommandPanicked { .. } => "command_panicked",
            Self::Registration { .. } => "registration",
            Self::Presence { .. } => "presence",
            Self::StatsAuth(_) => "stats_auth",
            Self::StatsUpdate { .. } => "stats_update",
            Self::InteractionResponse { .. } => "interaction_response",
            Self::ListenerBind { .. } => "listener_bind",
            Self::ListenerServe(_) => "listener_serve",
            Self::ShardCircuitBroken { .. } => "circuit_broken",
            Self::ShardReconnectFailed { .. } => "reconnect_failed",
            Self::ShardIdOverflow { .. } => "shard_overflow",
            Self::Metrics(_) => "metrics",
        }
    }
}
