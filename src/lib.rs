//! UNO bot runtime
//!
//! The runtime shell of a sharded Discord bot:
//! - Runs every shard of the bot in one process (shard pool)
//! - Routes slash-command interactions to handler modules
//! - Publishes a "serving N servers" presence and an optional top.gg count
//! - Serves a fixed plaintext response on a side HTTP listener
//! - Exports Prometheus metrics when a metrics port is configured

pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod lifecycle;
pub mod metrics;
pub mod router;
pub mod services;
pub mod shard;
pub mod stats;
pub mod status;
pub mod web;
