//! Event handling module
//!
//! Converts gateway events into the typed events the runtime subscribes to.

pub mod translate;

pub use translate::{
    command_data, command_path, subcommand, translate_event, BotEvent, InteractionEvent,
};

#[cfg(test)]
pub(crate) use translate::command_interaction;
