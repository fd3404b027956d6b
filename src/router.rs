//! Command router
//!
//! Maps command names to handler modules and runs one handler per
//! interaction. The router is immutable once shared: registration happens
//! before it is wrapped in an `Arc`.

use crate::commands::{CommandHandler, ExecutionContext};
use crate::error::BotError;
use crate::metrics;
use crate::services::Services;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use twilight_model::application::command::Command;
use twilight_model::application::interaction::Interaction;

/// How a dispatch ended. Dispatch itself never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handler ran to completion
    Completed,
    /// Handler returned an error (logged)
    Failed,
    /// No handler for the command name (logged)
    UnknownCommand,
    /// Interaction carried no command (component, autocomplete, ping)
    Ignored,
}

impl DispatchOutcome {
    fn label(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::UnknownCommand => "unknown",
            Self::Ignored => "ignored",
        }
    }
}

/// Registry of command handlers plus the services they run with
pub struct CommandRouter {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    services: Services,
}

impl CommandRouter {
    pub fn new(services: Services) -> Self {
        Self {
            handlers: HashMap::new(),
            services,
        }
    }

    /// Register a handler module.
    ///
    /// A second module claiming the same name is a startup error.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> Result<(), BotError> {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(BotError::DuplicateCommand { name });
        }

        info!(command = %name, "Registered command module");
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered command names, sorted
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Platform definitions of every registered command, sorted by name
    pub fn definitions(&self) -> Vec<Command> {
        self.command_names()
            .into_iter()
            .filter_map(|name| self.handlers.get(name))
            .map(|handler| handler.definition())
            .collect()
    }

    /// Run the handler for one interaction.
    ///
    /// Handler errors, handler panics and unknown commands are logged here
    /// and reported through the returned outcome; they never propagate.
    pub async fn dispatch(&self, shard_id: u64, interaction: Interaction) -> DispatchOutcome {
        let ctx = ExecutionContext::new(shard_id, interaction);

        let (Some(name), Some(path)) = (
            ctx.command_name().map(str::to_string),
            ctx.command_path(),
        ) else {
            debug!(
                shard_id = ctx.shard_id,
                interaction_id = ctx.interaction.id.get(),
                kind = ?ctx.interaction.kind,
                "Interaction without command data ignored"
            );
            return DispatchOutcome::Ignored;
        };

        let span = info_span!(
            "dispatch",
            dispatch_id = %ctx.dispatch_id,
            shard_id = ctx.shard_id,
            interaction_id = ctx.interaction.id.get(),
            command = %path,
        );

        let outcome = self.run(&ctx, &name, &path).instrument(span).await;

        let label = if outcome == DispatchOutcome::UnknownCommand {
            "unknown"
        } else {
            name.as_str()
        };
        metrics::record_interaction(label, outcome.label());
        outcome
    }

    async fn run(&self, ctx: &ExecutionContext, name: &str, path: &str) -> DispatchOutcome {
        let Some(handler) = self.handlers.get(name) else {
            let err = BotError::UnknownCommand {
                name: name.to_string(),
            };
            metrics::record_error(&err);
            warn!(error = %err, "Unknown command");
            return DispatchOutcome::UnknownCommand;
        };

        debug!("Dispatching command");
        let result = AssertUnwindSafe(handler.execute(ctx, &self.services))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(())) => {
                debug!("Command completed");
                DispatchOutcome::Completed
            }
            Ok(Err(source)) => {
                let cause = source.to_string();
                let err = BotError::CommandFailed {
                    command: path.to_string(),
                    source,
                };
                metrics::record_error(&err);
                error!(error = %err, cause = %cause, "Command handler failed");
                DispatchOutcome::Failed
            }
            Err(panic) => {
                let err = BotError::CommandPanicked {
                    command: path.to_string(),
                    message: panic_message(panic.as_ref()),
                };
                metrics::record_error(&err);
                error!(error = %err, "Command handler panicked");
                DispatchOutcome::Failed
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
