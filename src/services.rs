//! Dependency container handed to every command handler
//!
//! Built once at startup and shared by `Arc`; there are no process-wide
//! singletons.

use crate::error::BotError;
use async_trait::async_trait;
use std::sync::Arc;
use twilight_http::Client;
use twilight_model::application::interaction::Interaction;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseType};
use twilight_util::builder::InteractionResponseDataBuilder;

/// Services available to command handlers
#[derive(Clone)]
pub struct Services {
    pub game_manager: Arc<GameManager>,
    pub responder: Arc<dyn InteractionResponder>,
}

impl Services {
    pub fn new(responder: Arc<dyn InteractionResponder>) -> Self {
        Self {
            game_manager: Arc::new(GameManager::default()),
            responder,
        }
    }
}

/// Game service owned by the game module.
///
/// The runtime constructs it and hands it to handlers; it never looks inside.
#[derive(Debug, Default)]
pub struct GameManager {
    _private: (),
}

/// Sends replies to interactions
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    /// Reply to the interaction with a plain message
    async fn reply(&self, interaction: &Interaction, content: &str) -> Result<(), BotError>;
}

/// Responder backed by the Twilight HTTP interaction client
pub struct HttpResponder {
    http: Arc<Client>,
}

impl HttpResponder {
    pub fn new(http: Arc<Client>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl InteractionResponder for HttpResponder {
    async fn reply(&self, interaction: &Interaction, content: &str) -> Result<(), BotError> {
        let response = InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(InteractionResponseDataBuilder::new().content(content).build()),
        };

        self.http
            .interaction(interaction.application_id)
            .create_response(interaction.id, &interaction.token, &response)
            .await
            .map_err(|e| BotError::InteractionResponse {
                interaction_id: interaction.id.get(),
                source: Box::new(e),
            })?;

        Ok(())
    }
}
