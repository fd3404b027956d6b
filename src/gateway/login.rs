//! Bot login

use crate::error::BotError;
use tracing::info;
use twilight_http::Client;
use twilight_model::id::marker::ApplicationMarker;
use twilight_model::id::Id;

/// Validate the bot token and resolve the application id.
///
/// A rejected token is fatal for the process.
pub async fn login(http: &Client) -> Result<Id<ApplicationMarker>, BotError> {
    let user = http
        .current_user()
        .await
        .map_err(|e| BotError::Login(Box::new(e)))?
        .model()
        .await
        .map_err(|e| BotError::Login(Box::new(e)))?;

    let application = http
        .current_user_application()
        .await
        .map_err(|e| BotError::Login(Box::new(e)))?
        .model()
        .await
        .map_err(|e| BotError::Login(Box::new(e)))?;

    info!(
        user_id = %user.id,
        username = %user.name,
        application_id = %application.id,
        "Logged in"
    );

    Ok(application.id)
}
