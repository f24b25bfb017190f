//! Discord delivery over direct messages
//!
//! The gateway client owns the `Http` instance, and the client cannot be
//! built until the event handler (which needs the scheduler, which needs
//! this notifier) exists. The notifier is therefore created empty and the
//! `Http` handle is installed right after the client is built, before any
//! timer can fire.

use crate::core::embeds::reminder_embed;
use crate::core::error::SendError;
use crate::features::reminders::notifier::{Notifier, ReminderMessage};
use async_trait::async_trait;
use log::debug;
use serenity::http::{Http, HttpError};
use serenity::model::id::UserId;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Discord error code: cannot send messages to this user
const CANNOT_MESSAGE_USER: isize = 50007;

/// Discord error code: unknown user
const UNKNOWN_USER: isize = 10013;

/// Delivers reminders to Discord users via DM
#[derive(Default)]
pub struct DiscordNotifier {
    http: RwLock<Option<Arc<Http>>>,
}

impl DiscordNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the gateway client's Http handle
    pub async fn set_http(&self, http: Arc<Http>) {
        *self.http.write().await = Some(http);
        debug!("Discord notifier is connected to the gateway client");
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, recipient_id: &str, message: &ReminderMessage) -> Result<(), SendError> {
        let http = self
            .http
            .read()
            .await
            .clone()
            .ok_or_else(|| SendError::Transient("discord client not connected yet".to_string()))?;

        let user_id = recipient_id.parse::<u64>().map_err(|_| {
            SendError::Unreachable(format!("malformed recipient id: {recipient_id}"))
        })?;

        let channel = UserId(user_id)
            .create_dm_channel(&http)
            .await
            .map_err(classify)?;
        channel
            .send_message(&http, |m| m.set_embed(reminder_embed(message)))
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// Split Discord API failures into permanently-unreachable vs transient
fn classify(err: serenity::Error) -> SendError {
    if let serenity::Error::Http(http_err) = &err {
        if let HttpError::UnsuccessfulRequest(response) = http_err.as_ref() {
            let code = response.error.code;
            if code == CANNOT_MESSAGE_USER || code == UNKNOWN_USER {
                return SendError::Unreachable(format!(
                    "discord error {code}: {}",
                    response.error.message
                ));
            }
        }
    }
    SendError::Transient(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_http_is_transient() {
        let notifier = DiscordNotifier::new();
        let message = ReminderMessage {
            text: "hi".to_string(),
            image_url: None,
        };
        let result = notifier.send("123", &message).await;
        assert!(matches!(result, Err(SendError::Transient(_))));
    }

    #[tokio::test]
    async fn test_malformed_recipient_id_is_unreachable() {
        let notifier = DiscordNotifier::new();
        notifier.set_http(Arc::new(Http::new("invalid-token"))).await;
        let message = ReminderMessage {
            text: "hi".to_string(),
            image_url: None,
        };
        let result = notifier.send("not-a-snowflake", &message).await;
        assert!(matches!(result, Err(SendError::Unreachable(_))));
    }
}
