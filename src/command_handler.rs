//! # Command Dispatcher
//!
//! Routes slash commands to their registered handlers and watches plain
//! messages for the admin image-attachment flow.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Registry-based dispatch; message handling reduced to the image flow
//! - 1.0.0: Initial implementation

use anyhow::Result;
use log::{info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::handlers::{AdminEventsHandler, EventsHandler};
use crate::commands::{CommandContext, CommandRegistry};
use crate::database::EventPatch;

/// Top-level dispatcher shared by the gateway event handler
pub struct CommandHandler {
    registry: CommandRegistry,
    context: Arc<CommandContext>,
}

impl CommandHandler {
    pub fn new(context: CommandContext) -> Self {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(EventsHandler));
        registry.register(Arc::new(AdminEventsHandler));
        Self {
            registry,
            context: Arc::new(context),
        }
    }

    /// Shared context, for constructing sibling handlers
    pub fn context(&self) -> Arc<CommandContext> {
        Arc::clone(&self.context)
    }

    /// Dispatch one slash command interaction
    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match self.registry.get(command.data.name.as_str()) {
            Some(handler) => handler.handle(self.context(), ctx, command).await,
            None => {
                warn!("No handler registered for command: {}", command.data.name);
                Ok(())
            }
        }
    }

    /// Watch plain messages for the pending image-attachment step
    ///
    /// Only consulted while the author has an open admin session; every
    /// other message is ignored.
    pub async fn handle_message(&self, ctx: &Context, msg: &Message) -> Result<()> {
        if msg.author.bot {
            return Ok(());
        }
        let event_id = match self.context.sessions.pending_image_event(msg.author.id.0) {
            Some(event_id) => event_id,
            None => return Ok(()),
        };
        let attachment = match msg.attachments.first() {
            Some(attachment) => attachment,
            // Not an upload; leave the session open until the image, the
            // skip button, or the sweep resolves it
            None => return Ok(()),
        };

        self.context
            .service
            .update_event(
                event_id,
                EventPatch {
                    image_url: Some(attachment.url.clone()),
                    ..Default::default()
                },
            )
            .await?;
        self.context.sessions.clear(msg.author.id.0);
        info!(
            "Attached image to event {event_id} from admin {}",
            msg.author.id
        );

        msg.channel_id
            .say(&ctx.http, format!("🖼 Image saved for event #{event_id}."))
            .await?;
        Ok(())
    }
}
