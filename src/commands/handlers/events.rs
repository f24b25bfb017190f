//! Event browsing command handlers
//!
//! Handles: events, event
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::slash::get_integer_option;
use crate::components::render_event_view;
use crate::core::error::EventError;

/// Handler for the event browsing commands
pub struct EventsHandler;

#[async_trait]
impl SlashCommandHandler for EventsHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["events", "event"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "events" => self.handle_list(&ctx, serenity_ctx, command).await,
            "event" => self.handle_show(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl EventsHandler {
    /// Handle /events - list all upcoming events
    async fn handle_list(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let events = ctx.service.list_future_events(Utc::now()).await?;
        debug!(
            "Listing {} upcoming events for user {}",
            events.len(),
            command.user.id
        );

        if events.is_empty() {
            command
                .create_interaction_response(&serenity_ctx.http, |response| {
                    response
                        .kind(InteractionResponseType::ChannelMessageWithSource)
                        .interaction_response_data(|msg| {
                            msg.content("📋 No upcoming events right now. Check back later!")
                        })
                })
                .await?;
            return Ok(());
        }

        command
            .create_interaction_response(&serenity_ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|msg| {
                        msg.content(format!("📋 **{} upcoming event(s):**", events.len()))
                    })
            })
            .await?;

        // One follow-up per event so each gets its own button row
        for event in &events {
            let (embed, buttons) = render_event_view(ctx, event, command.user.id.0).await?;
            command
                .create_followup_message(&serenity_ctx.http, |followup| {
                    followup.add_embed(embed).components(|c| {
                        *c = buttons;
                        c
                    })
                })
                .await?;
        }

        Ok(())
    }

    /// Handle /event - show a single event with its subscribe buttons
    async fn handle_show(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let event_id = match get_integer_option(&command.data.options, "id") {
            Some(id) => id,
            None => {
                command
                    .create_interaction_response(&serenity_ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|msg| {
                                msg.content("❌ Please provide an event id.").ephemeral(true)
                            })
                    })
                    .await?;
                return Ok(());
            }
        };

        match ctx.service.get_event(event_id).await {
            Ok(event) => {
                let (embed, buttons) = render_event_view(ctx, &event, command.user.id.0).await?;
                command
                    .create_interaction_response(&serenity_ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|msg| {
                                msg.add_embed(embed).components(|c| {
                                    *c = buttons;
                                    c
                                })
                            })
                    })
                    .await?;
                Ok(())
            }
            Err(EventError::NotFound(_)) => {
                command
                    .create_interaction_response(&serenity_ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|msg| {
                                msg.content(format!("❌ Event #{event_id} was not found."))
                                    .ephemeral(true)
                            })
                    })
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_handler_commands() {
        let handler = EventsHandler;
        let names = handler.command_names();
        assert!(names.contains(&"events"));
        assert!(names.contains(&"event"));
        assert_eq!(names.len(), 2);
    }
}
