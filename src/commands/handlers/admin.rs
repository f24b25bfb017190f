//! Admin event management command handlers
//!
//! Handles: event_create, event_edit, event_delete
//!
//! - **Version**: 1.1.0
//! - **Since**: 2.0.0
//!
//! ## Changelog
//! - 1.1.0: Attach-image session after create
//! - 1.0.0: Initial implementation

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::info;
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::slash::{get_integer_option, get_string_option};
use crate::components::render_event_view;
use crate::core::error::EventError;
use crate::database::EventPatch;
use crate::features::events::NewEvent;

/// Accepted format for event times, interpreted in the configured timezone
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Handler for the admin event management commands
pub struct AdminEventsHandler;

#[async_trait]
impl SlashCommandHandler for AdminEventsHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["event_create", "event_edit", "event_delete"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        if !ctx.is_admin(command.user.id.0) {
            return reply_ephemeral(serenity_ctx, command, "❌ Only admins can manage events.")
                .await;
        }
        match command.data.name.as_str() {
            "event_create" => self.handle_create(&ctx, serenity_ctx, command).await,
            "event_edit" => self.handle_edit(&ctx, serenity_ctx, command).await,
            "event_delete" => self.handle_delete(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl AdminEventsHandler {
    /// Handle /event_create - create an event and offer the image step
    async fn handle_create(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let when_raw = get_string_option(&command.data.options, "when")
            .ok_or_else(|| anyhow::anyhow!("Missing when parameter"))?;
        let text = get_string_option(&command.data.options, "text")
            .ok_or_else(|| anyhow::anyhow!("Missing text parameter"))?;
        let reminder_minutes = get_integer_option(&command.data.options, "remind_minutes")
            .ok_or_else(|| anyhow::anyhow!("Missing remind_minutes parameter"))?;
        let image_url = get_string_option(&command.data.options, "image_url");

        let start_at = match parse_event_time(&when_raw, ctx.timezone()) {
            Some(start_at) => start_at,
            None => {
                return reply_ephemeral(
                    serenity_ctx,
                    command,
                    "❌ Invalid date. Use the format `YYYY-MM-DD HH:MM`, e.g. `2027-12-31 19:30`.",
                )
                .await;
            }
        };

        let created = ctx
            .service
            .create_event(NewEvent {
                start_at,
                text,
                reminder_minutes,
                image_url: image_url.clone(),
            })
            .await;
        let event_id = match created {
            Ok(id) => id,
            Err(EventError::InvalidLeadTime(_)) => {
                return reply_ephemeral(
                    serenity_ctx,
                    command,
                    "❌ The reminder lead time must be a positive number of minutes.",
                )
                .await;
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Admin {} created event {event_id} starting at {start_at}",
            command.user.id
        );

        let event = ctx.service.get_event(event_id).await?;
        let (embed, buttons) = render_event_view(ctx, &event, command.user.id.0).await?;
        command
            .create_interaction_response(&serenity_ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|msg| {
                        msg.content(format!("✅ Event #{event_id} created."))
                            .add_embed(embed)
                            .components(|c| {
                                *c = buttons;
                                c
                            })
                    })
            })
            .await?;

        // Offer the image step unless an image was already provided
        if image_url.is_none() {
            ctx.sessions.begin_attach_image(command.user.id.0, event_id);
            command
                .create_followup_message(&serenity_ctx.http, |followup| {
                    followup
                        .content("🖼 Send the event image as your next message, or skip.")
                        .ephemeral(true)
                        .components(|c| {
                            c.create_action_row(|row| {
                                row.create_button(|b| {
                                    b.custom_id("admin:image_skip")
                                        .label("Skip")
                                        .style(ButtonStyle::Secondary)
                                })
                            })
                        })
                })
                .await?;
        }

        Ok(())
    }

    /// Handle /event_edit - partial update; timing changes reschedule
    async fn handle_edit(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let event_id = match get_integer_option(&command.data.options, "id") {
            Some(id) => id,
            None => {
                return reply_ephemeral(serenity_ctx, command, "❌ Please provide an event id.")
                    .await;
            }
        };

        let mut patch = EventPatch {
            text: get_string_option(&command.data.options, "text"),
            image_url: get_string_option(&command.data.options, "image_url"),
            reminder_minutes: get_integer_option(&command.data.options, "remind_minutes"),
            ..Default::default()
        };

        if let Some(when_raw) = get_string_option(&command.data.options, "when") {
            match parse_event_time(&when_raw, ctx.timezone()) {
                Some(start_at) => patch.start_at = Some(start_at),
                None => {
                    return reply_ephemeral(
                        serenity_ctx,
                        command,
                        "❌ Invalid date. Use the format `YYYY-MM-DD HH:MM`.",
                    )
                    .await;
                }
            }
        }

        if patch.start_at.is_none()
            && patch.text.is_none()
            && patch.image_url.is_none()
            && patch.reminder_minutes.is_none()
        {
            return reply_ephemeral(serenity_ctx, command, "Nothing to change.").await;
        }

        match ctx.service.update_event(event_id, patch).await {
            Ok(updated) => {
                info!("Admin {} edited event {event_id}", command.user.id);
                let (embed, buttons) =
                    render_event_view(ctx, &updated, command.user.id.0).await?;
                command
                    .create_interaction_response(&serenity_ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|msg| {
                                msg.content(format!("✅ Event #{event_id} updated."))
                                    .add_embed(embed)
                                    .components(|c| {
                                        *c = buttons;
                                        c
                                    })
                            })
                    })
                    .await?;
                Ok(())
            }
            Err(EventError::NotFound(_)) => {
                reply_ephemeral(
                    serenity_ctx,
                    command,
                    &format!("❌ Event #{event_id} was not found."),
                )
                .await
            }
            Err(EventError::InvalidLeadTime(_)) => {
                reply_ephemeral(
                    serenity_ctx,
                    command,
                    "❌ The reminder lead time must be a positive number of minutes.",
                )
                .await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Handle /event_delete - ask for confirmation via button
    async fn handle_delete(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let event_id = match get_integer_option(&command.data.options, "id") {
            Some(id) => id,
            None => {
                return reply_ephemeral(serenity_ctx, command, "❌ Please provide an event id.")
                    .await;
            }
        };

        // No point confirming an id that does not exist
        if let Err(EventError::NotFound(_)) = ctx.service.get_event(event_id).await {
            return reply_ephemeral(
                serenity_ctx,
                command,
                &format!("❌ Event #{event_id} was not found."),
            )
            .await;
        }

        command
            .create_interaction_response(&serenity_ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|msg| {
                        msg.content(format!(
                            "Delete event #{event_id}? All subscriptions will be removed."
                        ))
                        .ephemeral(true)
                        .components(|c| {
                            c.create_action_row(|row| {
                                row.create_button(|b| {
                                    b.custom_id(format!("admin:confirm_delete:{event_id}"))
                                        .label("Yes, delete it")
                                        .style(ButtonStyle::Danger)
                                })
                            })
                        })
                    })
            })
            .await?;
        Ok(())
    }
}

/// Parse an admin-entered local time into a UTC instant
///
/// Ambiguous local times (DST fold) resolve to the earlier instant; times
/// skipped by a DST gap are rejected.
pub fn parse_event_time(raw: &str, timezone: Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()?;
    match timezone.from_local_datetime(&naive) {
        LocalResult::Single(local) => Some(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

async fn reply_ephemeral(
    serenity_ctx: &Context,
    command: &ApplicationCommandInteraction,
    text: &str,
) -> Result<()> {
    command
        .create_interaction_response(&serenity_ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|msg| msg.content(text).ephemeral(true))
        })
        .await?;
    Ok(())
}
