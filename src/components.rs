//! # Message Components
//!
//! Button interactions: subscribe/unsubscribe toggles on event views, the
//! admin delete confirmation, and the image-skip shortcut. Custom ids carry
//! the action and the event id (`event:sub:42`); everything else about an
//! interaction is looked up fresh so the view always re-renders from
//! current data.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 2.0.0: Event subscription buttons replacing the legacy menu components
//! - 1.0.0: Initial implementation

use anyhow::Result;
use log::{debug, info, warn};
use serenity::builder::{CreateComponents, CreateEmbed};
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::core::embeds::event_embed;
use crate::core::error::EventError;
use crate::database::EventRecord;

/// A parsed button action
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentAction {
    Subscribe(i64),
    Unsubscribe(i64),
    Refresh(i64),
    Delete(i64),
    ConfirmDelete(i64),
    ImageSkip,
}

/// Parse a button custom id; unknown ids return None and are ignored
pub fn parse_custom_id(custom_id: &str) -> Option<ComponentAction> {
    if custom_id == "admin:image_skip" {
        return Some(ComponentAction::ImageSkip);
    }
    let mut parts = custom_id.splitn(3, ':');
    let scope = parts.next()?;
    let verb = parts.next()?;
    let id = parts.next()?.parse::<i64>().ok()?;
    match (scope, verb) {
        ("event", "sub") => Some(ComponentAction::Subscribe(id)),
        ("event", "unsub") => Some(ComponentAction::Unsubscribe(id)),
        ("event", "refresh") => Some(ComponentAction::Refresh(id)),
        ("admin", "delete") => Some(ComponentAction::Delete(id)),
        ("admin", "confirm_delete") => Some(ComponentAction::ConfirmDelete(id)),
        _ => None,
    }
}

/// Build the button row for an event view
pub fn event_buttons(event_id: i64, subscribed: bool, is_admin: bool) -> CreateComponents {
    let mut components = CreateComponents::default();
    components.create_action_row(|row| {
        if subscribed {
            row.create_button(|b| {
                b.custom_id(format!("event:unsub:{event_id}"))
                    .label("🔕 Stop reminding me")
                    .style(ButtonStyle::Secondary)
            });
        } else {
            row.create_button(|b| {
                b.custom_id(format!("event:sub:{event_id}"))
                    .label("🔔 Remind me")
                    .style(ButtonStyle::Primary)
            });
        }
        row.create_button(|b| {
            b.custom_id(format!("event:refresh:{event_id}"))
                .label("Refresh")
                .style(ButtonStyle::Secondary)
        });
        if is_admin {
            row.create_button(|b| {
                b.custom_id(format!("admin:delete:{event_id}"))
                    .label("🗑 Delete")
                    .style(ButtonStyle::Danger)
            });
        }
        row
    });
    components
}

/// Render the embed + buttons for one event as seen by `viewer_id`
pub async fn render_event_view(
    context: &CommandContext,
    event: &EventRecord,
    viewer_id: u64,
) -> Result<(CreateEmbed, CreateComponents), EventError> {
    let count = context.service.count_subscriptions(event.id).await?;
    let subscribed = context
        .service
        .is_subscribed(&viewer_id.to_string(), event.id)
        .await?;
    let embed = event_embed(event, count, context.timezone());
    let buttons = event_buttons(event.id, subscribed, context.is_admin(viewer_id));
    Ok((embed, buttons))
}

/// Handler for all button interactions
pub struct EventComponentHandler {
    context: Arc<CommandContext>,
}

impl EventComponentHandler {
    pub fn new(context: Arc<CommandContext>) -> Self {
        Self { context }
    }

    pub async fn handle_component_interaction(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
    ) -> Result<()> {
        let action = match parse_custom_id(&component.data.custom_id) {
            Some(action) => action,
            None => {
                debug!("Ignoring unknown component id: {}", component.data.custom_id);
                return Ok(());
            }
        };
        let user_id = component.user.id.0;

        match action {
            ComponentAction::Subscribe(event_id) => {
                match self
                    .context
                    .service
                    .subscribe(&user_id.to_string(), event_id)
                    .await
                {
                    Ok(event) => {
                        info!("User {user_id} subscribed to event {event_id}");
                        self.update_view(ctx, component, &event).await
                    }
                    Err(EventError::NotFound(_)) | Err(EventError::EventPassed(_)) => {
                        self.notice(ctx, component, "This event is no longer available.")
                            .await
                    }
                    Err(e) => Err(e.into()),
                }
            }
            ComponentAction::Unsubscribe(event_id) => {
                self.context
                    .service
                    .unsubscribe(&user_id.to_string(), event_id)
                    .await?;
                info!("User {user_id} unsubscribed from event {event_id}");
                self.refresh(ctx, component, event_id).await
            }
            ComponentAction::Refresh(event_id) => self.refresh(ctx, component, event_id).await,
            ComponentAction::Delete(event_id) => {
                if !self.context.is_admin(user_id) {
                    return self.notice(ctx, component, "Only admins can do that.").await;
                }
                self.confirm_delete(ctx, component, event_id).await
            }
            ComponentAction::ConfirmDelete(event_id) => {
                if !self.context.is_admin(user_id) {
                    return self.notice(ctx, component, "Only admins can do that.").await;
                }
                self.context.service.delete_event(event_id).await?;
                info!("Admin {user_id} deleted event {event_id}");
                component
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::UpdateMessage)
                            .interaction_response_data(|msg| {
                                msg.content(format!("🗑 Event #{event_id} deleted."))
                                    .components(|c| c)
                            })
                    })
                    .await?;
                Ok(())
            }
            ComponentAction::ImageSkip => {
                if self.context.sessions.clear(user_id) {
                    self.notice(ctx, component, "Okay, no image attached.").await
                } else {
                    self.notice(ctx, component, "Nothing to skip.").await
                }
            }
        }
    }

    /// Re-render the event view in place
    async fn refresh(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
        event_id: i64,
    ) -> Result<()> {
        match self.context.service.get_event(event_id).await {
            Ok(event) => self.update_view(ctx, component, &event).await,
            Err(EventError::NotFound(_)) => {
                self.notice(ctx, component, "This event is no longer available.")
                    .await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_view(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
        event: &EventRecord,
    ) -> Result<()> {
        let (embed, buttons) = render_event_view(&self.context, event, component.user.id.0).await?;
        component
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::UpdateMessage)
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

    /// Ephemeral text reply for outcomes that should not touch the view
    async fn notice(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
        text: &str,
    ) -> Result<()> {
        component
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|msg| msg.content(text).ephemeral(true))
            })
            .await?;
        Ok(())
    }

    async fn confirm_delete(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
        event_id: i64,
    ) -> Result<()> {
        warn!("Admin {} asked to delete event {event_id}", component.user.id.0);
        component
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|msg| {
                        msg.content(format!("Delete event #{event_id}? This cannot be undone."))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscribe_actions() {
        assert_eq!(
            parse_custom_id("event:sub:42"),
            Some(ComponentAction::Subscribe(42))
        );
        assert_eq!(
            parse_custom_id("event:unsub:42"),
            Some(ComponentAction::Unsubscribe(42))
        );
        assert_eq!(
            parse_custom_id("event:refresh:7"),
            Some(ComponentAction::Refresh(7))
        );
    }

    #[test]
    fn test_parse_admin_actions() {
        assert_eq!(
            parse_custom_id("admin:delete:3"),
            Some(ComponentAction::Delete(3))
        );
        assert_eq!(
            parse_custom_id("admin:confirm_delete:3"),
            Some(ComponentAction::ConfirmDelete(3))
        );
        assert_eq!(
            parse_custom_id("admin:image_skip"),
            Some(ComponentAction::ImageSkip)
        );
    }

    #[test]
    fn test_parse_rejects_junk() {
        assert_eq!(parse_custom_id(""), None);
        assert_eq!(parse_custom_id("event:sub"), None);
        assert_eq!(parse_custom_id("event:sub:notanumber"), None);
        assert_eq!(parse_custom_id("something:else:1"), None);
        assert_eq!(parse_custom_id("event:promote:1"), None);
    }

    #[test]
    fn test_event_buttons_build() {
        // Builders are opaque; building without panic is the contract
        let _subscribed = event_buttons(1, true, false);
        let _unsubscribed = event_buttons(1, false, false);
        let _admin = event_buttons(1, false, true);
    }
}
