//! Event embed builders for Discord responses
//!
//! Shared embed construction for event views and reminder messages.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//!
//! ## Changelog
//! - 1.0.0: Extracted from duplicate implementations in the command and component handlers

use crate::database::EventRecord;
use crate::features::reminders::ReminderMessage;
use chrono_tz::Tz;
use serenity::builder::CreateEmbed;

/// Accent color for event views
const EVENT_COLOR: u32 = 0x5B8DEF;

/// Accent color for fired reminders
const REMINDER_COLOR: u32 = 0xF0A202;

/// Build the standard event view: announce text, local start time, subscriber count.
///
/// Callers needing extras (footer, buttons) chain on the returned embed.
pub fn event_embed(event: &EventRecord, subscriber_count: i64, timezone: Tz) -> CreateEmbed {
    let local_start = event.start_at.with_timezone(&timezone);
    let mut embed = CreateEmbed::default();
    embed.color(EVENT_COLOR);
    embed.description(&event.text);
    embed.field(
        "📅 Starts",
        local_start.format("%d.%m.%Y %H:%M (%Z)").to_string(),
        true,
    );
    embed.field("👥 Subscribers", subscriber_count.to_string(), true);
    embed.footer(|f| f.text(format!("Event #{}", event.id)));
    if let Some(url) = &event.image_url {
        embed.image(url);
    }
    embed
}

/// Build the reminder embed delivered to each subscriber at fire time.
pub fn reminder_embed(message: &ReminderMessage) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed.color(REMINDER_COLOR);
    embed.title("⏰ Starting soon!");
    embed.description(&message.text);
    if let Some(url) = &message.image_url {
        embed.image(url);
    }
    embed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn test_event(image_url: Option<String>) -> EventRecord {
        EventRecord {
            id: 42,
            start_at: Utc.with_ymd_and_hms(2030, 12, 31, 19, 30, 0).unwrap(),
            text: "Winter meetup".to_string(),
            image_url,
            reminder_minutes: 30,
        }
    }

    #[test]
    fn test_event_embed_builds() {
        // CreateEmbed is opaque; if it builds without panic, it's correct
        let _embed = event_embed(&test_event(None), 3, chrono_tz::UTC);
    }

    #[test]
    fn test_event_embed_with_image() {
        let _embed = event_embed(
            &test_event(Some("https://example.com/poster.png".to_string())),
            0,
            chrono_tz::Europe::Moscow,
        );
    }

    #[test]
    fn test_reminder_embed_builds() {
        let message = ReminderMessage {
            text: "Winter meetup\n📅 31.12.2030 19:30".to_string(),
            image_url: None,
        };
        let _embed = reminder_embed(&message);
    }
}
