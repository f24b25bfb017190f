//! Reminder fanout
//!
//! Executes once per fired timer: loads the event and its subscriber list as
//! they exist at fire time, then delivers to each subscriber independently.
//! A recipient the transport reports as permanently unreachable is
//! unsubscribed on the spot; transient failures are logged and dropped.

use crate::core::error::{SendError, StoreError};
use crate::database::{Database, EventRecord};
use crate::features::reminders::notifier::{Notifier, ReminderMessage};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Per-event delivery broadcast
#[derive(Clone)]
pub struct ReminderDelivery {
    database: Database,
    notifier: Arc<dyn Notifier>,
    timezone: Tz,
}

impl ReminderDelivery {
    pub fn new(database: Database, notifier: Arc<dyn Notifier>, timezone: Tz) -> Self {
        Self {
            database,
            notifier,
            timezone,
        }
    }

    /// Deliver the reminder for `event_id` to its current subscribers
    ///
    /// A missing event (deleted between schedule and fire) is a silent
    /// no-op. Per-recipient failures never abort delivery to the remaining
    /// recipients; only store failures propagate.
    pub async fn deliver(&self, event_id: i64) -> Result<(), StoreError> {
        let event = match self.database.get_event(event_id).await? {
            Some(event) => event,
            None => {
                debug!("Event {event_id} vanished before its reminder fired, nothing to deliver");
                return Ok(());
            }
        };

        let message = compose(&event, self.timezone);
        let subscribers = self.database.list_subscribers(event_id).await?;
        info!(
            "Delivering reminder for event {event_id} to {} subscribers",
            subscribers.len()
        );

        for user_id in subscribers {
            match self.notifier.send(&user_id, &message).await {
                Ok(()) => {}
                Err(SendError::Unreachable(reason)) => {
                    warn!(
                        "Subscriber {user_id} is unreachable ({reason}), dropping their subscription to event {event_id}"
                    );
                    self.database.remove_subscription(&user_id, event_id).await?;
                }
                Err(SendError::Transient(reason)) => {
                    error!("Could not deliver reminder for event {event_id} to {user_id}: {reason}");
                }
            }
        }

        Ok(())
    }
}

/// Compose the reminder from the event payload, start time formatted in the
/// configured timezone
fn compose(event: &EventRecord, timezone: Tz) -> ReminderMessage {
    let local_start = event.start_at.with_timezone(&timezone);
    ReminderMessage {
        text: format!(
            "{}\n📅 {}",
            event.text,
            local_start.format("%d.%m.%Y %H:%M (%Z)")
        ),
        image_url: event.image_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::notifier::testing::RecordingNotifier;
    use chrono::{Duration, Utc};

    async fn setup() -> (Database, Arc<RecordingNotifier>, ReminderDelivery) {
        let db = Database::new(":memory:").await.unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let delivery = ReminderDelivery::new(db.clone(), notifier.clone(), chrono_tz::UTC);
        (db, notifier, delivery)
    }

    #[tokio::test]
    async fn test_deliver_reaches_all_subscribers() {
        let (db, notifier, delivery) = setup().await;
        let id = db
            .create_event(Utc::now() + Duration::hours(1), "Movie night", 30, None)
            .await
            .unwrap();
        db.add_subscription("alice", id, Utc::now()).await.unwrap();
        db.add_subscription("bob", id, Utc::now()).await.unwrap();

        delivery.deliver(id).await.unwrap();

        let mut recipients = notifier.recipients();
        recipients.sort();
        assert_eq!(recipients, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn test_deliver_missing_event_is_noop() {
        let (_db, notifier, delivery) = setup().await;
        delivery.deliver(12345).await.unwrap();
        assert_eq!(notifier.attempt_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_subscriber_is_removed() {
        let (db, notifier, delivery) = setup().await;
        let id = db
            .create_event(Utc::now() + Duration::hours(1), "e", 30, None)
            .await
            .unwrap();
        db.add_subscription("alice", id, Utc::now()).await.unwrap();
        db.add_subscription("bob", id, Utc::now()).await.unwrap();
        notifier.mark_unreachable("alice");

        delivery.deliver(id).await.unwrap();

        // Exactly the failed subscriber is gone; the removal is visible
        // before deliver returns
        assert!(!db.is_subscribed("alice", id).await.unwrap());
        assert!(db.is_subscribed("bob", id).await.unwrap());
        assert_eq!(db.count_subscriptions(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_subscription() {
        let (db, notifier, delivery) = setup().await;
        let id = db
            .create_event(Utc::now() + Duration::hours(1), "e", 30, None)
            .await
            .unwrap();
        db.add_subscription("alice", id, Utc::now()).await.unwrap();
        notifier.mark_transient("alice");

        delivery.deliver(id).await.unwrap();

        assert!(db.is_subscribed("alice", id).await.unwrap());
        assert_eq!(notifier.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_one_failure_never_stops_the_rest() {
        let (db, notifier, delivery) = setup().await;
        let id = db
            .create_event(Utc::now() + Duration::hours(1), "e", 30, None)
            .await
            .unwrap();
        for user in ["a", "b", "c", "d"] {
            db.add_subscription(user, id, Utc::now()).await.unwrap();
        }
        notifier.mark_unreachable("a");
        notifier.mark_transient("b");

        delivery.deliver(id).await.unwrap();

        // All four were attempted despite the two failures
        assert_eq!(notifier.attempt_count(), 4);
        assert_eq!(db.count_subscriptions(id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_message_includes_payload_and_image() {
        let (db, notifier, delivery) = setup().await;
        let id = db
            .create_event(
                Utc::now() + Duration::hours(1),
                "Garage sale",
                30,
                Some("https://example.com/sale.png"),
            )
            .await
            .unwrap();
        db.add_subscription("alice", id, Utc::now()).await.unwrap();

        delivery.deliver(id).await.unwrap();

        let attempts = notifier.attempts();
        assert_eq!(attempts.len(), 1);
        let message = &attempts[0].1;
        assert!(message.text.contains("Garage sale"));
        assert_eq!(
            message.image_url.as_deref(),
            Some("https://example.com/sale.png")
        );
    }
}
