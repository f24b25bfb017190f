//! Event orchestration
//!
//! Every mutation that affects reminder timing triggers the matching
//! scheduler call in the same step: create schedules, a timing update
//! reschedules, delete cancels. The presentation layer only ever goes
//! through this service, never to the database or scheduler directly.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Typed EventError results instead of anyhow
//! - 1.0.0: Initial implementation

use crate::core::error::EventError;
use crate::database::{Database, EventPatch, EventRecord};
use crate::features::reminders::ReminderScheduler;
use chrono::{DateTime, Utc};
use log::info;

/// Input for creating an event
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub start_at: DateTime<Utc>,
    pub text: String,
    pub reminder_minutes: i64,
    pub image_url: Option<String>,
}

/// The inbound surface for event and subscription commands
#[derive(Clone)]
pub struct EventService {
    database: Database,
    scheduler: ReminderScheduler,
}

impl EventService {
    pub fn new(database: Database, scheduler: ReminderScheduler) -> Self {
        Self {
            database,
            scheduler,
        }
    }

    /// Create an event and install its reminder timer
    pub async fn create_event(&self, new: NewEvent) -> Result<i64, EventError> {
        if new.reminder_minutes <= 0 {
            return Err(EventError::InvalidLeadTime(new.reminder_minutes));
        }
        let id = self
            .database
            .create_event(
                new.start_at,
                &new.text,
                new.reminder_minutes,
                new.image_url.as_deref(),
            )
            .await?;
        self.scheduler
            .schedule_event(id, new.start_at, new.reminder_minutes);
        info!("Created event {id} starting at {}", new.start_at);
        Ok(id)
    }

    /// Apply a partial update and reschedule if the timing changed
    pub async fn update_event(
        &self,
        event_id: i64,
        patch: EventPatch,
    ) -> Result<EventRecord, EventError> {
        if let Some(minutes) = patch.reminder_minutes {
            if minutes <= 0 {
                return Err(EventError::InvalidLeadTime(minutes));
            }
        }
        let existing = self
            .database
            .get_event(event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;

        self.database.update_event(event_id, &patch).await?;

        let timing_changed = patch.affects_timing();
        let updated = EventRecord {
            id: existing.id,
            start_at: patch.start_at.unwrap_or(existing.start_at),
            text: patch.text.unwrap_or(existing.text),
            image_url: patch.image_url.or(existing.image_url),
            reminder_minutes: patch.reminder_minutes.unwrap_or(existing.reminder_minutes),
        };

        if timing_changed {
            self.scheduler
                .schedule_event(event_id, updated.start_at, updated.reminder_minutes);
            info!("Rescheduled event {event_id} after timing update");
        }

        Ok(updated)
    }

    /// Delete an event, its subscriptions, and its pending timer; idempotent
    pub async fn delete_event(&self, event_id: i64) -> Result<(), EventError> {
        self.database.delete_event(event_id).await?;
        self.scheduler.cancel_event(event_id);
        info!("Deleted event {event_id}");
        Ok(())
    }

    /// Subscribe a user to an event that has not yet started
    ///
    /// Subscribing twice is a no-op. Returns the event for re-rendering.
    pub async fn subscribe(&self, user_id: &str, event_id: i64) -> Result<EventRecord, EventError> {
        let event = self
            .database
            .get_event(event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;
        if event.has_started(Utc::now()) {
            return Err(EventError::EventPassed(event_id));
        }
        self.database
            .add_subscription(user_id, event_id, Utc::now())
            .await?;
        Ok(event)
    }

    /// Remove a user's subscription; idempotent
    pub async fn unsubscribe(&self, user_id: &str, event_id: i64) -> Result<(), EventError> {
        self.database.remove_subscription(user_id, event_id).await?;
        Ok(())
    }

    /// Fetch one event; `NotFound` if it does not exist
    pub async fn get_event(&self, event_id: i64) -> Result<EventRecord, EventError> {
        self.database
            .get_event(event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))
    }

    /// Upcoming events, soonest first
    pub async fn list_future_events(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>, EventError> {
        Ok(self.database.list_future_events(now).await?)
    }

    pub async fn count_subscriptions(&self, event_id: i64) -> Result<i64, EventError> {
        Ok(self.database.count_subscriptions(event_id).await?)
    }

    pub async fn is_subscribed(&self, user_id: &str, event_id: i64) -> Result<bool, EventError> {
        Ok(self.database.is_subscribed(user_id, event_id).await?)
    }

    /// Rebuild all reminder timers from the database after a restart
    pub async fn restore_on_startup(&self, now: DateTime<Utc>) -> Result<usize, EventError> {
        Ok(self.scheduler.restore_all(now).await?)
    }
}
