//! Per-event reminder timers
//!
//! Maintains at most one pending timer per event, keyed by event id.
//! Scheduling an event that already has a timer replaces it in place;
//! cancelling removes it; on startup `restore_all` rebuilds the whole table
//! from the database, which is the sole recovery path after a restart.
//!
//! Each pending entry carries a unique token. When a timer elapses, the task
//! first claims its own entry by token; a reschedule or cancel that won the
//! race leaves a different (or no) token behind, so a stale timer can
//! neither fire nor remove its successor. Once the entry is claimed the
//! fanout runs to completion and cannot be aborted.

use crate::core::error::StoreError;
use crate::database::Database;
use crate::features::reminders::delivery::ReminderDelivery;
use crate::features::reminders::notifier::Notifier;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// One installed timer
struct PendingJob {
    token: Uuid,
    fire_at: DateTime<Utc>,
    /// Set right after the timer task is spawned; the slot itself is
    /// reserved first so the task always finds its own entry.
    handle: Option<JoinHandle<()>>,
}

impl PendingJob {
    fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

struct SchedulerInner {
    jobs: DashMap<i64, PendingJob>,
    delivery: ReminderDelivery,
    database: Database,
}

/// Schedules one-shot reminder timers for events
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
}

impl ReminderScheduler {
    pub fn new(database: Database, notifier: Arc<dyn Notifier>, timezone: Tz) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                jobs: DashMap::new(),
                delivery: ReminderDelivery::new(database.clone(), notifier, timezone),
                database,
            }),
        }
    }

    /// Install (or replace) the reminder timer for an event
    ///
    /// The fire time is `start_at` minus the lead. If it has already passed
    /// the reminder window is over: nothing is installed, any stale timer
    /// for the id is dropped, and `false` is returned. Admins may create
    /// near-term or past-dated events; that is not an error.
    pub fn schedule_event(
        &self,
        event_id: i64,
        start_at: DateTime<Utc>,
        reminder_minutes: i64,
    ) -> bool {
        let fire_at = start_at - Duration::minutes(reminder_minutes);
        let now = Utc::now();
        if fire_at <= now {
            self.cancel_event(event_id);
            debug!("Not scheduling event {event_id}: fire time {fire_at} has already passed");
            return false;
        }
        let delay = (fire_at - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        let token = Uuid::new_v4();
        // Reserve the slot before spawning so the timer task always finds
        // its own entry, then stop whatever job it displaced.
        let displaced = self.inner.jobs.insert(
            event_id,
            PendingJob {
                token,
                fire_at,
                handle: None,
            },
        );
        if let Some(job) = displaced {
            job.abort();
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Claim the slot. Losing the claim means a reschedule or cancel
            // superseded this timer while it slept.
            if inner
                .jobs
                .remove_if(&event_id, |_, job| job.token == token)
                .is_none()
            {
                return;
            }
            if let Err(e) = inner.delivery.deliver(event_id).await {
                error!("Reminder delivery for event {event_id} failed: {e}");
            }
        });

        if let Some(mut job) = self.inner.jobs.get_mut(&event_id) {
            if job.token == token {
                job.handle = Some(handle);
            }
        }

        debug!("Scheduled reminder for event {event_id} at {fire_at}");
        true
    }

    /// Remove any pending timer for an event; idempotent
    ///
    /// Only a timer that has not yet claimed its entry can be stopped here.
    /// A fanout already in flight runs to completion.
    pub fn cancel_event(&self, event_id: i64) {
        if let Some((_, job)) = self.inner.jobs.remove(&event_id) {
            job.abort();
            debug!("Cancelled pending reminder for event {event_id}");
        }
    }

    /// Rebuild the timer table from the database
    ///
    /// Called once on startup. Events whose fire time already passed are
    /// skipped by `schedule_event`; running this twice produces the same
    /// table because installation replaces by event id.
    pub async fn restore_all(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let events = self.inner.database.list_future_events(now).await?;
        let total = events.len();
        let mut installed = 0;
        for event in events {
            if self.schedule_event(event.id, event.start_at, event.reminder_minutes) {
                installed += 1;
            }
        }
        info!("Restored {installed} pending reminders from {total} future events");
        Ok(installed)
    }

    /// Number of installed timers
    pub fn pending_count(&self) -> usize {
        self.inner.jobs.len()
    }

    /// Fire time of the installed timer for an event, if any
    pub fn pending_fire_at(&self, event_id: i64) -> Option<DateTime<Utc>> {
        self.inner.jobs.get(&event_id).map(|job| job.fire_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::notifier::testing::RecordingNotifier;
    use std::time::Duration as StdDuration;
    use tokio::time::sleep;

    async fn setup() -> (Database, Arc<RecordingNotifier>, ReminderScheduler) {
        let db = Database::new(":memory:").await.unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let scheduler = ReminderScheduler::new(db.clone(), notifier.clone(), chrono_tz::UTC);
        (db, notifier, scheduler)
    }

    async fn future_event(db: &Database, hours: i64, lead_minutes: i64) -> i64 {
        db.create_event(
            Utc::now() + Duration::hours(hours),
            "test event",
            lead_minutes,
            None,
        )
        .await
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_exactly_once_at_fire_time() {
        let (db, notifier, scheduler) = setup().await;
        let start_at = Utc::now() + Duration::hours(3);
        let id = future_event(&db, 3, 30).await;
        db.add_subscription("alice", id, Utc::now()).await.unwrap();

        assert!(scheduler.schedule_event(id, start_at, 30));
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(
            scheduler.pending_fire_at(id),
            Some(start_at - Duration::minutes(30))
        );

        // Not yet: one minute before the fire time nothing has happened
        sleep(StdDuration::from_secs(2 * 3600 + 29 * 60)).await;
        assert_eq!(notifier.attempt_count(), 0);

        // Cross the fire time
        sleep(StdDuration::from_secs(2 * 60)).await;
        assert_eq!(notifier.attempt_count(), 1);
        assert_eq!(scheduler.pending_count(), 0);

        // And never again
        sleep(StdDuration::from_secs(24 * 3600)).await;
        assert_eq!(notifier.attempt_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_fire_time_installs_nothing() {
        let (db, notifier, scheduler) = setup().await;
        // Lead is larger than the time remaining, so the window is closed
        let start_at = Utc::now() + Duration::minutes(10);
        let id = future_event(&db, 1, 60).await;
        db.add_subscription("alice", id, Utc::now()).await.unwrap();

        assert!(!scheduler.schedule_event(id, start_at, 60));
        assert_eq!(scheduler.pending_count(), 0);

        sleep(StdDuration::from_secs(48 * 3600)).await;
        assert_eq!(notifier.attempt_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_never_double_fires() {
        let (db, notifier, scheduler) = setup().await;
        let id = future_event(&db, 10, 30).await;
        db.add_subscription("alice", id, Utc::now()).await.unwrap();

        let first_start = Utc::now() + Duration::hours(1);
        let second_start = Utc::now() + Duration::hours(5);
        scheduler.schedule_event(id, first_start, 30);
        scheduler.schedule_event(id, second_start, 30);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(
            scheduler.pending_fire_at(id),
            Some(second_start - Duration::minutes(30))
        );

        // Cross the first schedule's fire time: the superseded timer is dead
        sleep(StdDuration::from_secs(2 * 3600)).await;
        assert_eq!(notifier.attempt_count(), 0);

        // Cross the latest schedule's fire time: exactly one firing
        sleep(StdDuration::from_secs(8 * 3600)).await;
        assert_eq!(notifier.attempt_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_into_the_past_drops_stale_timer() {
        let (db, notifier, scheduler) = setup().await;
        let id = future_event(&db, 10, 30).await;
        db.add_subscription("alice", id, Utc::now()).await.unwrap();

        scheduler.schedule_event(id, Utc::now() + Duration::hours(2), 30);
        // New timing whose reminder window is already over
        assert!(!scheduler.schedule_event(id, Utc::now() + Duration::minutes(5), 30));
        assert_eq!(scheduler.pending_count(), 0);

        sleep(StdDuration::from_secs(12 * 3600)).await;
        assert_eq!(notifier.attempt_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let (db, notifier, scheduler) = setup().await;
        let id = future_event(&db, 2, 30).await;
        db.add_subscription("alice", id, Utc::now()).await.unwrap();

        scheduler.schedule_event(id, Utc::now() + Duration::hours(2), 30);
        scheduler.cancel_event(id);
        assert_eq!(scheduler.pending_count(), 0);

        sleep(StdDuration::from_secs(12 * 3600)).await;
        assert_eq!(notifier.attempt_count(), 0);

        // Cancelling again (or cancelling an unknown id) is a no-op
        scheduler.cancel_event(id);
        scheduler.cancel_event(999);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_event_fires_nothing() {
        let (db, notifier, scheduler) = setup().await;
        let start_at = Utc::now() + Duration::hours(2);
        let id = future_event(&db, 2, 30).await;
        db.add_subscription("alice", id, Utc::now()).await.unwrap();
        scheduler.schedule_event(id, start_at, 30);

        // Deleted between schedule and fire but timer left in place: the
        // fanout finds nothing and delivers nothing
        db.delete_event(id).await.unwrap();

        sleep(StdDuration::from_secs(12 * 3600)).await;
        assert_eq!(notifier.attempt_count(), 0);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_all_rebuilds_future_set_idempotently() {
        let (db, _notifier, scheduler) = setup().await;
        let now = Utc::now();
        // One past event, two future ones
        db.create_event(now - Duration::hours(1), "past", 30, None)
            .await
            .unwrap();
        let soon = future_event(&db, 2, 30).await;
        let later = future_event(&db, 6, 45).await;

        let installed = scheduler.restore_all(now).await.unwrap();
        assert_eq!(installed, 2);
        assert_eq!(scheduler.pending_count(), 2);

        let soon_record = db.get_event(soon).await.unwrap().unwrap();
        let later_record = db.get_event(later).await.unwrap().unwrap();
        assert_eq!(scheduler.pending_fire_at(soon), Some(soon_record.fire_at()));
        assert_eq!(
            scheduler.pending_fire_at(later),
            Some(later_record.fire_at())
        );

        // Restoring again yields the same table
        let installed_again = scheduler.restore_all(now).await.unwrap();
        assert_eq!(installed_again, 2);
        assert_eq!(scheduler.pending_count(), 2);
        assert_eq!(scheduler.pending_fire_at(soon), Some(soon_record.fire_at()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_then_fire_once() {
        let (db, notifier, scheduler) = setup().await;
        let id = future_event(&db, 2, 30).await;
        db.add_subscription("alice", id, Utc::now()).await.unwrap();

        scheduler.restore_all(Utc::now()).await.unwrap();
        scheduler.restore_all(Utc::now()).await.unwrap();

        sleep(StdDuration::from_secs(12 * 3600)).await;
        // Double restore still means a single firing
        assert_eq!(notifier.attempt_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_events_fire_independently() {
        let (db, notifier, scheduler) = setup().await;
        let first = future_event(&db, 1, 30).await;
        let second = future_event(&db, 3, 30).await;
        db.add_subscription("alice", first, Utc::now()).await.unwrap();
        db.add_subscription("alice", second, Utc::now()).await.unwrap();

        scheduler.restore_all(Utc::now()).await.unwrap();
        assert_eq!(scheduler.pending_count(), 2);

        sleep(StdDuration::from_secs(3600)).await;
        assert_eq!(notifier.attempt_count(), 1);
        assert_eq!(scheduler.pending_count(), 1);

        sleep(StdDuration::from_secs(2 * 3600)).await;
        assert_eq!(notifier.attempt_count(), 2);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_snapshot_at_fire_time() {
        let (db, notifier, scheduler) = setup().await;
        let start_at = Utc::now() + Duration::hours(3);
        let id = future_event(&db, 3, 30).await;
        db.add_subscription("alice", id, Utc::now()).await.unwrap();
        scheduler.schedule_event(id, start_at, 30);

        // Subscribed after scheduling but before firing: still included
        db.add_subscription("bob", id, Utc::now()).await.unwrap();

        sleep(StdDuration::from_secs(12 * 3600)).await;
        let mut recipients = notifier.recipients();
        recipients.sort();
        assert_eq!(recipients, vec!["alice".to_string(), "bob".to_string()]);
    }
}
