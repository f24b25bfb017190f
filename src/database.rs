//! # Database Layer
//!
//! SQLite persistence for events and subscriptions. The `Database` handle is
//! cheap to clone and internally serialized, so it can be shared across the
//! command handlers, the reminder scheduler, and background tasks.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Typed StoreError instead of anyhow at this layer
//! - 2.0.0: Events + subscriptions schema, RFC 3339 UTC timestamps
//! - 1.0.0: Initial implementation

use crate::core::error::StoreError;
use chrono::{DateTime, Duration, Utc};
use sqlite::{Connection, State, Statement};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A stored event row
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Unique, monotonically assigned identifier
    pub id: i64,

    /// The moment the event itself occurs (UTC)
    pub start_at: DateTime<Utc>,

    /// Announce text shown in event views and reminders
    pub text: String,

    /// Optional image shown alongside the text
    pub image_url: Option<String>,

    /// How many minutes before `start_at` the reminder fires
    pub reminder_minutes: i64,
}

impl EventRecord {
    /// The derived instant at which the reminder for this event fires
    pub fn fire_at(&self) -> DateTime<Utc> {
        self.start_at - Duration::minutes(self.reminder_minutes)
    }

    /// Whether the event has already started at `now`
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_at <= now
    }
}

/// Partial update for an event; unset fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub start_at: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub reminder_minutes: Option<i64>,
}

impl EventPatch {
    /// Whether applying this patch changes the derived reminder fire time
    pub fn affects_timing(&self) -> bool {
        self.start_at.is_some() || self.reminder_minutes.is_some()
    }
}

/// Shared handle to the SQLite database
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema exists
    ///
    /// Pass `":memory:"` for an ephemeral database in tests.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let connection = Connection::open(path)?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_at TEXT NOT NULL,
                text TEXT NOT NULL,
                image_url TEXT,
                reminder_minutes INTEGER NOT NULL
            )",
        )?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS subscriptions (
                user_id TEXT NOT NULL,
                event_id INTEGER NOT NULL,
                subscribed_at TEXT NOT NULL,
                PRIMARY KEY (user_id, event_id),
                FOREIGN KEY (event_id) REFERENCES events (id)
            )",
        )?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    // Events

    /// Insert a new event and return its assigned id
    pub async fn create_event(
        &self,
        start_at: DateTime<Utc>,
        text: &str,
        reminder_minutes: i64,
        image_url: Option<&str>,
    ) -> Result<i64, StoreError> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(
            "INSERT INTO events (start_at, text, image_url, reminder_minutes)
             VALUES (?, ?, ?, ?)",
        )?;
        statement.bind((1, start_at.to_rfc3339().as_str()))?;
        statement.bind((2, text))?;
        statement.bind((3, image_url))?;
        statement.bind((4, reminder_minutes))?;
        drive(&mut statement)?;

        let mut statement = connection.prepare("SELECT last_insert_rowid()")?;
        statement.next()?;
        Ok(statement.read::<i64, _>(0)?)
    }

    /// Apply a partial update; fields not present in the patch keep their value
    ///
    /// Updating a nonexistent id is a no-op at this layer; callers that need
    /// to distinguish do a `get_event` first.
    pub async fn update_event(&self, event_id: i64, patch: &EventPatch) -> Result<(), StoreError> {
        let mut assignments = Vec::new();
        if patch.start_at.is_some() {
            assignments.push("start_at = ?");
        }
        if patch.text.is_some() {
            assignments.push("text = ?");
        }
        if patch.image_url.is_some() {
            assignments.push("image_url = ?");
        }
        if patch.reminder_minutes.is_some() {
            assignments.push("reminder_minutes = ?");
        }
        if assignments.is_empty() {
            return Ok(());
        }

        let query = format!("UPDATE events SET {} WHERE id = ?", assignments.join(", "));
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(&query)?;
        let mut index = 1;
        if let Some(start_at) = &patch.start_at {
            statement.bind((index, start_at.to_rfc3339().as_str()))?;
            index += 1;
        }
        if let Some(text) = &patch.text {
            statement.bind((index, text.as_str()))?;
            index += 1;
        }
        if let Some(url) = &patch.image_url {
            statement.bind((index, url.as_str()))?;
            index += 1;
        }
        if let Some(minutes) = patch.reminder_minutes {
            statement.bind((index, minutes))?;
            index += 1;
        }
        statement.bind((index, event_id))?;
        drive(&mut statement)
    }

    /// Fetch one event
    pub async fn get_event(&self, event_id: i64) -> Result<Option<EventRecord>, StoreError> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare("SELECT * FROM events WHERE id = ?")?;
        statement.bind((1, event_id))?;
        if let State::Row = statement.next()? {
            Ok(Some(read_event(&statement)?))
        } else {
            Ok(None)
        }
    }

    /// Delete an event and all of its subscriptions
    ///
    /// Idempotent: deleting an id that does not exist is a no-op.
    pub async fn delete_event(&self, event_id: i64) -> Result<(), StoreError> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare("DELETE FROM subscriptions WHERE event_id = ?")?;
        statement.bind((1, event_id))?;
        drive(&mut statement)?;
        let mut statement = connection.prepare("DELETE FROM events WHERE id = ?")?;
        statement.bind((1, event_id))?;
        drive(&mut statement)
    }

    /// All events with `start_at` strictly after `now`, soonest first
    pub async fn list_future_events(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let connection = self.connection.lock().await;
        let mut statement =
            connection.prepare("SELECT * FROM events WHERE start_at > ? ORDER BY start_at")?;
        statement.bind((1, now.to_rfc3339().as_str()))?;
        let mut events = Vec::new();
        while let State::Row = statement.next()? {
            events.push(read_event(&statement)?);
        }
        Ok(events)
    }

    // Subscriptions

    /// Record a subscription; subscribing twice leaves exactly one row
    pub async fn add_subscription(
        &self,
        user_id: &str,
        event_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let connection = self.connection.lock().await;
        let mut statement = connection.prepare(
            "INSERT OR IGNORE INTO subscriptions (user_id, event_id, subscribed_at)
             VALUES (?, ?, ?)",
        )?;
        statement.bind((1, user_id))?;
        statement.bind((2, event_id))?;
        statement.bind((3, now.to_rfc3339().as_str()))?;
        drive(&mut statement)
    }

    /// Remove a subscription; removing one that does not exist is a no-op
    pub async fn remove_subscription(
        &self,
        user_id: &str,
        event_id: i64,
    ) -> Result<(), StoreError> {
        let connection = self.connection.lock().await;
        let mut statement =
            connection.prepare("DELETE FROM subscriptions WHERE user_id = ? AND event_id = ?")?;
        statement.bind((1, user_id))?;
        statement.bind((2, event_id))?;
        drive(&mut statement)
    }

    /// Whether `user_id` is subscribed to `event_id`
    pub async fn is_subscribed(&self, user_id: &str, event_id: i64) -> Result<bool, StoreError> {
        let connection = self.connection.lock().await;
        let mut statement = connection
            .prepare("SELECT 1 FROM subscriptions WHERE user_id = ? AND event_id = ?")?;
        statement.bind((1, user_id))?;
        statement.bind((2, event_id))?;
        Ok(matches!(statement.next()?, State::Row))
    }

    /// Number of subscribers for an event
    pub async fn count_subscriptions(&self, event_id: i64) -> Result<i64, StoreError> {
        let connection = self.connection.lock().await;
        let mut statement =
            connection.prepare("SELECT COUNT(*) FROM subscriptions WHERE event_id = ?")?;
        statement.bind((1, event_id))?;
        statement.next()?;
        Ok(statement.read::<i64, _>(0)?)
    }

    /// All subscriber ids for an event
    pub async fn list_subscribers(&self, event_id: i64) -> Result<Vec<String>, StoreError> {
        let connection = self.connection.lock().await;
        let mut statement =
            connection.prepare("SELECT user_id FROM subscriptions WHERE event_id = ?")?;
        statement.bind((1, event_id))?;
        let mut subscribers = Vec::new();
        while let State::Row = statement.next()? {
            subscribers.push(statement.read::<String, _>(0)?);
        }
        Ok(subscribers)
    }
}

/// Step a non-query statement to completion
fn drive(statement: &mut Statement) -> Result<(), StoreError> {
    while statement.next()? != State::Done {}
    Ok(())
}

/// Map the current row of a `SELECT * FROM events` statement to a record
fn read_event(statement: &Statement) -> Result<EventRecord, StoreError> {
    let raw_start = statement.read::<String, _>("start_at")?;
    Ok(EventRecord {
        id: statement.read::<i64, _>("id")?,
        start_at: parse_timestamp("start_at", &raw_start)?,
        text: statement.read::<String, _>("text")?,
        image_url: statement.read::<Option<String>, _>("image_url")?,
        reminder_minutes: statement.read::<i64, _>("reminder_minutes")?,
    })
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| StoreError::MalformedTimestamp {
            column,
            value: value.to_string(),
        })
}
