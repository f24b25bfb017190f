//! Error taxonomy for the event and reminder core
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.2.0
//!
//! ## Changelog
//! - 1.0.0: Extracted from ad-hoc anyhow errors in database.rs and scheduler.rs

use thiserror::Error;

/// A failure of the durable store itself
///
/// These are always propagated to the caller; a schedule or cancel request is
/// never silently dropped on storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlite::Error),

    /// A stored timestamp failed to parse back. Rows are only ever written
    /// through [`crate::database::Database`], so this indicates outside
    /// tampering or corruption.
    #[error("malformed timestamp in column {column}: {value}")]
    MalformedTimestamp {
        column: &'static str,
        value: String,
    },
}

/// Outcome kinds for event and subscription operations
///
/// The presentation layer turns these into human messages; the core only
/// distinguishes the kinds.
#[derive(Debug, Error)]
pub enum EventError {
    /// Reminder lead time must be a positive number of minutes
    #[error("reminder lead time must be positive, got {0}")]
    InvalidLeadTime(i64),

    /// The event does not exist
    #[error("event {0} not found")]
    NotFound(i64),

    /// The event has already started; subscribing is no longer possible
    #[error("event {0} has already started")]
    EventPassed(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-recipient delivery failure
///
/// Contained entirely within the reminder fanout: an unreachable recipient is
/// unsubscribed, a transient failure is logged and dropped. Neither ever
/// aborts delivery to the remaining recipients.
#[derive(Debug, Error)]
pub enum SendError {
    /// The recipient can never be reached again (blocked the bot, deleted
    /// account). Triggers automatic unsubscription.
    #[error("recipient is permanently unreachable: {0}")]
    Unreachable(String),

    /// A failure that might not recur (rate limit, timeout, server error).
    /// Logged and dropped; a one-shot reminder is not worth retrying after
    /// its moment has passed.
    #[error("transient delivery failure: {0}")]
    Transient(String),
}
