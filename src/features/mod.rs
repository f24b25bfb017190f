//! # Features Layer
//!
//! Feature modules for the herald bot: event management, reminder
//! scheduling and delivery, and short-lived admin sessions.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Add sessions module for the image-attachment flow
//! - 1.0.0: Initial reorganization into feature modules

pub mod events;
pub mod reminders;
pub mod sessions;

// Re-export feature items for convenient access
pub use events::{EventService, NewEvent};
pub use reminders::{
    DiscordNotifier, Notifier, ReminderDelivery, ReminderMessage, ReminderScheduler,
};
pub use sessions::{session_sweep_loop, SessionStore};
