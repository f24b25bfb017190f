//! # Reminders Feature
//!
//! One-shot reminder scheduling and delivery for future events. Each event
//! holds at most one pending timer; at fire time the reminder fans out to the
//! subscribers on record at that moment.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Per-event timers replacing the old minute-poll loop
//! - 1.0.0: Initial release

pub mod delivery;
pub mod discord;
pub mod notifier;
pub mod scheduler;

pub use delivery::ReminderDelivery;
pub use discord::DiscordNotifier;
pub use notifier::{Notifier, ReminderMessage};
pub use scheduler::ReminderScheduler;
