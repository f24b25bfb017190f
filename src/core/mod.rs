//! # Core Module
//!
//! Core domain types, configuration, and error handling for the herald bot.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Split the error taxonomy out of database.rs into its own module
//! - 1.1.0: Add embeds module with shared event embed builders
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod embeds;
pub mod error;

// Re-export commonly used items
pub use config::Config;
pub use embeds::{event_embed, reminder_embed};
pub use error::{EventError, SendError, StoreError};
