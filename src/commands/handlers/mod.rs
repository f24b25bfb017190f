//! Command handler implementations
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

pub mod admin;
pub mod events;

pub use admin::AdminEventsHandler;
pub use events::EventsHandler;
