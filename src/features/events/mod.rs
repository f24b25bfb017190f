//! # Events Feature
//!
//! Event management: the orchestration layer between the presentation
//! front-end, the database, and the reminder scheduler.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

pub mod service;

pub use service::{EventService, NewEvent};
