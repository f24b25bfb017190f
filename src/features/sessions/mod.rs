//! # Sessions Feature
//!
//! Short-lived admin conversation state, currently only the "send me the
//! image as your next message" step after creating or editing an event.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//! - **Toggleable**: false

pub mod store;

pub use store::{session_sweep_loop, PendingAction, SessionStore};
