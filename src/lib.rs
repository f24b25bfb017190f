// Core layer - shared types, configuration, and errors
pub mod core;

// Features layer - events, reminders, sessions
pub mod features;

// Infrastructure
pub mod database;

// Application layer
pub mod command_handler;
pub mod commands;
pub mod components;

// Re-export core config for convenient access
pub use self::core::Config;

// Re-export the database handle and row types
pub use database::{Database, EventPatch, EventRecord};

// Re-export feature items
pub use features::{
    // Events
    EventService, NewEvent,
    // Reminders
    DiscordNotifier, Notifier, ReminderMessage, ReminderScheduler,
    // Sessions
    SessionStore,
};
