//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: EventService + SessionStore instead of raw database access
//! - 1.0.0: Initial implementation

use crate::core::config::Config;
use crate::features::events::EventService;
use crate::features::sessions::SessionStore;
use chrono_tz::Tz;

/// Shared context for all command and component handlers
///
/// Everything a handler needs: the event service (the only path to the
/// database and scheduler), the admin session store, and the configuration
/// for admin gating and timezone display.
#[derive(Clone)]
pub struct CommandContext {
    pub service: EventService,
    pub sessions: SessionStore,
    pub config: Config,
}

impl CommandContext {
    pub fn new(service: EventService, sessions: SessionStore, config: Config) -> Self {
        Self {
            service,
            sessions,
            config,
        }
    }

    /// Whether this user may manage events
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.config.is_admin(user_id)
    }

    /// Timezone used to display and parse event times
    pub fn timezone(&self) -> Tz {
        self.config.timezone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_context_clone() {
        // CommandContext must be Clone for sharing across handlers
        fn assert_clone<T: Clone>() {}
        assert_clone::<CommandContext>();
    }
}
