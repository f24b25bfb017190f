//! Command handler registry
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::SlashCommandHandler;

/// Maps command names to their handlers
///
/// A handler is registered under every name it declares, so related
/// commands can share one implementation.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn SlashCommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for its declared command names
    pub fn register(&mut self, handler: Arc<dyn SlashCommandHandler>) {
        for name in handler.command_names() {
            self.handlers.insert(name, Arc::clone(&handler));
        }
    }

    /// Look up the handler for a command name
    pub fn get(&self, name: &str) -> Option<Arc<dyn SlashCommandHandler>> {
        self.handlers.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::CommandContext;
    use anyhow::Result;
    use async_trait::async_trait;
    use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
    use serenity::prelude::Context;

    struct StubHandler {
        names: &'static [&'static str],
    }

    #[async_trait]
    impl SlashCommandHandler for StubHandler {
        fn command_names(&self) -> &'static [&'static str] {
            self.names
        }

        async fn handle(
            &self,
            _ctx: Arc<CommandContext>,
            _serenity_ctx: &Context,
            _command: &ApplicationCommandInteraction,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(StubHandler {
            names: &["events", "event"],
        }));

        assert!(registry.get("events").is_some());
        assert!(registry.get("event").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_shared_handler_for_multiple_names() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(StubHandler {
            names: &["a", "b"],
        }));

        let first = registry.get("a").unwrap();
        let second = registry.get("b").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
