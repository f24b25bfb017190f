//! Bot configuration loaded from environment variables
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Add TIMEZONE for admin-entered local event times
//! - 1.0.0: Initial implementation

use anyhow::{Context as _, Result};
use chrono_tz::Tz;
use std::collections::HashSet;

/// Runtime configuration for the bot
///
/// All values come from the environment (a `.env` file is loaded by the
/// binary before this is constructed). Only `DISCORD_TOKEN` is mandatory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,

    /// Guild ID for development mode (instant command registration)
    pub discord_guild_id: Option<String>,

    /// User IDs allowed to create and manage events
    pub admin_ids: HashSet<u64>,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Default log level filter
    pub log_level: String,

    /// Timezone in which admins enter event times (stored as UTC)
    pub timezone: Tz,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let discord_token =
            std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN environment variable is required")?;

        let discord_guild_id = std::env::var("DISCORD_GUILD_ID").ok();

        let admin_ids = parse_admin_ids(std::env::var("ADMIN_IDS").ok().as_deref());

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "herald.db".to_string());

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timezone = match std::env::var("TIMEZONE") {
            Ok(raw) => raw
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("invalid TIMEZONE '{raw}': {e}"))?,
            Err(_) => chrono_tz::UTC,
        };

        Ok(Self {
            discord_token,
            discord_guild_id,
            admin_ids,
            database_path,
            log_level,
            timezone,
        })
    }

    /// Check whether a user may manage events
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

/// Parse a comma-separated list of user IDs, skipping blanks and junk
fn parse_admin_ids(raw: Option<&str>) -> HashSet<u64> {
    let mut ids = HashSet::new();
    let raw = match raw {
        Some(raw) => raw,
        None => return ids,
    };
    for item in raw.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        match item.parse::<u64>() {
            Ok(id) => {
                ids.insert(id);
            }
            Err(_) => {
                log::warn!("Ignoring malformed admin id in ADMIN_IDS: {item}");
            }
        }
    }
    ids
}
