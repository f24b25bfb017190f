use anyhow::Result;
use chrono::Utc;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;

use herald::command_handler::CommandHandler;
use herald::commands::{register_global_commands, register_guild_commands, CommandContext};
use herald::components::EventComponentHandler;
use herald::core::Config;
use herald::database::Database;
use herald::features::reminders::{DiscordNotifier, Notifier, ReminderScheduler};
use herald::features::sessions::{session_sweep_loop, SessionStore};
use herald::features::EventService;

struct Handler {
    command_handler: Arc<CommandHandler>,
    component_handler: Arc<EventComponentHandler>,
    guild_id: Option<GuildId>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if let Err(e) = self.command_handler.handle_message(&ctx, &msg).await {
            error!("Error handling message: {e}");
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        // Guild commands for development (instant), global for production
        if let Some(guild_id) = self.guild_id {
            info!("🔧 Development mode: Registering commands for guild {guild_id}");
            if let Err(e) = register_guild_commands(&ctx, guild_id).await {
                error!("❌ Failed to register guild slash commands: {e}");
            }
        } else {
            info!("🌍 Production mode: Registering commands globally");
            if let Err(e) = register_global_commands(&ctx).await {
                error!("❌ Failed to register global slash commands: {e}");
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                if let Err(e) = self
                    .command_handler
                    .handle_slash_command(&ctx, &command)
                    .await
                {
                    error!(
                        "Error handling slash command '{}': {}",
                        command.data.name, e
                    );
                    let _ = command
                        .create_interaction_response(&ctx.http, |response| {
                            response
                                .kind(serenity::model::application::interaction::InteractionResponseType::ChannelMessageWithSource)
                                .interaction_response_data(|message| {
                                    message
                                        .content("❌ Sorry, something went wrong processing your command. Please try again.")
                                        .ephemeral(true)
                                })
                        })
                        .await;
                }
            }
            Interaction::MessageComponent(component) => {
                if let Err(e) = self
                    .component_handler
                    .handle_component_interaction(&ctx, &component)
                    .await
                {
                    error!(
                        "Error handling component interaction '{}': {}",
                        component.data.custom_id, e
                    );
                }
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Herald event reminder bot...");

    let database = Database::new(&config.database_path).await?;

    // Admin sessions plus the sweep that expires abandoned ones
    let sessions = SessionStore::new();
    tokio::spawn(session_sweep_loop(sessions.clone()));

    // The notifier gets its Http handle once the client exists
    let notifier = Arc::new(DiscordNotifier::new());
    let scheduler = ReminderScheduler::new(
        database.clone(),
        notifier.clone() as Arc<dyn Notifier>,
        config.timezone,
    );
    let service = EventService::new(database.clone(), scheduler);

    let context = CommandContext::new(service.clone(), sessions, config.clone());
    let command_handler = Arc::new(CommandHandler::new(context));
    let component_handler = Arc::new(EventComponentHandler::new(command_handler.context()));

    // Parse guild ID if provided for development mode
    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);

    let handler = Handler {
        command_handler,
        component_handler,
        guild_id,
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| anyhow::anyhow!("Client creation failed: {}", e))?;

    // The client owns the Http instance the notifier delivers through
    notifier.set_http(client.cache_and_http.http.clone()).await;

    // Rebuild reminder timers from the database; the sole recovery path
    // after a restart
    let restored = service.restore_on_startup(Utc::now()).await?;
    info!("⏰ {restored} reminder timers restored");

    info!("Bot configured successfully. Connecting to Discord gateway...");
    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
