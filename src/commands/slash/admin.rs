//! Admin slash commands: /event_create, /event_edit, /event_delete

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::permissions::Permissions;

/// Creates the admin event management commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_event_create_command(),
        create_event_edit_command(),
        create_event_delete_command(),
    ]
}

/// Creates the event_create command (admin)
fn create_event_create_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("event_create")
        .description("Create a new event (Admin)")
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .create_option(|option| {
            option
                .name("when")
                .description("Start time, YYYY-MM-DD HH:MM in the bot timezone")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("text")
                .description("Announce text")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("remind_minutes")
                .description("How many minutes before the start to remind subscribers")
                .kind(CommandOptionType::Integer)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("image_url")
                .description("Image shown with the announcement")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .to_owned()
}

/// Creates the event_edit command (admin)
fn create_event_edit_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("event_edit")
        .description("Edit an event; only the given fields change (Admin)")
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .create_option(|option| {
            option
                .name("id")
                .description("The event id")
                .kind(CommandOptionType::Integer)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("when")
                .description("New start time, YYYY-MM-DD HH:MM in the bot timezone")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("text")
                .description("New announce text")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("remind_minutes")
                .description("New reminder lead time in minutes")
                .kind(CommandOptionType::Integer)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("image_url")
                .description("New image URL")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .to_owned()
}

/// Creates the event_delete command (admin)
fn create_event_delete_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("event_delete")
        .description("Delete an event and all of its subscriptions (Admin)")
        .default_member_permissions(Permissions::MANAGE_GUILD)
        .create_option(|option| {
            option
                .name("id")
                .description("The event id")
                .kind(CommandOptionType::Integer)
                .required(true)
        })
        .to_owned()
}
