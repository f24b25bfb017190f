//! Event browsing slash commands: /events, /event

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

/// Creates the event browsing commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_events_command(), create_event_command()]
}

/// Creates the events command - list everything upcoming
fn create_events_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("events")
        .description("List upcoming events")
        .to_owned()
}

/// Creates the event command - show one event with subscribe buttons
fn create_event_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("event")
        .description("Show one event")
        .create_option(|option| {
            option
                .name("id")
                .description("The event id")
                .kind(CommandOptionType::Integer)
                .required(true)
        })
        .to_owned()
}
