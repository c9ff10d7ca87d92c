// File: tunebot-core/src/services/discord/slashcommands/play.rs

use twilight_model::application::command::CommandType;
use twilight_model::application::interaction::application_command::{CommandData, CommandOptionValue};
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

pub const PLAY_COMMAND: &str = "play";
pub const QUERY_OPTION: &str = "query";

/// Create a CommandBuilder for `/play <query>`.
/// In Twilight 0.16, `build()` returns a `Command` directly (no `Result`).
pub fn create_play_command() -> CommandBuilder {
    CommandBuilder::new(
        PLAY_COMMAND,
        "Searches for and plays a song by URL or title",
        CommandType::ChatInput,
    )
    .option(
        StringBuilder::new(QUERY_OPTION, "Song URL or title")
            .required(true),
    )
}

/// Pulls the `query` string out of a `/play` invocation.
pub fn query_option(data: &CommandData) -> Option<String> {
    data.options
        .iter()
        .find(|opt| opt.name == QUERY_OPTION)
        .and_then(|opt| match &opt.value {
            CommandOptionValue::String(s) => Some(s.clone()),
            _ => None,
        })
}
