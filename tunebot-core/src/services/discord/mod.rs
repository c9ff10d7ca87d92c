// File: tunebot-core/src/services/discord/mod.rs

pub mod slashcommands;

pub use slashcommands::{HttpCommandRegistrar, SlashCommandDispatcher, register_guild_slash_commands};
