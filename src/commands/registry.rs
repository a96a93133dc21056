use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        help: "Show available commands and keys.",
        handler: super::handle_help,
    },
    Command {
        name: "model",
        help: "Open the model picker, or switch directly with /model <id>.",
        handler: super::handle_model,
    },
    Command {
        name: "key",
        help: "Enter an API key for the current provider (masked).",
        handler: super::handle_key,
    },
    Command {
        name: "clear",
        help: "Clear the conversation and start over.",
        handler: super::handle_clear,
    },
];
