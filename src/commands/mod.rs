mod registry;

pub use registry::{all_commands, CommandInvocation};

use crate::core::app::App;
use crate::core::catalog;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    OpenModelPicker,
    OpenKeyEntry,
}

/// Dispatch one line of input. Anything that is not a known `/command`
/// comes back as [`CommandResult::ProcessAsMessage`] for the turn path.
pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        let invocation = CommandInvocation {
            input: trimmed,
            args,
        };
        (command.handler)(app, invocation)
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help = String::from("## Commands\n");
    for command in all_commands() {
        help.push_str(&format!("- `/{}` — {}\n", command.name, command.help));
    }
    help.push_str("\n## Keys\n");
    help.push_str("- Enter sends; Alt+Enter inserts a newline\n");
    help.push_str("- PageUp/PageDown scroll the transcript\n");
    help.push_str("- Esc closes a picker or dialog; Ctrl+C quits\n");
    app.conversation.append_system(&help);
    app.auto_scroll = true;
    CommandResult::Continue
}

pub(super) fn handle_model(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return CommandResult::OpenModelPicker;
    }

    let model_id = invocation.args.split_whitespace().next().unwrap_or("");
    match catalog::find_model(model_id) {
        Some(descriptor) => {
            app.session.model = descriptor.id.clone();
            app.set_status(format!("Model set: {}", descriptor.id));
        }
        None => {
            app.set_status(format!("Unknown model: {model_id}"));
        }
    }
    CommandResult::Continue
}

pub(super) fn handle_key(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    // Always the masked dialog; a key typed into the input line would sit
    // in the transcript area in cleartext.
    CommandResult::OpenKeyEntry
}

pub(super) fn handle_clear(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.clear_conversation();
    CommandResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::utils::test_utils::create_test_app;

    #[test]
    fn registry_lists_commands() {
        let commands = super::all_commands();
        assert!(commands.iter().any(|cmd| cmd.name == "help"));
        assert!(commands.iter().any(|cmd| cmd.name == "model"));
        assert!(commands.iter().any(|cmd| cmd.name == "key"));
        assert!(commands.iter().any(|cmd| cmd.name == "clear"));
    }

    #[test]
    fn help_appends_a_system_message_with_the_registry() {
        let (_dir, mut app) = create_test_app();
        let result = process_input(&mut app, "/help");
        assert!(matches!(result, CommandResult::Continue));

        let last = app.conversation.messages().last().expect("help message");
        assert_eq!(last.role, Role::System);
        assert!(last.content.contains("- `/model` — "));
        assert!(last.content.contains("- `/clear` — "));
    }

    #[test]
    fn model_command_without_args_opens_the_picker() {
        let (_dir, mut app) = create_test_app();
        let result = process_input(&mut app, "/model");
        assert!(matches!(result, CommandResult::OpenModelPicker));
    }

    #[test]
    fn model_command_with_known_id_switches_models() {
        let (_dir, mut app) = create_test_app();
        let result = process_input(&mut app, "/model openai/gpt-4o-mini");
        assert!(matches!(result, CommandResult::Continue));
        assert_eq!(app.session.model, "openai/gpt-4o-mini");
        assert_eq!(app.status.as_deref(), Some("Model set: openai/gpt-4o-mini"));
    }

    #[test]
    fn model_command_with_unknown_id_reports_it() {
        let (_dir, mut app) = create_test_app();
        let before = app.session.model.clone();
        let result = process_input(&mut app, "/model not-a-model");
        assert!(matches!(result, CommandResult::Continue));
        assert_eq!(app.session.model, before);
        assert_eq!(app.status.as_deref(), Some("Unknown model: not-a-model"));
    }

    #[test]
    fn key_command_opens_the_masked_dialog() {
        let (_dir, mut app) = create_test_app();
        let result = process_input(&mut app, "/key");
        assert!(matches!(result, CommandResult::OpenKeyEntry));
    }

    #[test]
    fn clear_command_resets_the_conversation() {
        let (_dir, mut app) = create_test_app();
        app.conversation.append_user("hello");
        let result = process_input(&mut app, "/clear");
        assert!(matches!(result, CommandResult::Continue));
        assert_eq!(app.conversation.messages().len(), 1);
        assert!(app.conversation.messages()[0].role.is_system());
    }

    #[test]
    fn commands_dispatch_case_insensitively() {
        let (_dir, mut app) = create_test_app();
        let result = process_input(&mut app, "/CLEAR");
        assert!(matches!(result, CommandResult::Continue));
        assert_eq!(app.conversation.messages().len(), 1);
    }

    #[test]
    fn unknown_commands_fall_through_as_messages() {
        let (_dir, mut app) = create_test_app();
        let result = process_input(&mut app, "/frobnicate now");
        match result {
            CommandResult::ProcessAsMessage(text) => assert_eq!(text, "/frobnicate now"),
            _ => panic!("expected fallthrough"),
        }
    }

    #[test]
    fn plain_text_is_a_message() {
        let (_dir, mut app) = create_test_app();
        let result = process_input(&mut app, "hello there");
        match result {
            CommandResult::ProcessAsMessage(text) => assert_eq!(text, "hello there"),
            _ => panic!("expected message"),
        }
    }
}
