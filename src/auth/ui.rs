use std::fmt;
use std::io::{self, Write};

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::crossterm::terminal::{disable_raw_mode, enable_raw_mode};

const MASKED_INPUT_PROMPT: &str = "Enter your API key (input is hidden): ";
const INVALID_CHOICE_MSG: &str = "Invalid choice";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMenuItem {
    pub id: String,
    pub display_name: String,
    pub configured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSelection {
    Provider(usize),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationChoice {
    Yes,
    No,
}

#[derive(Debug, Clone)]
pub struct UiError {
    message: String,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UiError {}

pub fn prompt_auth_menu(providers: &[ProviderMenuItem]) -> Result<MenuSelection, UiError> {
    println!("Chinwag authentication setup");
    println!();

    println!("Available providers:");
    for (index, provider) in providers.iter().enumerate() {
        let status = if provider.configured {
            "configured"
        } else {
            "not configured"
        };
        println!(
            "  {}. {} ({}) - {}",
            index + 1,
            provider.display_name,
            provider.id,
            status
        );
    }
    println!("  {}. Cancel", providers.len() + 1);
    println!();

    print!("Select a provider (1-{}): ", providers.len() + 1);
    flush_stdout()?;

    let input = read_line()?;
    parse_menu_selection(&input, providers.len())
}

pub fn prompt_provider_token(display_name: &str) -> Result<String, UiError> {
    println!();
    println!("Selected provider: {display_name}");
    let token = read_masked_line(MASKED_INPUT_PROMPT)?;
    if token.is_empty() {
        return Err(UiError::new("API key cannot be empty"));
    }
    Ok(token)
}

pub fn prompt_deauth_menu(providers: &[ProviderMenuItem]) -> Result<Option<usize>, UiError> {
    println!("Chinwag authentication removal");
    println!();

    if providers.is_empty() {
        println!("No configured providers found.");
        return Ok(None);
    }

    println!("Configured providers:");
    for (index, provider) in providers.iter().enumerate() {
        println!("  {}. {}", index + 1, provider.display_name);
    }
    println!("  {}. Cancel", providers.len() + 1);
    println!();

    print!("Select a provider to remove (1-{}): ", providers.len() + 1);
    flush_stdout()?;

    let input = read_line()?;
    match parse_menu_selection(&input, providers.len())? {
        MenuSelection::Provider(index) => {
            print!(
                "Are you sure you want to remove the key for {}? (y/N): ",
                providers[index].display_name
            );
            flush_stdout()?;

            let confirm = read_line()?;
            match parse_confirmation(&confirm)? {
                ConfirmationChoice::Yes => Ok(Some(index)),
                ConfirmationChoice::No => {
                    println!("Cancelled.");
                    Ok(None)
                }
            }
        }
        MenuSelection::Cancel => {
            println!("Cancelled.");
            Ok(None)
        }
    }
}

/// Read one line in raw mode, echoing a bullet per character so the key
/// never appears on screen. Esc cancels; Ctrl+C aborts the whole prompt.
pub fn read_masked_line(prompt: &str) -> Result<String, UiError> {
    print!("{prompt}");
    flush_stdout()?;

    enable_raw_mode().map_err(|err| UiError::new(err.to_string()))?;
    let result = read_masked_loop();
    let _ = disable_raw_mode();
    println!();
    result
}

fn read_masked_loop() -> Result<String, UiError> {
    let mut buffer = String::new();
    loop {
        let ev = event::read().map_err(|err| UiError::new(err.to_string()))?;
        if let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = ev
        {
            match code {
                KeyCode::Enter => return Ok(buffer),
                KeyCode::Esc => return Ok(String::new()),
                KeyCode::Backspace => {
                    if buffer.pop().is_some() {
                        print!("\u{8} \u{8}");
                        flush_stdout()?;
                    }
                }
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(UiError::new("Cancelled"));
                }
                KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                    buffer.push(c);
                    print!("•");
                    flush_stdout()?;
                }
                _ => {}
            }
        }
    }
}

pub fn parse_confirmation(input: &str) -> Result<ConfirmationChoice, UiError> {
    let trimmed = input.trim().to_lowercase();
    match trimmed.as_str() {
        "" | "n" | "no" => Ok(ConfirmationChoice::No),
        "y" | "yes" => Ok(ConfirmationChoice::Yes),
        _ => Err(UiError::new("Invalid confirmation response")),
    }
}

pub fn parse_menu_selection(input: &str, provider_count: usize) -> Result<MenuSelection, UiError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UiError::new("Selection cannot be empty"));
    }

    let choice: usize = trimmed
        .parse()
        .map_err(|_| UiError::new(INVALID_CHOICE_MSG))?;

    if choice == 0 || choice > provider_count + 1 {
        return Err(UiError::new(INVALID_CHOICE_MSG));
    }

    if choice == provider_count + 1 {
        Ok(MenuSelection::Cancel)
    } else {
        Ok(MenuSelection::Provider(choice - 1))
    }
}

fn flush_stdout() -> Result<(), UiError> {
    io::stdout()
        .flush()
        .map_err(|err| UiError::new(err.to_string()))
}

fn read_line() -> Result<String, UiError> {
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|err| UiError::new(err.to_string()))?;
    Ok(input)
}
