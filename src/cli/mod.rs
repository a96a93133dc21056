//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod model_list;
pub mod provider_list;

use std::error::Error;

use clap::{Parser, Subcommand};

use crate::auth::CredentialStore;
use crate::cli::model_list::list_models;
use crate::cli::provider_list::list_providers;
use crate::core::config::Config;
use crate::ui::chat_loop::run_chat;

#[derive(Parser)]
#[command(name = "chinwag")]
#[command(version)]
#[command(about = "A terminal chat client for OpenAI-compatible APIs")]
#[command(
    long_about = "Chinwag is a full-screen terminal chat client for OpenAI-compatible \
chat completion APIs. Pick a model from the built-in catalog, type a message, and read \
the reply without leaving your terminal.\n\n\
Authentication:\n\
  Use 'chinwag auth' to store an API key securely in your system keyring.\n\n\
Environment Variables (fallback if no auth configured):\n\
  OPENAI_API_KEY    Your API key\n\
  OPENAI_BASE_URL   Custom API base URL (optional, defaults to https://api.openai.com/v1)\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a newline\n\
  PageUp/PageDown   Scroll through chat history\n\
  Ctrl+C            Quit the application\n\n\
Commands:\n\
  /help             Show the in-app help\n\
  /model            Open the model picker\n\
  /key              Enter or replace the API key\n\
  /clear            Clear the conversation"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat, or list the model catalog if no model specified
    #[arg(short = 'm', long, global = true, value_name = "MODEL", num_args = 0..=1, default_missing_value = "")]
    pub model: Option<String>,

    /// Provider to use, or list available providers if no provider specified
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER", num_args = 0..=1, default_missing_value = "")]
    pub provider: Option<String>,

    /// Ignore stored credentials and authenticate from environment variables only
    #[arg(long, global = true)]
    pub env_only: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store an API key in the system keyring
    Auth,
    /// Remove a stored API key
    Deauth,
    /// Start the chat interface (default)
    Chat,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

/// Route tracing events to a file under the data dir when `RUST_LOG` asks for
/// them. Writing to stderr would scribble over the alternate screen, and with
/// no subscriber installed the event macros are free, so this stays off by
/// default.
fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let log_path = crate::core::config::get_data_dir().join("chinwag.log");
    if let Some(dir) = log_path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }

    if let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .try_init();
    }
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Auth => {
            let credentials = CredentialStore::new();
            if let Err(e) = credentials.interactive_auth() {
                eprintln!("Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            let credentials = CredentialStore::new();
            if let Err(e) = credentials.interactive_deauth(args.provider) {
                eprintln!("Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(value) = value else {
                config.print_all();
                return Ok(());
            };
            match key.as_str() {
                "default-provider" => {
                    config.default_provider = Some(value.clone());
                    config.save()?;
                    println!("Set default-provider to: {value}");
                }
                "default-model" => {
                    config.default_model = Some(value.clone());
                    config.save()?;
                    println!("Set default-model to: {value}");
                }
                "theme" => {
                    config.theme = Some(value.clone());
                    config.save()?;
                    println!("Set theme to: {value}");
                }
                _ => {
                    eprintln!("Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "default-provider" => {
                    config.default_provider = None;
                    config.save()?;
                    println!("Unset default-provider");
                }
                "default-model" => {
                    config.default_model = None;
                    config.save()?;
                    println!("Unset default-model");
                }
                "theme" => {
                    config.theme = None;
                    config.save()?;
                    println!("Unset theme");
                }
                _ => {
                    eprintln!("Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Chat => {
            // -p without a value lists providers instead of starting a chat
            if args.provider.as_deref() == Some("") {
                return list_providers();
            }

            match args.model.as_deref() {
                // -m without a value lists the model catalog
                Some("") => list_models(),
                Some(model) => run_chat(model.to_string(), args.provider, args.env_only).await,
                None => run_chat("default".to_string(), args.provider, args.env_only).await,
            }
        }
    }
}
