//! Chinwag is a terminal-first chat client for OpenAI-compatible LLM APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state, provider/model selection, the persisted
//!   conversation, and turn orchestration.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`commands`] implements slash-command parsing and command execution used
//!   by the chat loop.
//! - [`api`] defines the chat completion payloads and reply decoding.
//! - [`auth`] stores and resolves API credentials.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
