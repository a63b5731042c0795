//! Multiplyr is a terminal playground for hosted chat-completion models.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session: the transcript, sampling parameters, model and
//!   preset selection, and the streaming completion client.
//! - [`ui`] renders the key gate and chat screens and runs the interactive
//!   event loop.
//! - [`api`] defines the chat-completion payloads sent and received.
//! - [`utils`] holds URL, auth header, and logging helpers.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions or streams a single answer for `say`.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
