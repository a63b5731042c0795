//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod model_list;
pub mod preset_list;
pub mod say;

use std::error::Error;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::cli::model_list::list_models;
use crate::cli::preset_list::list_presets;
use crate::cli::say::run_say;
use crate::core::app::AppInitConfig;
use crate::core::config::Config;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::init_tracing;

/// Environment variable the key gate and `say` read the API key from.
pub const API_KEY_ENV_VAR: &str = "MULTIPLYR_API_KEY";

const LONG_VERSION: &str = match option_env!("VERGEN_GIT_DESCRIBE") {
    Some(describe) => describe,
    None => env!("CARGO_PKG_VERSION"),
};

#[derive(Parser)]
#[command(name = "multiplyr")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "A terminal playground for hosted chat-completion models")]
#[command(
    long_about = "Multiplyr is a full-screen terminal playground for an OpenAI-compatible \
chat-completion service. Enter your API key, pick a model and a system-prompt preset, tune \
the sampling sliders, and chat with streamed responses.\n\n\
Environment Variables:\n\
  MULTIPLYR_API_KEY   API key (prefills the key prompt; required for 'say')\n\
  MULTIPLYR_LOG       Log filter for --debug-log (default: info)\n\n\
Controls:\n\
  Enter               Send the message / activate the selected sidebar row\n\
  Alt+Enter           Insert a newline\n\
  Tab                 Switch focus between input and sidebar\n\
  Up/Down             Select a sidebar row\n\
  Left/Right          Adjust the selected slider (Shift for larger steps)\n\
  Ctrl+L              Clear the chat\n\
  Esc                 Stop a streaming response or dismiss a notice\n\
  PageUp/PageDown     Scroll the transcript\n\
  Ctrl+K              Change the API key\n\
  Ctrl+C              Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the chat-completion API (e.g. https://host/v1)
    #[arg(short = 'u', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Model id or label to start with
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub debug_log: Option<PathBuf>,
}

/// Sampling overrides for `say`; unset flags keep the configured values.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct SamplingArgs {
    /// Maximum number of tokens to generate (100-4096)
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0-1)
    #[arg(long)]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold (0-1)
    #[arg(long)]
    pub top_p: Option<f64>,
    /// Top-K sampling cutoff (1-100)
    #[arg(long)]
    pub top_k: Option<u32>,
    /// Frequency penalty (-2 to 2)
    #[arg(long, allow_hyphen_values = true)]
    pub frequency_penalty: Option<f64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send a single prompt and stream the answer to stdout
    Say {
        /// The prompt (may be several words)
        #[arg(trailing_var_arg = true, required = true)]
        prompt: Vec<String>,
        /// System-prompt preset to apply
        #[arg(short = 'p', long)]
        preset: Option<String>,
        #[command(flatten)]
        sampling: SamplingArgs,
    },
    /// List system-prompt presets
    Presets,
    /// List configured models
    Models,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.debug_log.as_deref())?;

    let config = Config::load(args.config.as_deref())?;
    let init = AppInitConfig {
        config,
        base_url: args.base_url,
        model: args.model,
        api_key: std::env::var(API_KEY_ENV_VAR).ok(),
    };

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(init).await,
        Commands::Say {
            prompt,
            preset,
            sampling,
        } => run_say(init, prompt, preset, sampling).await,
        Commands::Presets => {
            list_presets(&init.config);
            Ok(())
        }
        Commands::Models => {
            list_models(&init.config, init.model.as_deref());
            Ok(())
        }
    }
}
