//! CLI entry point for Parley.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{default_history_path, ParleyConfig};
use crate::error::ParleyError;
use crate::models::ModelId;

/// Parley conversational assistant
#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Parley: chat with a remote assistant")]
pub struct Cli {
    /// Model to use (gpt-4o-mini, gpt-4o, gpt-4, gpt-3.5-turbo)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// API key (overrides PARLEY_API_KEY / OPENAI_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Config file (default: ~/.parley/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep history in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat
    Chat(ChatArgs),
    /// Send one message and print the reply
    Ask(AskArgs),
    /// Print the recorded conversation
    History,
    /// Erase the recorded conversation
    Clear,
    /// Generate an ERC721 contract for the configured owner
    Contract(ContractArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Skip printing earlier turns on start
    #[arg(long)]
    pub no_replay: bool,
}

/// Arguments for the `ask` subcommand.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// User prompt (positional)
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

/// Arguments for the `contract` subcommand.
#[derive(Parser, Debug)]
pub struct ContractArgs {
    /// Owner address (overrides PARLEY_OWNER_ADDRESS)
    #[arg(long)]
    pub owner: Option<String>,

    /// Contract name
    #[arg(long)]
    pub name: Option<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Resolve configuration: flags > environment > config file.
    ///
    /// The CLI persists history to `~/.parley/history.jsonl` unless a path is
    /// configured or `--ephemeral` is given.
    pub fn resolve_config(&self) -> Result<ParleyConfig, ParleyError> {
        let mut config = match self.config {
            Some(ref path) => {
                let mut config = ParleyConfig::load_from_path(path)?;
                config.overlay_env()?;
                config
            }
            None => ParleyConfig::load()?,
        };
        self.apply_overrides(&mut config)?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut ParleyConfig) -> Result<(), ParleyError> {
        if let Some(ref model) = self.model {
            config.model = ModelId::parse_supported(model)?;
        }
        if let Some(ref key) = self.api_key {
            config.api_key = Some(key.as_str().into());
        }
        if self.ephemeral {
            config.history_path = None;
        } else if config.history_path.is_none() {
            config.history_path = Some(default_history_path());
        }
        match self.command {
            Commands::Chat(ChatArgs {
                system: Some(ref system),
                ..
            })
            | Commands::Ask(AskArgs {
                system: Some(ref system),
                ..
            }) => config.system_prompt = Some(system.clone()),
            _ => {}
        }
        Ok(())
    }
}

/// A line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Plain text to send to the agent.
    Message(String),
    History,
    Clear,
    Contract,
    Status,
    Reset,
    /// Re-initialize with another model.
    Model(String),
    Help,
    Quit,
    /// Blank line.
    Empty,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Self::Message(line.to_string());
        };
        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((command, ""));
        match name {
            "history" => Self::History,
            "clear" => Self::Clear,
            "contract" => Self::Contract,
            "status" => Self::Status,
            "reset" => Self::Reset,
            "model" if !rest.is_empty() => Self::Model(rest.to_string()),
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}
