//! CLI command handlers.

use std::io::{self, BufRead, Write};

use tracing::debug;

use super::{AskArgs, ChatArgs, Cli, Commands, ContractArgs, ReplCommand};
use crate::action::Erc721ContractAction;
use crate::config::ParleyConfig;
use crate::error::{ParleyError, RecoverySuggestion};
use crate::session::ChatSession;
use crate::types::Turn;

const HELP: &str = "\
Commands:
  /history        show the conversation so far
  /clear          erase the conversation
  /contract       generate an ERC721 contract for the configured owner
  /status         show session state
  /model <id>     switch model (re-initializes the agent)
  /reset          drop the agent; history is kept
  /quit           leave";

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<(), ParleyError> {
    let config = cli.resolve_config()?;
    debug!(model = %config.model, history = ?config.history_path, "Configuration resolved");
    let session = ChatSession::from_config(&config);

    match cli.command {
        Commands::Chat(ref args) => handle_chat(&session, &config, args),
        Commands::Ask(ref args) => handle_ask(&session, &config, args),
        Commands::History => print_turns(&session.load_history()?, &mut io::stdout().lock()),
        Commands::Clear => {
            session.clear_history()?;
            println!("History cleared.");
            Ok(())
        }
        Commands::Contract(ref args) => handle_contract(&session, &config, args),
    }
}

fn handle_chat(
    session: &ChatSession,
    config: &ParleyConfig,
    args: &ChatArgs,
) -> Result<(), ParleyError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Err(err) = session.initialize_from(config) {
        report(&mut out, &err)?;
    }
    if !args.no_replay {
        print_turns(&session.load_history()?, &mut out)?;
    }
    writeln!(out, "Type /help for commands.")?;
    chat_loop(session, config, io::stdin().lock(), &mut out)
}

fn handle_ask(
    session: &ChatSession,
    config: &ParleyConfig,
    args: &AskArgs,
) -> Result<(), ParleyError> {
    session.initialize_from(config)?;
    let reply = session.send(&args.prompt.join(" "))?;
    println!("{reply}");
    Ok(())
}

fn handle_contract(
    session: &ChatSession,
    config: &ParleyConfig,
    args: &ContractArgs,
) -> Result<(), ParleyError> {
    session.initialize_from(config)?;
    let action = contract_action(config, args.owner.as_deref(), args.name.as_deref())?;
    println!("{}", session.trigger_side_effect(&action)?);
    Ok(())
}

fn contract_action(
    config: &ParleyConfig,
    owner: Option<&str>,
    name: Option<&str>,
) -> Result<Erc721ContractAction, ParleyError> {
    let action = match owner {
        Some(owner) => Erc721ContractAction::new(owner)?,
        None => Erc721ContractAction::from_config(config)?,
    };
    Ok(match name {
        Some(name) => action.with_contract_name(name),
        None => action,
    })
}

/// Read lines from `input` until EOF or `/quit`, answering each one.
///
/// Failures are reported and the loop continues; only I/O errors on the
/// terminal itself end it.
pub fn chat_loop<R: BufRead, W: Write>(
    session: &ChatSession,
    config: &ParleyConfig,
    mut input: R,
    out: &mut W,
) -> Result<(), ParleyError> {
    let mut line = String::new();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(());
        }

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Message(text) => match session.send(&text) {
                Ok(reply) => writeln!(out, "{reply}")?,
                Err(err) => report(out, &err)?,
            },
            ReplCommand::History => match session.load_history() {
                Ok(turns) => print_turns(&turns, out)?,
                Err(err) => report(out, &err)?,
            },
            ReplCommand::Clear => match session.clear_history() {
                Ok(()) => writeln!(out, "History cleared.")?,
                Err(err) => report(out, &err)?,
            },
            ReplCommand::Contract => {
                let outcome = contract_action(config, None, None)
                    .and_then(|action| session.trigger_side_effect(&action));
                match outcome {
                    Ok(summary) => writeln!(out, "{summary}")?,
                    Err(err) => report(out, &err)?,
                }
            }
            ReplCommand::Status => print_status(session, out)?,
            ReplCommand::Reset => {
                session.reset();
                writeln!(out, "Agent reset. History kept.")?;
            }
            ReplCommand::Model(model) => {
                let outcome = match config.api_key.clone() {
                    Some(key) => session.initialize_with(key, &model),
                    None => Err(ParleyError::init("No API key configured (set PARLEY_API_KEY)")),
                };
                match outcome {
                    Ok(state) => writeln!(out, "Switched to {model} ({state}).")?,
                    Err(err) => report(out, &err)?,
                }
            }
            ReplCommand::Help => writeln!(out, "{HELP}")?,
            ReplCommand::Quit => return Ok(()),
            ReplCommand::Unknown(name) => writeln!(out, "Unknown command /{name}. Try /help.")?,
        }
    }
}

fn print_turns<W: Write>(turns: &[Turn], out: &mut W) -> Result<(), ParleyError> {
    for turn in turns {
        writeln!(
            out,
            "[{}] {}: {}",
            turn.timestamp().format("%Y-%m-%d %H:%M:%S"),
            turn.role(),
            turn.content()
        )?;
    }
    Ok(())
}

fn print_status<W: Write>(session: &ChatSession, out: &mut W) -> Result<(), ParleyError> {
    writeln!(out, "state:    {}", session.state())?;
    match session.model() {
        Some(model) => writeln!(out, "model:    {model}")?,
        None => writeln!(out, "model:    -")?,
    }
    if let Some(fingerprint) = session.key_fingerprint() {
        writeln!(out, "key:      {fingerprint}")?;
    }
    let backend = session.history().backend_name();
    match session.message_count() {
        Ok(count) => writeln!(out, "history:  {backend} ({count} turns)")?,
        Err(err) => writeln!(out, "history:  {backend} (unreadable: {err})")?,
    }
    Ok(())
}

fn report<W: Write>(out: &mut W, err: &ParleyError) -> io::Result<()> {
    writeln!(out, "error: {err}")?;
    if let Some(hint) = hint(err.recovery_suggestion()) {
        writeln!(out, "hint:  {hint}")?;
    }
    Ok(())
}

fn hint(suggestion: RecoverySuggestion) -> Option<&'static str> {
    match suggestion {
        RecoverySuggestion::RetryWithBackoff => Some("try again in a moment"),
        RecoverySuggestion::CheckCredentials => Some("check the API key and model"),
        RecoverySuggestion::InitializeFirst => Some("set an API key, then /model <id>"),
        RecoverySuggestion::CheckConfiguration => {
            Some("check ~/.parley/config.toml and PARLEY_* variables")
        }
        RecoverySuggestion::IncreaseTimeout => Some("raise PARLEY_TIMEOUT_SECS"),
        RecoverySuggestion::CheckStorage => Some("check the history file is writable"),
        RecoverySuggestion::ContactSupport => None,
    }
}
