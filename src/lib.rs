//! Parley: a conversational assistant core.
//!
//! Forwards user messages to a remote language-model agent, hands the reply
//! back to a synchronous caller, and keeps a replayable log of the
//! conversation.
//!
//! # Quick Start
//!
//! ```no_run
//! use parley::prelude::*;
//!
//! # fn example() -> parley::error::Result<()> {
//! let config = ParleyConfig::load()?;
//! let session = ChatSession::from_config(&config);
//! session.initialize(config.credentials()?)?;
//!
//! let reply = session.send("Hello!")?;
//! println!("{reply}");
//! for turn in session.load_history()? {
//!     println!("{}: {}", turn.role(), turn.content());
//! }
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod agent;
pub mod bridge;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod prelude;
pub mod session;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
