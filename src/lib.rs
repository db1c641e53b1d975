//! Uhu - turn your last shell command into a short alias.
//!
//! Type a command, then type `uhu`. The command gets a short name, picked by
//! a local language model through Ollama or given explicitly with
//! `uhu <name>`. Invoking the alias replays the command, with any extra
//! arguments appended, inside the live shell session.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`cli`] - Argument parsing for the trigger words
//! - [`command_router`] - Dispatches a parsed action (the front end)
//! - [`history`] - Finds the command to alias
//! - [`generator`] - Retries the naming service until a name is acceptable
//! - [`naming`] - Ollama client that suggests names
//! - [`validator`] - Decides whether a name may be registered
//! - [`registry`] - Aliases we own, and the last one created
//! - [`executor`] - Replays an alias in the live session
//! - [`posix`] - Integration with bash and zsh
//! - [`config`] / [`env`] - Configuration from file and environment
//! - [`providers`] - Host shell traits
//! - [`http_client`] - HTTP client abstraction
//!
//! # Example
//!
//! ```bash
//! eval "$(uhu init bash)"
//!
//! kubectl get pods -n staging -o wide
//! uhu            # ✨ Last command shortened to 'pods'
//! uhu            # ✨ Renamed 'pods' to 'stagingpods'
//! stagingpods -w # replays with -w appended
//! uhu -c         # removes every shortcut made in this session
//! ```

use std::fmt;
use std::io::Write;

pub mod cli;
pub mod command_router;
pub mod config;
pub mod env;
pub mod error;
pub mod executor;
pub mod generator;
pub mod history;
pub mod http_client;
pub mod naming;
pub mod posix;
pub mod providers;
pub mod registry;
pub mod validator;

/// Command words that invoke the front end. They are synonyms.
pub const TRIGGER_WORDS: [&str; 2] = ["huh", "uhu"];

/// Writes one user-facing line. Messages are best effort; a closed stream
/// must not abort an alias operation.
pub(crate) fn say(out: &mut dyn Write, message: fmt::Arguments<'_>) {
    let _ = writeln!(out, "{message}");
}
