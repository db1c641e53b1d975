//! Finds the command a new alias should stand for.

use crate::TRIGGER_WORDS;
use crate::error::{Result, UhuError};
use crate::providers::HistorySource;
use std::path::PathBuf;
use tracing::debug;

/// One line of shell history. Owned by the host; read-only here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub command: String,
    pub directory: PathBuf,
    pub index: usize,
}

/// The command to alias, and whether getting to it meant walking past our
/// own invocations (which makes the request a rename).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub entry: HistoryEntry,
    pub is_renaming: bool,
}

/// Walks history backward past trigger invocations and returns the first
/// real command.
///
/// An entry is a trigger invocation when it starts with one of
/// [`TRIGGER_WORDS`], or when its first word is `last_created`: running the
/// alias we just made and then asking again means renaming it.
pub fn resolve_target(history: &dyn HistorySource, last_created: Option<&str>) -> Result<Target> {
    let mut is_renaming = false;
    let mut back = 1;

    loop {
        let entry = history.entry_back(back).ok_or(UhuError::EmptyHistory)?;

        if is_trigger_invocation(&entry.command, last_created) {
            debug!("Skipping trigger invocation: {}", entry.command);
            is_renaming = true;
            back += 1;
            continue;
        }

        return Ok(Target { entry, is_renaming });
    }
}

fn is_trigger_invocation(command: &str, last_created: Option<&str>) -> bool {
    let command = command.trim_start();
    if TRIGGER_WORDS.iter().any(|word| command.starts_with(word)) {
        return true;
    }
    match (last_created, command.split_whitespace().next()) {
        (Some(alias), Some(first)) => first == alias,
        _ => false,
    }
}
