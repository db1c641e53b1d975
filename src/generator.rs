use crate::error::{Result, UhuError};
use crate::history::HistoryEntry;
use crate::naming::NameSource;
use crate::providers::AliasTable;
use crate::say;
use crate::validator::Validator;
use std::io::Write;
use tracing::{info, warn};

/// Asks `namer` for names until `validator` accepts one, at most
/// `max_tries` times.
///
/// Every rejected suggestion is added to the blacklist sent with the next
/// request. When renaming, the blacklist starts with the alias being
/// replaced.
pub async fn generate(
    namer: &dyn NameSource,
    validator: &Validator,
    aliases: &dyn AliasTable,
    command: &HistoryEntry,
    renaming: Option<&str>,
    max_tries: usize,
    out: &mut dyn Write,
) -> Result<String> {
    let max_tries = max_tries.max(1);
    let mut blacklist: Vec<String> = renaming.map(str::to_string).into_iter().collect();

    for attempt in 1..=max_tries {
        let name = namer.suggest(command, &blacklist).await?;

        if validator.is_acceptable(&name, aliases) {
            info!("Accepted name '{}' on attempt {}", name, attempt);
            return Ok(name);
        }

        warn!("Rejected generated name '{}' (attempt {}/{})", name, attempt, max_tries);
        say(out, format_args!("💢 Bad LLM! Tried to shadow '{name}'"));
        blacklist.push(name);
    }

    Err(UhuError::ExhaustedAttempts { tries: max_tries })
}
