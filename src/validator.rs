//! Decides whether a candidate alias name is safe to register.

use crate::TRIGGER_WORDS;
use crate::providers::{AliasTable, ProgramLocator};

/// Commands the installed aliases and trigger functions run themselves.
const PLUMBING_WORDS: [&str; 4] = ["builtin", "command", "eval", "unset"];

pub struct Validator {
    locator: Box<dyn ProgramLocator>,
}

impl Validator {
    pub fn new(locator: Box<dyn ProgramLocator>) -> Self {
        Self { locator }
    }

    /// Rejects names that are already aliases (the host counts its builtins
    /// and keywords as such), that are one of our trigger words or the shell
    /// commands our aliases rely on, that resolve to an executable on PATH, or that are not a plain
    /// command word.
    ///
    /// The PATH check is a snapshot; a program installed later can still end
    /// up shadowed.
    pub fn is_acceptable(&self, name: &str, aliases: &dyn AliasTable) -> bool {
        is_command_word(name)
            && !TRIGGER_WORDS.contains(&name)
            && !PLUMBING_WORDS.contains(&name)
            && !aliases.contains(name)
            && !self.locator.program_exists(name)
    }
}

fn is_command_word(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
