//! Integration with bash and zsh.
//!
//! The binary cannot reach into a running shell, so the shell calls it and
//! `eval`s what it prints. The trigger functions installed by
//! [`init_script`] pipe recent history into `uhu run` together with the
//! session state; everything the library does to the alias table comes back
//! as shell code. Installed aliases are shell functions that call
//! `uhu replay`, whose output is the replayed line for the shell to `eval`
//! in place, which keeps it in the live session and out of history.

use crate::error::{Result, UhuError};
use crate::executor::{ExecError, LiveContext};
use crate::history::HistoryEntry;
use crate::providers::{AliasTable, HistorySource};
use crate::registry::{AliasRecord, RegistryState};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Session state, serialized as JSON, handed over by the shell.
pub const STATE_VAR: &str = "__UHU_STATE";
/// Whitespace-separated names of every alias, function, builtin and keyword
/// the shell knows.
pub const TAKEN_VAR: &str = "__UHU_TAKEN";
/// The trigger word the user typed.
pub const TRIGGER_VAR: &str = "__UHU_TRIGGER";

const SHELL_STATE_VAR: &str = "__uhu_state";

pub const SUPPORTED_SHELLS: [&str; 2] = ["bash", "zsh"];

pub fn init_script(shell: &str) -> Option<&'static str> {
    match shell {
        "bash" => Some(include_str!("../shell/uhu.bash")),
        "zsh" => Some(include_str!("../shell/uhu.zsh")),
        _ => None,
    }
}

/// Parses `fc -ln` output, oldest entry first.
pub fn parse_history(text: &str, directory: &Path) -> Vec<HistoryEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, command)| HistoryEntry {
            command: command.to_string(),
            directory: directory.to_path_buf(),
            index,
        })
        .collect()
}

/// Drops the newest history entry when it is the trigger line now running.
///
/// The shell may not have recorded that line (`ignorespace`, `ignoredups`,
/// `HIST_IGNORE_SPACE`), so the entry is only dropped when its words end
/// with `invocation` as a whole command.
pub fn strip_invocation(history: &mut Vec<HistoryEntry>, invocation: &[String]) {
    let Some(last) = history.last() else {
        return;
    };
    if ends_with_invocation(&last.command, invocation) {
        debug!("Dropping the running invocation from history: {}", last.command);
        history.pop();
    } else {
        debug!("Running invocation was not recorded; newest entry is {}", last.command);
    }
}

fn ends_with_invocation(command: &str, invocation: &[String]) -> bool {
    let words = shlex::split(command)
        .unwrap_or_else(|| command.split_whitespace().map(str::to_string).collect());
    if invocation.is_empty() || !words.ends_with(invocation) {
        return false;
    }
    match words.len() - invocation.len() {
        0 => true,
        start => {
            let previous = words[start - 1].as_str();
            matches!(previous, "&&" | "||" | "|" | ";") || previous.ends_with(';')
        }
    }
}

/// Reads the state blob the shell passed in. A blob we cannot read is
/// treated as an empty session.
pub fn parse_state(raw: Option<&str>) -> RegistryState {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => RegistryState::default(),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed session state: {}", e);
            RegistryState::default()
        }),
    }
}

fn quote(text: &str) -> Result<String> {
    shlex::try_quote(text)
        .map(|quoted| quoted.into_owned())
        .map_err(|e| UhuError::Host(format!("cannot quote {text:?} for the shell: {e}")))
}

/// Host view of a bash or zsh session for one `uhu run`.
pub struct PosixShell {
    history: Vec<HistoryEntry>,
    taken: HashSet<String>,
    script: Vec<String>,
}

impl PosixShell {
    pub fn new(history: Vec<HistoryEntry>, taken: &str) -> Self {
        Self {
            history,
            taken: taken.split_whitespace().map(str::to_string).collect(),
            script: Vec::new(),
        }
    }

    /// Shell code applying every alias change, then the updated session
    /// state.
    pub fn finish(self, state: &RegistryState) -> Result<String> {
        let json = serde_json::to_string(state)
            .map_err(|e| UhuError::Host(format!("cannot serialize session state: {e}")))?;
        let mut script = self.script;
        script.push(format!("{}={}", SHELL_STATE_VAR, quote(&json)?));
        Ok(script.join("\n") + "\n")
    }
}

impl HistorySource for PosixShell {
    fn len(&self) -> usize {
        self.history.len()
    }

    fn entry_back(&self, back: usize) -> Option<HistoryEntry> {
        let index = self.history.len().checked_sub(back)?;
        self.history.get(index).cloned()
    }
}

impl AliasTable for PosixShell {
    fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    fn install(&mut self, record: &AliasRecord) -> Result<()> {
        let body = format!(
            "{}() {{ builtin eval \"$(command uhu replay -- {} \"$@\")\"; }}",
            record.name,
            quote(&record.command)?
        );
        debug!("Installing: {}", body);
        self.script.push(body);
        self.taken.insert(record.name.clone());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        if !self.taken.remove(name) {
            warn!("Alias '{}' was already gone from the shell", name);
        }
        self.script.push(format!("unset -f {}", quote(name)?));
        Ok(())
    }
}

/// Live context for `uhu replay`: collects the code the shell function
/// evaluates in place.
#[derive(Default)]
pub struct PosixContext {
    script: Vec<String>,
}

impl PosixContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_script(self) -> String {
        self.script.join("\n") + "\n"
    }
}

impl LiveContext for PosixContext {
    /// Joins backslash-continued lines.
    fn transform(&self, line: &str) -> String {
        line.replace("\\\n", "")
    }

    fn execute(&mut self, source: &str) -> std::result::Result<(), ExecError> {
        let quoted = quote(source).map_err(|e| ExecError::Runtime(e.to_string()))?;
        self.script.push(format!("builtin eval {quoted}"));
        Ok(())
    }

    fn fix_cwd(&mut self) {
        self.script.push("__uhu_fix_cwd \"$?\"".to_string());
    }
}
