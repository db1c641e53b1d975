//! Shared provider traits for dependency injection.
//!
//! These are the narrow seams through which the library talks to the host
//! shell and the operating system. The POSIX shell adapter in
//! [`crate::posix`] implements them for real use; tests implement them in
//! memory.

use crate::error::Result;
use crate::history::HistoryEntry;
use crate::registry::AliasRecord;

/// Read access to the host shell's command history.
pub trait HistorySource {
    /// Number of entries currently in history.
    fn len(&self) -> usize;

    /// Entry `back` steps from the end: `1` is the most recent entry.
    ///
    /// Returns `None` once `back` runs past the oldest entry.
    fn entry_back(&self, back: usize) -> Option<HistoryEntry>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The host shell's alias table.
pub trait AliasTable {
    /// Whether any alias (ours or the user's own) is registered under `name`.
    fn contains(&self, name: &str) -> bool;

    /// Installs an alias whose body replays `record.command` through the
    /// command re-executor.
    fn install(&mut self, record: &AliasRecord) -> Result<()>;

    fn remove(&mut self, name: &str) -> Result<()>;
}

/// Everything the front end needs from a host shell.
pub trait HostShell: HistorySource + AliasTable {}

impl<T: HistorySource + AliasTable> HostShell for T {}

/// Trait for locating executables.
///
/// This abstraction enables testing without depending on the real PATH.
pub trait ProgramLocator: Send + Sync {
    /// Checks if a program exists in PATH.
    fn program_exists(&self, program: &str) -> bool;
}

/// Default locator backed by the `which` crate.
pub struct PathLocator;

impl ProgramLocator for PathLocator {
    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
