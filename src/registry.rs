use crate::error::{Result, UhuError};
use crate::providers::AliasTable;
use crate::say;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub name: String,
    pub command: String,
    pub order: u64,
}

/// Serializable snapshot of a registry, kept by the host for the lifetime of
/// one shell session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    #[serde(default)]
    pub aliases: Vec<AliasRecord>,
    #[serde(default)]
    pub last_created: Option<String>,
}

/// The aliases this tool installed and has not removed yet, plus the most
/// recently created one for rename chaining.
///
/// Every tracked name is installed in the host's alias table; an operation
/// that fails on the host side leaves the registry as it was.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    records: HashMap<String, AliasRecord>,
    last_created: Option<String>,
    next_order: u64,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: RegistryState) -> Self {
        let next_order = state
            .aliases
            .iter()
            .map(|r| r.order + 1)
            .max()
            .unwrap_or(0);
        let records: HashMap<String, AliasRecord> = state
            .aliases
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();
        // A last-created name we no longer track cannot be renamed.
        let last_created = state.last_created.filter(|n| records.contains_key(n));

        info!("Registry restored with {} aliases", records.len());
        Self {
            records,
            last_created,
            next_order,
        }
    }

    pub fn state(&self) -> RegistryState {
        RegistryState {
            aliases: self.records_in_order().into_iter().cloned().collect(),
            last_created: self.last_created.clone(),
        }
    }

    pub fn last_created(&self) -> Option<&str> {
        self.last_created.as_deref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records_in_order(&self) -> Vec<&AliasRecord> {
        let mut records: Vec<&AliasRecord> = self.records.values().collect();
        records.sort_by_key(|r| r.order);
        records
    }

    /// Installs `name` for `command` and makes it the last created alias.
    ///
    /// When renaming, the previous last created alias is removed after the
    /// new one is installed, so there is never a moment with neither.
    pub fn create(
        &mut self,
        host: &mut dyn AliasTable,
        name: &str,
        command: &str,
        is_renaming: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        let record = AliasRecord {
            name: name.to_string(),
            command: command.trim().to_string(),
            order: self.next_order,
        };

        host.install(&record)?;
        self.records.insert(record.name.clone(), record);
        self.next_order += 1;
        info!("Installed alias '{}' for: {}", name, command.trim());

        let previous = if is_renaming {
            self.last_created.take().filter(|old| old != name)
        } else {
            None
        };

        match previous {
            Some(old) => {
                say(out, format_args!("✨ Renamed '{old}' to '{name}'"));
                if let Err(e) = self.delete(host, &old, false, out) {
                    warn!("Could not remove renamed alias '{}': {}", old, e);
                }
            }
            None => say(out, format_args!("✨ Last command shortened to '{name}'")),
        }

        self.last_created = Some(name.to_string());
        Ok(())
    }

    pub fn delete(
        &mut self,
        host: &mut dyn AliasTable,
        name: &str,
        message: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        if !self.records.contains_key(name) {
            return Err(UhuError::UnknownAlias(name.to_string()));
        }

        host.remove(name)?;
        self.records.remove(name);
        if self.last_created.as_deref() == Some(name) {
            self.last_created = None;
        }
        debug!("Removed alias '{}'", name);

        if message {
            say(out, format_args!("🗑️ Removed shortcut '{name}'"));
        }
        Ok(())
    }

    /// Removes every tracked alias. Never fails; a host failure for one
    /// alias is logged and that alias stays tracked.
    pub fn clear(&mut self, host: &mut dyn AliasTable, out: &mut dyn Write) {
        let names: Vec<String> = self
            .records_in_order()
            .into_iter()
            .map(|r| r.name.clone())
            .collect();

        for name in names {
            if let Err(e) = self.delete(host, &name, true, out) {
                warn!("Could not remove alias '{}': {}", name, e);
            }
        }
    }

    pub fn list(&self, out: &mut dyn Write) {
        if self.records.is_empty() {
            say(out, format_args!("No shortcuts yet."));
            return;
        }
        for record in self.records_in_order() {
            say(out, format_args!("{} → {}", record.name, record.command));
        }
    }
}
