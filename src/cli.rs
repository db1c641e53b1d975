//! Argument parsing for the trigger words.

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};

/// What one trigger invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    ClearAll,
    Delete(String),
    /// Alias the last command, under this name or a generated one.
    AliasLast(Option<String>),
}

pub fn trigger_command(name: &'static str) -> Command {
    Command::new(name)
        .about("Turn your last command into a short alias")
        .arg(
            Arg::new("shortcut")
                .help("Manually specify a shortcut name")
                .num_args(1),
        )
        .arg(
            Arg::new("clear")
                .short('c')
                .long("clear")
                .help("Clear all stored shortcuts, or a specific one if you name it")
                .value_name("SHORTCUT")
                .num_args(0..=1)
                .default_missing_value(""),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List all stored shortcuts")
                .action(ArgAction::SetTrue),
        )
}

/// Parses the words typed after a trigger word.
///
/// `--clear` on its own clears everything; `--clear NAME` and
/// `NAME --clear` both delete `NAME`. Naming two different shortcuts
/// (`NAME --clear OTHER`) is a usage error. `--list` wins over `--clear`,
/// which wins over aliasing.
pub fn parse_action(trigger: &'static str, args: &[String]) -> Result<Action, clap::Error> {
    let mut command = trigger_command(trigger).no_binary_name(true);
    let matches = command.try_get_matches_from_mut(args)?;

    if matches.get_flag("list") {
        return Ok(Action::List);
    }

    let shortcut = matches.get_one::<String>("shortcut").cloned();
    if let Some(clear) = matches.get_one::<String>("clear") {
        return match (clear.as_str(), shortcut) {
            ("", Some(name)) => Ok(Action::Delete(name)),
            ("", None) => Ok(Action::ClearAll),
            (name, None) => Ok(Action::Delete(name.to_string())),
            (name, Some(other)) => Err(command.error(
                ErrorKind::ArgumentConflict,
                format!("'{other}' and '--clear {name}' name different shortcuts; remove one"),
            )),
        };
    }

    Ok(Action::AliasLast(shortcut))
}
