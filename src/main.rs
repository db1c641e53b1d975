use anyhow::Result;
use clap::{Arg, Command};
use std::io::{self, IsTerminal, Read, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use uhu::cli;
use uhu::command_router::CommandRouter;
use uhu::config::Config;
use uhu::executor::{self, Fatal};
use uhu::posix::{
    self, PosixContext, PosixShell, STATE_VAR, SUPPORTED_SHELLS, TAKEN_VAR, TRIGGER_VAR,
};
use uhu::TRIGGER_WORDS;
use uhu::registry::AliasRegistry;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stdout is evaluated by the shell, so logs go to stderr.
    let filter = EnvFilter::try_from_env("UHU_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let matches = Command::new("uhu")
        .about("Turn your last shell command into a short alias")
        .long_about("uhu names your last command for you (asking a local model through Ollama) and installs it as an alias in the running shell")
        .subcommand_required(true)
        .subcommand(Command::new("init")
            .about("Print the shell integration script")
            .arg(Arg::new("shell")
                .help("Shell to integrate with")
                .required(true)
                .value_parser(SUPPORTED_SHELLS)))
        .subcommand(Command::new("run")
            .about("Handle a trigger word invocation (called by the shell integration)")
            .arg(Arg::new("args")
                .help("Arguments given to the trigger word")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)))
        .subcommand(Command::new("replay")
            .about("Print the code that replays an alias (called by installed aliases)")
            .arg(Arg::new("command")
                .help("The aliased command line")
                .required(true)
                .allow_hyphen_values(true))
            .arg(Arg::new("args")
                .help("Arguments given to the alias")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)))
        .subcommand(Command::new("config")
            .about("Show configuration information"))
        .get_matches();

    match matches.subcommand() {
        Some(("init", sub)) => {
            let shell = sub
                .get_one::<String>("shell")
                .map(String::as_str)
                .unwrap_or_default();
            if let Some(script) = posix::init_script(shell) {
                print!("{}", script);
            }
        }
        Some(("run", sub)) => {
            let args = collect_args(sub, "args");
            run_trigger(args).await?;
        }
        Some(("replay", sub)) => {
            let command = sub
                .get_one::<String>("command")
                .cloned()
                .unwrap_or_default();
            let args = collect_args(sub, "args");
            replay(&command, &args)?;
        }
        Some(("config", _)) => {
            Config::load().show_config_info()?;
        }
        _ => unreachable!("clap enforces a subcommand"),
    }

    Ok(())
}

fn collect_args(matches: &clap::ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .unwrap_or_default()
        .map(|s| s.to_string())
        .collect()
}

async fn run_trigger(args: Vec<String>) -> Result<()> {
    let mut stderr = io::stderr();

    let typed = std::env::var(TRIGGER_VAR).unwrap_or_default();
    let trigger = TRIGGER_WORDS
        .into_iter()
        .find(|word| *word == typed)
        .unwrap_or("uhu");

    let action = match cli::parse_action(trigger, &args) {
        Ok(action) => action,
        Err(e) => {
            // Help and usage errors are for the user, never for eval.
            write!(stderr, "{}", e.render())?;
            return Ok(());
        }
    };

    let mut history_text = String::new();
    if !io::stdin().is_terminal() {
        io::stdin().read_to_string(&mut history_text)?;
    }
    let directory = std::env::current_dir()?;
    let mut history = posix::parse_history(&history_text, &directory);
    let invocation: Vec<String> = std::iter::once(trigger.to_string())
        .chain(args.iter().cloned())
        .collect();
    posix::strip_invocation(&mut history, &invocation);
    let taken = std::env::var(TAKEN_VAR).unwrap_or_default();
    let state = posix::parse_state(std::env::var(STATE_VAR).ok().as_deref());
    info!("Running {:?} with {} history entries", action, history.len());

    let mut shell = PosixShell::new(history, &taken);
    let mut router = CommandRouter::new(AliasRegistry::from_state(state), Arc::new(Config::load()));
    router.dispatch(&mut shell, action, &mut stderr).await;

    let script = shell.finish(&router.registry().state())?;
    io::stdout().write_all(script.as_bytes())?;
    Ok(())
}

fn replay(command: &str, args: &[String]) -> Result<()> {
    let mut context = PosixContext::new();
    match executor::invoke(&mut context, command, args, &mut io::stderr()) {
        Ok(()) => {
            io::stdout().write_all(context.into_script().as_bytes())?;
            Ok(())
        }
        Err(Fatal::Exit(code)) => std::process::exit(code),
        Err(Fatal::Interrupted) => std::process::exit(130),
    }
}
