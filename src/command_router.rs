use crate::{
    cli::Action,
    config::Config,
    error::{Result, UhuError},
    generator,
    history,
    naming::{NameSource, OllamaNamer},
    providers::{HostShell, PathLocator},
    registry::AliasRegistry,
    say,
    validator::Validator,
};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

/// Front end for the trigger words: routes a parsed [`Action`] to the
/// registry, the history reader and the name generator.
pub struct CommandRouter {
    registry: AliasRegistry,
    namer: Box<dyn NameSource>,
    validator: Validator,
    config: Arc<Config>,
}

impl CommandRouter {
    pub fn new(registry: AliasRegistry, config: Arc<Config>) -> Self {
        Self::with_parts(
            registry,
            Box::new(OllamaNamer::new(config.clone())),
            Validator::new(Box::new(PathLocator)),
            config,
        )
    }

    pub fn with_parts(
        registry: AliasRegistry,
        namer: Box<dyn NameSource>,
        validator: Validator,
        config: Arc<Config>,
    ) -> Self {
        Self {
            registry,
            namer,
            validator,
            config,
        }
    }

    pub fn registry(&self) -> &AliasRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> AliasRegistry {
        self.registry
    }

    /// Runs `action` and reports any failure as a single message on `out`.
    ///
    /// Nothing escapes: once the message is printed the command is over.
    pub async fn dispatch<H: HostShell>(&mut self, host: &mut H, action: Action, out: &mut dyn Write) {
        if let Err(e) = self.process(host, action, out).await {
            warn!("Command aborted: {}", e);
            say(out, format_args!("💢 {e}"));
        }
    }

    pub async fn process<H: HostShell>(
        &mut self,
        host: &mut H,
        action: Action,
        out: &mut dyn Write,
    ) -> Result<()> {
        info!("Processing action: {:?}", action);
        match action {
            Action::List => {
                self.registry.list(out);
                Ok(())
            }
            Action::ClearAll => {
                self.registry.clear(host, out);
                Ok(())
            }
            Action::Delete(name) => self.registry.delete(host, &name, true, out),
            Action::AliasLast(name) => self.alias_last_command(host, name, out).await,
        }
    }

    /// Aliases the most recent real command, either as `name` or under a
    /// generated name.
    ///
    /// If history shows that the user just invoked us (or the alias we just
    /// made), this renames the last created alias instead of adding another.
    pub async fn alias_last_command<H: HostShell>(
        &mut self,
        host: &mut H,
        name: Option<String>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let target = history::resolve_target(&*host, self.registry.last_created())?;
        let renaming = target
            .is_renaming
            .then(|| self.registry.last_created().map(str::to_string))
            .flatten();
        info!(
            "Target command: {} (renaming: {:?})",
            target.entry.command, renaming
        );

        let name = match name {
            Some(name) => {
                if !self.validator.is_acceptable(&name, &*host) {
                    return Err(UhuError::NameCollision(name));
                }
                name
            }
            None => {
                let max_tries = self.config.max_llm_tries()?;
                say(out, format_args!("⏳ Waiting for ollama"));
                generator::generate(
                    self.namer.as_ref(),
                    &self.validator,
                    &*host,
                    &target.entry,
                    renaming.as_deref(),
                    max_tries,
                    out,
                )
                .await?
            }
        };

        self.registry.create(
            host,
            &name,
            &target.entry.command,
            renaming.is_some(),
            out,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileConfig, MAX_LLM_TRIES_VAR};
    use crate::history::HistoryEntry;
    use crate::providers::{AliasTable, HistorySource, ProgramLocator};
    use crate::registry::AliasRecord;
    use async_trait::async_trait;
    use std::collections::{BTreeSet, HashMap};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockShell {
        history: Vec<String>,
        aliases: BTreeSet<String>,
    }

    impl HistorySource for MockShell {
        fn len(&self) -> usize {
            self.history.len()
        }

        fn entry_back(&self, back: usize) -> Option<HistoryEntry> {
            let index = self.history.len().checked_sub(back)?;
            Some(HistoryEntry {
                command: self.history[index].clone(),
                directory: PathBuf::from("/work"),
                index,
            })
        }
    }

    impl AliasTable for MockShell {
        fn contains(&self, name: &str) -> bool {
            self.aliases.contains(name)
        }

        fn install(&mut self, record: &AliasRecord) -> Result<()> {
            self.aliases.insert(record.name.clone());
            Ok(())
        }

        fn remove(&mut self, name: &str) -> Result<()> {
            self.aliases.remove(name);
            Ok(())
        }
    }

    struct QueueNamer(Mutex<Vec<Result<String>>>);

    impl QueueNamer {
        fn new(mut replies: Vec<Result<String>>) -> Self {
            replies.reverse();
            Self(Mutex::new(replies))
        }
    }

    #[async_trait]
    impl NameSource for QueueNamer {
        async fn suggest(&self, _command: &HistoryEntry, _blacklist: &[String]) -> Result<String> {
            self.0
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(UhuError::ServiceTimeout))
        }
    }

    struct NoPrograms;

    impl ProgramLocator for NoPrograms {
        fn program_exists(&self, program: &str) -> bool {
            program == "ls"
        }
    }

    fn router(replies: Vec<Result<String>>, env: &[(&str, &str)]) -> CommandRouter {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CommandRouter::with_parts(
            AliasRegistry::new(),
            Box::new(QueueNamer::new(replies)),
            Validator::new(Box::new(NoPrograms)),
            Arc::new(Config::new(FileConfig::default(), Box::new(env))),
        )
    }

    fn shell(history: &[&str]) -> MockShell {
        MockShell {
            history: history.iter().map(|h| h.to_string()).collect(),
            ..MockShell::default()
        }
    }

    #[tokio::test]
    async fn test_explicit_name_is_installed() {
        let mut router = router(vec![], &[]);
        let mut host = shell(&["ls -la"]);
        let mut out = Vec::new();

        router
            .dispatch(&mut host, Action::AliasLast(Some("lsa".to_string())), &mut out)
            .await;

        assert!(host.contains("lsa"));
        assert_eq!(router.registry().last_created(), Some("lsa"));
    }

    #[tokio::test]
    async fn test_explicit_name_collision_is_reported() {
        let mut router = router(vec![], &[]);
        let mut host = shell(&["ls -la"]);
        let mut out = Vec::new();

        router
            .dispatch(&mut host, Action::AliasLast(Some("ls".to_string())), &mut out)
            .await;

        assert!(router.registry().is_empty());
        assert!(String::from_utf8_lossy(&out).contains("💢 Bad human! Tried to shadow 'ls'"));
    }

    #[tokio::test]
    async fn test_generated_name_is_installed() {
        let mut router = router(vec![Ok("listing".to_string())], &[]);
        let mut host = shell(&["ls -la"]);
        let mut out = Vec::new();

        router.dispatch(&mut host, Action::AliasLast(None), &mut out).await;

        assert!(host.contains("listing"));
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Waiting for ollama"));
        assert!(text.contains("Last command shortened to 'listing'"));
    }

    #[tokio::test]
    async fn test_rename_sequence_leaves_only_new_alias() {
        let mut router = router(vec![Ok("a".to_string()), Ok("b".to_string())], &[]);
        let mut host = shell(&["ls -la"]);
        let mut out = Vec::new();

        router.dispatch(&mut host, Action::AliasLast(None), &mut out).await;
        assert_eq!(router.registry().last_created(), Some("a"));

        host.history.push("a".to_string());
        router.dispatch(&mut host, Action::AliasLast(None), &mut out).await;

        assert_eq!(host.aliases, BTreeSet::from(["b".to_string()]));
        let names: Vec<&str> = router
            .registry()
            .records_in_order()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["b"]);
        assert_eq!(router.registry().records_in_order()[0].command, "ls -la");
        assert!(String::from_utf8_lossy(&out).contains("Renamed 'a' to 'b'"));
    }

    #[tokio::test]
    async fn test_service_failure_leaves_registry_unchanged() {
        let mut router = router(
            vec![Err(UhuError::ServiceProtocol {
                status: None,
                detail: "missing field `shortname`".to_string(),
            })],
            &[],
        );
        let mut host = shell(&["ls -la"]);
        let mut out = Vec::new();

        router.dispatch(&mut host, Action::AliasLast(None), &mut out).await;

        assert!(router.registry().is_empty());
        assert!(host.aliases.is_empty());
        assert!(String::from_utf8_lossy(&out).contains("missing field `shortname`"));
    }

    #[tokio::test]
    async fn test_bad_tries_variable_aborts_generation_only() {
        let mut router = router(vec![Ok("x".to_string())], &[(MAX_LLM_TRIES_VAR, "lots")]);
        let mut host = shell(&["ls -la"]);
        let mut out = Vec::new();

        router.dispatch(&mut host, Action::AliasLast(None), &mut out).await;
        assert!(router.registry().is_empty());
        assert!(String::from_utf8_lossy(&out).contains("should be an INTEGER"));

        router
            .dispatch(&mut host, Action::AliasLast(Some("lsa".to_string())), &mut out)
            .await;
        assert!(host.contains("lsa"));
    }

    #[tokio::test]
    async fn test_empty_history_is_reported() {
        let mut router = router(vec![], &[]);
        let mut host = shell(&[]);
        let mut out = Vec::new();

        router.dispatch(&mut host, Action::AliasLast(None), &mut out).await;

        assert!(String::from_utf8_lossy(&out).contains("There's no history!"));
    }

    #[tokio::test]
    async fn test_delete_and_clear_routes() {
        let mut router = router(vec![], &[]);
        let mut host = shell(&["ls -la", "uhu one", "pwd"]);
        let mut out = Vec::new();

        router
            .dispatch(&mut host, Action::AliasLast(Some("one".to_string())), &mut out)
            .await;
        router
            .dispatch(&mut host, Action::Delete("one".to_string()), &mut out)
            .await;
        assert!(host.aliases.is_empty());

        router
            .dispatch(&mut host, Action::Delete("one".to_string()), &mut out)
            .await;
        assert!(String::from_utf8_lossy(&out).contains("No shortcut named 'one'"));

        router.dispatch(&mut host, Action::ClearAll, &mut out).await;
        assert!(router.registry().is_empty());
    }
}
