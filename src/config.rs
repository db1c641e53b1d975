use crate::env::{self, EnvSource, ProcessEnv};
use crate::error::ConfigError;
use anyhow::{Result, anyhow};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const MODEL_NAME_VAR: &str = "XONSH_UHU_MODEL_NAME";
pub const SYSTEM_PROMPT_VAR: &str = "XONSH_UHU_SYSTEM_PROMPT";
pub const OLLAMA_URL_VAR: &str = "XONSH_UHU_OLLAMA_URL";
pub const OLLAMA_TIMEOUT_VAR: &str = "XONSH_UHU_OLLAMA_TIMEOUT";
pub const MAX_LLM_TRIES_VAR: &str = "XONSH_UHU_MAX_LLM_TRIES";

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_TIMEOUT_SECS: f64 = 30.0;
pub const DEFAULT_MAX_LLM_TRIES: i64 = 3;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You will generate a `shortname` for the provided shell command, \
which will be used as a convenient shortcut for it. Make the name memorable, but short. \
Do NOT use the command name for the `shortname`. Avoid using underscores, dashes and mixed case. \
Avoid making the alias an acronym. You may consider the `directory`, which is where the command \
was executed. Respond in JSON.";

/// Values read from `~/.uhu/config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub ollama_url: Option<String>,
    #[serde(default)]
    pub ollama_timeout: Option<f64>,
    #[serde(default)]
    pub max_llm_tries: Option<i64>,
}

/// Layered configuration: built-in defaults, then the config file, then
/// environment variables.
///
/// Values are resolved when asked for rather than at load time, so a
/// malformed variable only aborts the operation that needs it.
pub struct Config {
    file: FileConfig,
    env: Box<dyn EnvSource + Send + Sync>,
}

impl Config {
    /// Load configuration from the config file (if any) and the process environment.
    pub fn load() -> Self {
        let file = Self::get_config_path()
            .and_then(|path| Self::load_from_file(&path))
            .unwrap_or_else(|e| {
                info!("No usable config file, using defaults: {}", e);
                FileConfig::default()
            });
        Self::new(file, Box::new(ProcessEnv))
    }

    pub fn new(file: FileConfig, env: Box<dyn EnvSource + Send + Sync>) -> Self {
        Self { file, env }
    }

    fn load_from_file(path: &Path) -> Result<FileConfig> {
        if !path.exists() {
            return Err(anyhow!("Config file not found"));
        }
        let content = fs::read_to_string(path)?;
        match toml::from_str(&content) {
            Ok(config) => {
                info!("Loaded config from: {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                Err(e.into())
            }
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".uhu"))
    }

    /// The model to ask for names. There is no default.
    pub fn model_name(&self) -> Result<String, ConfigError> {
        env::get_string(self.env.as_ref(), MODEL_NAME_VAR)
            .or_else(|| self.file.model_name.clone())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                name: MODEL_NAME_VAR.to_string(),
            })
    }

    pub fn system_prompt(&self) -> String {
        env::get_string(self.env.as_ref(), SYSTEM_PROMPT_VAR)
            .or_else(|| self.file.system_prompt.clone())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }

    pub fn ollama_url(&self) -> String {
        env::get_string(self.env.as_ref(), OLLAMA_URL_VAR)
            .or_else(|| self.file.ollama_url.clone())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
    }

    pub fn ollama_timeout(&self) -> Result<Duration, ConfigError> {
        let default = self
            .file
            .ollama_timeout
            .unwrap_or(DEFAULT_OLLAMA_TIMEOUT_SECS);
        let secs = env::get_float(self.env.as_ref(), OLLAMA_TIMEOUT_VAR, default)?;
        Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::Invalid {
            name: OLLAMA_TIMEOUT_VAR.to_string(),
            expected: "a positive NUMBER",
        })
    }

    /// Attempt budget for name generation, never below one.
    pub fn max_llm_tries(&self) -> Result<usize, ConfigError> {
        let default = self.file.max_llm_tries.unwrap_or(DEFAULT_MAX_LLM_TRIES);
        let tries = env::get_int(self.env.as_ref(), MAX_LLM_TRIES_VAR, default)?;
        Ok(tries.max(1) as usize)
    }

    pub fn show_config_info(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        println!("Configuration file: {}", config_path.display());
        if config_path.exists() {
            println!("Status: Found");
        } else {
            println!("Status: Not found (using defaults)");
        }

        match self.model_name() {
            Ok(model) => println!("Model: {}", model),
            Err(_) => println!("Model: Not set"),
        }
        println!("Ollama URL: {}", self.ollama_url());
        match self.ollama_timeout() {
            Ok(timeout) => println!("Timeout: {}s", timeout.as_secs_f64()),
            Err(e) => println!("Timeout: {}", e),
        }
        match self.max_llm_tries() {
            Ok(tries) => println!("Max LLM tries: {}", tries),
            Err(e) => println!("Max LLM tries: {}", e),
        }
        let prompt_source = if self.system_prompt() == DEFAULT_SYSTEM_PROMPT {
            "default"
        } else {
            "custom"
        };
        println!("System prompt: {}", prompt_source);

        println!("\nTo choose a model:");
        println!("  export {}=<model>", MODEL_NAME_VAR);
        println!("\nOr add it to the config file:");
        println!("  model_name = \"<model>\"");

        Ok(())
    }
}
