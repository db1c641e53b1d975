//! Client for the local inference endpoint that suggests alias names.

use crate::config::Config;
use crate::error::{Result, UhuError};
use crate::history::HistoryEntry;
use crate::http_client::{HttpClient, ReqwestHttpClient, TransportError};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const GENERATE_PATH: &str = "api/generate";
const TEMPERATURE: f64 = 0.2;

/// What the model is shown about the command.
#[derive(Debug, Serialize)]
struct NamePrompt<'a> {
    directory: String,
    command: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    names_blacklist: &'a [String],
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    format: &'static str,
    stream: bool,
    prompt: String,
    system: &'a str,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ShortnameReply {
    shortname: String,
}

/// Anything that can propose a name for a command.
#[async_trait]
pub trait NameSource: Send + Sync {
    /// Suggests a name for `command`, avoiding everything in `blacklist`.
    async fn suggest(&self, command: &HistoryEntry, blacklist: &[String]) -> Result<String>;
}

/// Asks an Ollama server for a `shortname`.
pub struct OllamaNamer {
    http: Box<dyn HttpClient>,
    config: Arc<Config>,
}

impl OllamaNamer {
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_client(config, Box::new(ReqwestHttpClient::new()))
    }

    pub fn with_client(config: Arc<Config>, http: Box<dyn HttpClient>) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> Result<Url> {
        let base = self.config.ollama_url();
        let url = Url::parse(&base)
            .map_err(|e| UhuError::ServiceUnavailable(format!("Bad naming service URL '{base}': {e}!")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(UhuError::ServiceUnavailable(format!(
                "{}!",
                TransportError::UnsupportedScheme(url.scheme().to_string())
            )));
        }
        url.join(GENERATE_PATH)
            .map_err(|e| UhuError::ServiceUnavailable(format!("Bad naming service URL '{base}': {e}!")))
    }
}

#[async_trait]
impl NameSource for OllamaNamer {
    async fn suggest(&self, command: &HistoryEntry, blacklist: &[String]) -> Result<String> {
        let model = self.config.model_name()?;
        let timeout = self.config.ollama_timeout()?;
        let system = self.config.system_prompt();
        let url = self.endpoint()?;

        let prompt = NamePrompt {
            directory: command.directory.display().to_string(),
            command: command.command.trim(),
            names_blacklist: blacklist,
        };
        let request = GenerateRequest {
            model: &model,
            format: "json",
            stream: false,
            prompt: serde_json::to_string(&prompt).map_err(protocol_error)?,
            system: &system,
            options: GenerateOptions {
                temperature: TEMPERATURE,
            },
        };
        let body = serde_json::to_value(&request).map_err(protocol_error)?;

        info!("Asking {} ({}) for a name", url, model);
        let response = self
            .http
            .post_json(&url, &body, timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => UhuError::ServiceTimeout,
                TransportError::UnsupportedScheme(_) | TransportError::Connect(_) => {
                    UhuError::ServiceUnavailable(format!("{e}!"))
                }
                TransportError::Other(reason) => {
                    UhuError::ServiceUnavailable(format!("Naming service request failed: {reason}"))
                }
            })?;

        if !response.is_success() {
            return Err(UhuError::ServiceProtocol {
                status: Some(response.status),
                detail: response.body,
            });
        }

        debug!("Naming service replied: {}", response.body);
        let name = parse_shortname(&response.body)?;
        Ok(name.trim().to_lowercase())
    }
}

/// Unwraps the two JSON layers: the HTTP body holds `response`, a string
/// that is itself JSON holding `shortname`.
fn parse_shortname(body: &str) -> Result<String> {
    let outer: GenerateResponse = serde_json::from_str(body).map_err(protocol_error)?;
    let inner: ShortnameReply = serde_json::from_str(&outer.response).map_err(protocol_error)?;
    Ok(inner.shortname)
}

fn protocol_error(e: serde_json::Error) -> UhuError {
    UhuError::ServiceProtocol {
        status: None,
        detail: e.to_string(),
    }
}
