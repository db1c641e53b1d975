//! HTTP client abstraction for talking to the naming service.
//!
//! This module provides a trait-based abstraction over HTTP clients, enabling
//! dependency injection and easy mocking in tests. Transport failures are
//! classified here so callers never have to inspect `reqwest` errors.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a request never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request URL has an unsupported protocol '{0}://'")]
    UnsupportedScheme(String),

    #[error("Couldn't connect to {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

/// Trait for HTTP communication with external APIs.
///
/// This abstraction allows injecting mock HTTP clients for testing without
/// making real network requests.
///
/// # Example
///
/// ```ignore
/// use uhu::http_client::{HttpClient, ReqwestHttpClient};
///
/// let client = ReqwestHttpClient::new();
/// let response = client.post_json(
///     &"http://localhost:11434/api/generate".parse()?,
///     &serde_json::json!({"model": "llama3"}),
///     std::time::Duration::from_secs(30),
/// ).await?;
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST request with a JSON body and returns status and body.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if no response arrives within `timeout`
    /// or the request cannot be sent at all. Non-success statuses are not
    /// errors at this layer.
    async fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError>;
}

/// HTTP client implementation using reqwest.
///
/// This is the default production implementation that makes real HTTP requests.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default configuration.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::UnsupportedScheme(url.scheme().to_string()));
        }

        let response = self
            .client
            .post(url.clone())
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, url))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(e, url))?;
        Ok(HttpResponse { status, body })
    }
}

fn classify(error: reqwest::Error, url: &Url) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(url.origin().ascii_serialization())
    } else {
        TransportError::Other(error.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Mock HTTP client for testing.
    ///
    /// Hands out queued responses in order and records every request body.
    pub struct MockHttpClient {
        responses: Mutex<Vec<Result<HttpResponse, TransportError>>>,
        pub requests: Mutex<Vec<(Url, serde_json::Value)>>,
    }

    impl MockHttpClient {
        pub fn new(responses: Vec<Result<HttpResponse, TransportError>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(body: &str) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status: 200,
                body: body.to_string(),
            })
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn post_json(
            &self,
            url: &Url,
            body: &serde_json::Value,
            _timeout: Duration,
        ) -> Result<HttpResponse, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.clone(), body.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError::Other("no response queued".to_string())))
        }
    }

    #[test]
    fn test_success_range() {
        let ok = HttpResponse {
            status: 204,
            body: String::new(),
        };
        let not_found = HttpResponse {
            status: 404,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!not_found.is_success());
    }

    #[tokio::test]
    async fn test_reqwest_client_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({"model": "llama3"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"response\":\"{}\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/api/generate", server.uri())).unwrap();
        let response = ReqwestHttpClient::new()
            .post_json(
                &url,
                &serde_json::json!({"model": "llama3"}),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{\"response\":\"{}\"}");
    }

    #[tokio::test]
    async fn test_reqwest_client_reports_error_status_as_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/api/generate", server.uri())).unwrap();
        let response = ReqwestHttpClient::new()
            .post_json(&url, &serde_json::json!({}), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, "model not found");
    }

    #[tokio::test]
    async fn test_reqwest_client_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/api/generate", server.uri())).unwrap();
        let result = ReqwestHttpClient::new()
            .post_json(&url, &serde_json::json!({}), Duration::from_millis(100))
            .await;

        assert!(matches!(result, Err(TransportError::Timeout)));
    }

    #[tokio::test]
    async fn test_reqwest_client_reports_refused_connection() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{port}/api/generate")).unwrap();
        let result = ReqwestHttpClient::new()
            .post_json(&url, &serde_json::json!({}), Duration::from_secs(5))
            .await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
    }

    #[tokio::test]
    async fn test_reqwest_client_rejects_unsupported_scheme() {
        let url = Url::parse("ftp://localhost:11434/api/generate").unwrap();
        let result = ReqwestHttpClient::new()
            .post_json(&url, &serde_json::json!({}), Duration::from_secs(5))
            .await;

        match result {
            Err(TransportError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "ftp"),
            other => panic!("expected unsupported scheme, got {other:?}"),
        }
    }
}
