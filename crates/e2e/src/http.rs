//! HTTP access to the application under test

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::config::validate_base_url;
use crate::error::{E2eError, E2eResult};

/// A response as seen by commands: status code and raw body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET for a path relative to the base URL
    async fn get(&self, path: &str) -> E2eResult<HttpResponse>;
}

/// `reqwest`-backed client bound to one base URL
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestClient {
    /// Fails with a configuration error if `base_url` is not an absolute
    /// http(s) URL or the client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> E2eResult<Self> {
        validate_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| E2eError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, path: &str) -> E2eResult<HttpResponse> {
        let url = self.url_for(path);
        debug!("GET {}", url);

        let resp = self.client.get(&url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

/// Client that answers every request with one canned response and
/// remembers the paths it was asked for
#[derive(Debug)]
pub struct StubClient {
    response: HttpResponse,
    requests: Mutex<Vec<String>>,
}

impl StubClient {
    pub fn new(response: HttpResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for StubClient {
    async fn get(&self, path: &str) -> E2eResult<HttpResponse> {
        self.requests.lock().push(path.to_string());
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ReqwestClient::new("http://127.0.0.1:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url_for("/api/health"), "http://127.0.0.1:8080/api/health");
        assert_eq!(client.url_for("api/health"), "http://127.0.0.1:8080/api/health");
    }

    #[test]
    fn test_schemeless_base_url_is_config_error() {
        let err = ReqwestClient::new("localhost:8080", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
        assert_eq!(err.kind(), crate::error::FailureKind::Harness);
    }

    #[tokio::test]
    async fn test_stub_records_each_request() {
        let stub = StubClient::new(HttpResponse::new(204, ""));
        stub.get("/a").await.unwrap();
        stub.get("/a").await.unwrap();
        assert_eq!(stub.requests(), vec!["/a", "/a"]);
    }
}
