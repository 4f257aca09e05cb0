use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::model::{Document, Folder};

/// Remote persistence service boundary. The real implementation speaks
/// HTTP/JSON; tests substitute recording fakes.
#[async_trait]
pub trait PersistenceApi: Send + Sync {
    async fn create_document(&self, fields: &Value) -> Result<Document>;
    async fn update_document(&self, id: &str, fields: &Value) -> Result<Document>;
    async fn delete_document(&self, id: &str) -> Result<()>;

    async fn create_folder(&self, fields: &Value) -> Result<Folder>;
    async fn update_folder(&self, id: &str, fields: &Value) -> Result<Folder>;
    async fn delete_folder(&self, id: &str) -> Result<()>;

    async fn update_folder_expansion(&self, id: &str, is_expanded: bool) -> Result<Folder>;
}

/// reqwest-backed client for the persistence service. Session credentials are
/// the surrounding auth layer's concern: pass a pre-configured `Client` via
/// `with_client` when requests must carry a session cookie or header.
#[derive(Clone)]
pub struct HttpPersistenceApi {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl fmt::Debug for HttpPersistenceApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPersistenceApi")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpPersistenceApi {
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent("padsync/0.1")
            .build()
            .expect("reqwest client");
        Self::with_client(http, base_url, timeout)
    }

    pub fn with_client(http: Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(&cfg.api.base_url).context("invalid api.base_url")?;
        Ok(Self::new(base_url, Duration::from_millis(cfg.api.timeout_ms)))
    }

    /// Every request carries an explicit timeout so a hung call can never
    /// stall the drain loop indefinitely.
    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path '{path}'"))?;
        let mut builder = self.http.request(method, endpoint).timeout(self.timeout);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder.build().context("failed to build persistence request")
    }

    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        debug!(method = %request.method(), url = %request.url(), "sending persistence request");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach persistence service")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("persistence service error {}: {}", status, body));
        }
        Ok(res)
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T> {
        let res = self.execute(request).await?;
        res.json().await.context("invalid persistence response")
    }

    async fn execute_empty(&self, request: reqwest::Request) -> Result<()> {
        self.execute(request).await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceApi for HttpPersistenceApi {
    async fn create_document(&self, fields: &Value) -> Result<Document> {
        let request = self.build_request(Method::POST, "documents", Some(fields))?;
        self.execute_json(request).await
    }

    async fn update_document(&self, id: &str, fields: &Value) -> Result<Document> {
        let request = self.build_request(Method::PUT, &format!("documents/{id}"), Some(fields))?;
        self.execute_json(request).await
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let request = self.build_request(Method::DELETE, &format!("documents/{id}"), None)?;
        self.execute_empty(request).await
    }

    async fn create_folder(&self, fields: &Value) -> Result<Folder> {
        let request = self.build_request(Method::POST, "folders", Some(fields))?;
        self.execute_json(request).await
    }

    async fn update_folder(&self, id: &str, fields: &Value) -> Result<Folder> {
        let request = self.build_request(Method::PUT, &format!("folders/{id}"), Some(fields))?;
        self.execute_json(request).await
    }

    async fn delete_folder(&self, id: &str) -> Result<()> {
        let request = self.build_request(Method::DELETE, &format!("folders/{id}"), None)?;
        self.execute_empty(request).await
    }

    async fn update_folder_expansion(&self, id: &str, is_expanded: bool) -> Result<Folder> {
        let body = json!({ "is_expanded": is_expanded });
        let request =
            self.build_request(Method::PUT, &format!("folders/{id}/expand"), Some(&body))?;
        self.execute_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_api() -> HttpPersistenceApi {
        let base = Url::parse("https://pads.example.com/api/v1/").unwrap();
        HttpPersistenceApi::new(base, Duration::from_secs(10))
    }

    #[test]
    fn build_request_joins_paths_and_sets_json_body() {
        let api = sample_api();
        let body = json!({ "title": "Notes" });
        let request = api
            .build_request(Method::POST, "documents", Some(&body))
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().path(), "/api/v1/documents");
        assert_eq!(
            request
                .headers()
                .get("Content-Type")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/json"
        );
        let sent: Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(sent["title"], "Notes");
    }

    #[test]
    fn build_request_carries_timeout() {
        let api = sample_api();
        let request = api
            .build_request(Method::DELETE, "documents/d1", None)
            .unwrap();
        assert_eq!(request.timeout(), Some(&Duration::from_secs(10)));
        assert_eq!(request.url().path(), "/api/v1/documents/d1");
        assert!(request.body().is_none());
    }

    #[test]
    fn expansion_uses_dedicated_endpoint() {
        let api = sample_api();
        let body = json!({ "is_expanded": true });
        let request = api
            .build_request(Method::PUT, "folders/f1/expand", Some(&body))
            .unwrap();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.url().path(), "/api/v1/folders/f1/expand");
    }
}
