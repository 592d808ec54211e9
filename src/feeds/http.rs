//! reqwest-backed transport for the dashboard API
//!
//! All feeds live under one base URL (default `http://127.0.0.1:8000/api`).
//! Responses are read as JSON and decoded per feed by
//! [`FeedPayload::decode`].

use super::{ApiMethod, ApiRequest, DashboardApi, FeedError, FeedKind, FeedPayload};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub struct HttpDashboardApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDashboardApi {
    /// Build a client with a per-request timeout
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `http://127.0.0.1:8000/api`
    /// * `timeout` - applied to every request, fetches and actions alike
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_body(path: &str, response: reqwest::Response) -> Result<Value, FeedError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| FeedError::Transport(format!(
            "invalid JSON from {}: {}",
            path, e
        )))
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn fetch(&self, feed: FeedKind) -> Result<FeedPayload, FeedError> {
        let path = feed.path();
        let response = self.client.get(self.url(path)).send().await?;
        let body = Self::read_body(path, response).await?;
        FeedPayload::decode(feed, body)
    }

    async fn send(&self, request: &ApiRequest) -> Result<Value, FeedError> {
        let url = self.url(&request.path);
        let builder = match request.method {
            ApiMethod::Get => self.client.get(url),
            ApiMethod::Post => self.client.post(url),
            ApiMethod::Delete => self.client.delete(url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await?;
        Self::read_body(&request.path, response).await
    }
}
