//! Client for the bracket validation service.

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ValidateRequest<'a> {
    pub string: &'a str,
}

/// Status code plus decoded body. Bodies that are not JSON come back as a
/// JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub http_status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }

    /// The `status` field of a validation or cluster response.
    pub fn status(&self) -> Option<&str> {
        self.body
            .get("status")
            .or_else(|| self.body.get("redis_cluster"))
            .and_then(Value::as_str)
    }

    /// The `error.message` field of an error response.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error")?.get("message")?.as_str()
    }
}

pub struct BracketClient {
    client: Client,
    base_url: String,
}

impl BracketClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `POST /validate`
    pub async fn validate(&self, input: &str) -> Result<ApiResponse, reqwest::Error> {
        let resp = self
            .client
            .post(format!("{}/validate", self.base_url))
            .json(&ValidateRequest { string: input })
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// `POST /validate` with an arbitrary raw body.
    pub async fn validate_raw(&self, body: impl Into<String>) -> Result<ApiResponse, reqwest::Error> {
        let resp = self
            .client
            .post(format!("{}/validate", self.base_url))
            .header("content-type", "application/json")
            .body(body.into())
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// `GET /status`
    pub async fn cluster_status(&self) -> Result<ApiResponse, reqwest::Error> {
        self.get("/status").await
    }

    /// `GET /stats`
    pub async fn stats(&self) -> Result<ApiResponse, reqwest::Error> {
        self.get("/stats").await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<ApiResponse, reqwest::Error> {
        self.get("/health").await
    }

    /// `GET` any path, for probing routes the client has no method for.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, reqwest::Error> {
        let resp = self.client.get(format!("{}{}", self.base_url, path)).send().await?;
        Self::decode(resp).await
    }

    async fn decode(resp: Response) -> Result<ApiResponse, reqwest::Error> {
        let http_status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(ApiResponse { http_status, body })
    }
}
