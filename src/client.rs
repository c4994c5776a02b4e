//! Reqwest-backed client for the task endpoint.
//!
//! One call per verb: build the URL, send, decode the envelope. Whatever the
//! status code, a body that decodes as an envelope is handed back to the
//! caller; only transport and decode failures become errors. No retry, no
//! timeout.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::types::{Envelope, Task, TaskStatus};

/// Failure to reach the endpoint or to make sense of its answer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unreadable response (status {status}): {preview}")]
    Decode { status: u16, preview: String },
}

/// The four operations of the task endpoint.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, user: &str) -> Result<Envelope<Vec<Task>>, ClientError>;

    async fn create_task(&self, user: &str, title: &str) -> Result<Envelope<Task>, ClientError>;

    async fn update_task_status(
        &self,
        user: &str,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Envelope<Task>, ClientError>;

    async fn delete_task(&self, user: &str, task_id: i64) -> Result<Envelope<()>, ClientError>;
}

/// HTTP implementation of [`TaskApi`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Client for the endpoint at `base_url` (for example
    /// `http://127.0.0.1:8080/api/tasks`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_url(&self, user: &str) -> String {
        format!("{}?user={}", self.base_url, urlencoding::encode(user))
    }
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn list_tasks(&self, user: &str) -> Result<Envelope<Vec<Task>>, ClientError> {
        let response = self.client.get(self.user_url(user)).send().await?;
        decode(response).await
    }

    async fn create_task(&self, user: &str, title: &str) -> Result<Envelope<Task>, ClientError> {
        let response = self
            .client
            .post(self.user_url(user))
            .json(&json!({ "title": title }))
            .send()
            .await?;
        decode(response).await
    }

    async fn update_task_status(
        &self,
        user: &str,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Envelope<Task>, ClientError> {
        let response = self
            .client
            .put(self.user_url(user))
            .json(&json!({ "id": task_id, "status": status }))
            .send()
            .await?;
        decode(response).await
    }

    async fn delete_task(&self, user: &str, task_id: i64) -> Result<Envelope<()>, ClientError> {
        let url = format!("{}&id={}", self.user_url(user), task_id);
        let response = self.client.delete(url).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<Envelope<T>, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    parse_envelope(status, &body)
}

fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<Envelope<T>, ClientError> {
    serde_json::from_slice(body).map_err(|_| ClientError::Decode {
        status: status.as_u16(),
        preview: body_preview(body),
    })
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_is_url_encoded() {
        let client = ApiClient::new("http://localhost/api/tasks");
        assert_eq!(
            client.user_url("ana maria&co"),
            "http://localhost/api/tasks?user=ana%20maria%26co"
        );
    }

    #[test]
    fn failure_envelopes_decode_whatever_the_status() {
        let envelope: Envelope<Task> = parse_envelope(
            StatusCode::BAD_REQUEST,
            br#"{"success": false, "message": "Task title is required"}"#,
        )
        .unwrap();

        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("Task title is required"));
    }

    #[test]
    fn null_data_decodes_as_none() {
        let envelope: Envelope<Task> =
            parse_envelope(StatusCode::OK, br#"{"success": true, "data": null}"#).unwrap();

        assert!(envelope.success);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn unparsable_bodies_are_decode_errors() {
        let err = parse_envelope::<Vec<Task>>(StatusCode::BAD_GATEWAY, b"<html>\n  Bad gateway\n</html>")
            .unwrap_err();

        match err {
            ClientError::Decode { status, preview } => {
                assert_eq!(status, 502);
                assert_eq!(preview, "<html> Bad gateway </html>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
