//! Chat webhook delivery over HTTP.

use async_trait::async_trait;
use permwatch_application::{ChatNotifier, NotifierReceipt};
use permwatch_core::{AppError, AppResult};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::debug;

/// Payload shape expected by Google Chat incoming webhooks.
#[derive(Debug, Serialize)]
struct ChatPostBody<'a> {
    text: &'a str,
}

/// HTTP implementation of the chat webhook notifier.
pub struct HttpChatNotifier {
    http_client: reqwest::Client,
    webhook_url: String,
}

impl HttpChatNotifier {
    /// Creates a new notifier posting to the given webhook URL.
    #[must_use]
    pub fn new(http_client: reqwest::Client, webhook_url: String) -> Self {
        Self {
            http_client,
            webhook_url,
        }
    }
}

#[async_trait]
impl ChatNotifier for HttpChatNotifier {
    async fn post_text(&self, message: &str) -> AppResult<NotifierReceipt> {
        let payload = serde_json::to_vec(&ChatPostBody { text: message }).map_err(|error| {
            AppError::Internal(format!("failed to encode chat payload: {error}"))
        })?;

        let response = self
            .http_client
            .post(self.webhook_url.as_str())
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(payload)
            .send()
            .await
            .map_err(|error| {
                AppError::Transport(format!("chat webhook request failed: {error}"))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());

        debug!(status, "chat webhook responded");

        Ok(NotifierReceipt { status, body })
    }
}
