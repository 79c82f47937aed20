use async_trait::async_trait;
use permwatch_core::AppResult;

/// Raw webhook response handed back to the caller uninterpreted.
#[derive(Debug, Clone)]
pub struct NotifierReceipt {
    /// HTTP status code returned by the webhook endpoint.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// Outbound port for posting text messages to the chat webhook.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Posts a single text message, returning the raw webhook response.
    ///
    /// Implementations must not retry or interpret non-2xx responses; a
    /// transport-level failure is the only error case.
    async fn post_text(&self, message: &str) -> AppResult<NotifierReceipt>;
}
