//! Pub/Sub push envelope decoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use permwatch_core::{AppError, AppResult};
use serde::Deserialize;

/// Push delivery envelope posted by the Pub/Sub subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    /// The wrapped Pub/Sub message; absent envelopes are a valid no-op.
    #[serde(default)]
    pub message: Option<PubsubMessage>,
}

/// The Pub/Sub message carried inside a push envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct PubsubMessage {
    /// Base64-encoded payload; absent payloads are a valid no-op.
    #[serde(default)]
    pub data: Option<String>,
}

impl PushEnvelope {
    /// Parses a raw push request body.
    pub fn from_slice(body: &[u8]) -> AppResult<Self> {
        serde_json::from_slice(body).map_err(|error| AppError::Json(error.to_string()))
    }

    /// Returns the decoded UTF-8 payload text, or `None` when the envelope
    /// carries no data.
    pub fn decoded_payload(&self) -> AppResult<Option<String>> {
        let Some(data) = self
            .message
            .as_ref()
            .and_then(|message| message.data.as_ref())
        else {
            return Ok(None);
        };

        let bytes = STANDARD
            .decode(data)
            .map_err(|error| AppError::Decode(format!("invalid base64 payload: {error}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|error| AppError::Decode(format!("payload is not valid UTF-8: {error}")))?;

        Ok(Some(text))
    }
}
