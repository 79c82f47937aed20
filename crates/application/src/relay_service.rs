//! Relay pipeline: decode, extract, format, notify.

use std::sync::Arc;

use permwatch_core::{AppError, AppResult};
use permwatch_domain::{ChangeSummary, PushEnvelope};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::relay_ports::{ChatNotifier, NotifierReceipt};

/// Terminal outcome of one push delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The envelope carried no payload; nothing was sent.
    NoData,
    /// The pipeline completed and the notification was delivered.
    Delivered,
    /// The pipeline failed; a diagnostic was sent on a best-effort basis.
    Failed,
}

/// Application service that relays audit log pushes to the chat webhook.
#[derive(Clone)]
pub struct RelayService {
    notifier: Arc<dyn ChatNotifier>,
}

impl RelayService {
    /// Creates a new relay service from a notifier implementation.
    #[must_use]
    pub fn new(notifier: Arc<dyn ChatNotifier>) -> Self {
        Self { notifier }
    }

    /// Processes one push delivery body end to end.
    ///
    /// Every pipeline error is absorbed here: it is reported through the
    /// notifier on a best-effort basis and surfaces to the caller only as
    /// [`RelayOutcome::Failed`].
    pub async fn handle_push(&self, body: &[u8]) -> RelayOutcome {
        let payload = match decode_payload(body) {
            Ok(None) => return RelayOutcome::NoData,
            Ok(Some(payload)) => payload,
            Err(decode_error) => {
                self.report_failure(&decode_error, None).await;
                return RelayOutcome::Failed;
            }
        };

        info!(payload = %payload, "decoded audit log payload");

        match self.notify_change(&payload).await {
            Ok(receipt) => {
                debug!(
                    status = receipt.status,
                    body = %receipt.body,
                    "chat webhook accepted notification"
                );
                RelayOutcome::Delivered
            }
            Err(pipeline_error) => {
                self.report_failure(&pipeline_error, Some(&payload)).await;
                RelayOutcome::Failed
            }
        }
    }

    async fn notify_change(&self, payload: &str) -> AppResult<NotifierReceipt> {
        let log: Value =
            serde_json::from_str(payload).map_err(|error| AppError::Json(error.to_string()))?;
        let summary = ChangeSummary::from_log_entry(&log)?;

        info!(
            project_id = summary.project_id(),
            changed_by = summary.changed_by(),
            insert_id = summary.insert_id(),
            "extracted permission change"
        );

        let message = summary.to_chat_message();
        self.notifier.post_text(&message).await
    }

    async fn report_failure(&self, failure: &AppError, payload: Option<&str>) {
        error!(error = %failure, "relay pipeline failed");

        let diagnostic = failure_report(failure, payload);
        if let Err(report_error) = self.notifier.post_text(&diagnostic).await {
            warn!(
                error = %report_error,
                "failed to deliver failure report to chat webhook"
            );
        }
    }
}

/// Builds the diagnostic chat message for a failed delivery. The payload line
/// is rendered empty when the failure happened before decoding completed.
fn failure_report(failure: &AppError, payload: Option<&str>) -> String {
    format!(
        "Error processing audit log push: {failure}\nReceived message: {}",
        payload.unwrap_or_default()
    )
}

fn decode_payload(body: &[u8]) -> AppResult<Option<String>> {
    let envelope = PushEnvelope::from_slice(body)?;
    envelope.decoded_payload()
}
