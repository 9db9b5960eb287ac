//! HTTP mail source — bearer-token auth plus unread-message fetch — and
//! the background poller feeding messages into the intake processor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::channels::MessageSource;
use crate::config::{FETCH_TIMEOUT, MailApiConfig, TOKEN_TIMEOUT};
use crate::error::TransportError;
use crate::intake::IntakeProcessor;
use crate::intake::types::InboundMessage;

/// HTTP implementation of the inbound message source.
pub struct HttpMailSource {
    config: MailApiConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Message shape on the wire, mapped into `InboundMessage`.
#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
    sender: String,
    #[serde(default)]
    sender_name: Option<String>,
    #[serde(default)]
    received_at: Option<DateTime<Utc>>,
}

impl From<WireMessage> for InboundMessage {
    fn from(wire: WireMessage) -> Self {
        InboundMessage {
            id: wire.id,
            subject: wire.subject,
            body: wire.body,
            sender_email: wire.sender,
            sender_name: wire.sender_name,
            received_at: wire.received_at.unwrap_or_else(Utc::now),
        }
    }
}

impl HttpMailSource {
    pub fn new(config: MailApiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Acquire a bearer token via the client-credentials grant.
    async fn acquire_token(&self) -> Result<String, TransportError> {
        let response = self
            .http
            .post(format!("{}/oauth/token", self.config.base_url))
            .timeout(TOKEN_TIMEOUT)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| TransportError::AuthFailed {
                name: "mail-api".into(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(TransportError::AuthFailed {
                name: "mail-api".into(),
                reason: format!("token endpoint returned {}", response.status()),
            });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| TransportError::InvalidResponse {
                    name: "mail-api".into(),
                    reason: format!("token body: {e}"),
                })?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl MessageSource for HttpMailSource {
    async fn fetch_new(&self) -> Result<Vec<InboundMessage>, TransportError> {
        let token = self.acquire_token().await?;

        let url = format!(
            "{}/mailboxes/{}/messages",
            self.config.base_url, self.config.mailbox
        );
        let response = self
            .http
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .bearer_auth(token)
            .query(&[("status", "unread")])
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Http(format!(
                "message fetch returned {}",
                response.status()
            )));
        }

        let messages: Vec<WireMessage> =
            response
                .json()
                .await
                .map_err(|e| TransportError::InvalidResponse {
                    name: "mail-api".into(),
                    reason: format!("message list body: {e}"),
                })?;

        debug!(count = messages.len(), "Fetched unread messages");
        Ok(messages.into_iter().map(InboundMessage::from).collect())
    }
}

// ── Poller ──────────────────────────────────────────────────────────

/// Spawn a background task that polls the message source and feeds new
/// messages into the intake processor.
///
/// Returns a `JoinHandle` and a shutdown flag. Set the flag to stop
/// polling after the current cycle.
pub fn spawn_intake_poller(
    source: Arc<dyn MessageSource>,
    processor: Arc<IntakeProcessor>,
    poll_interval: Duration,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(
            interval_secs = poll_interval.as_secs(),
            "Intake poller started"
        );

        let mut tick = tokio::time::interval(poll_interval);

        loop {
            tick.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                info!("Intake poller shutting down");
                return;
            }

            poll_once(&source, &processor).await;
        }
    });

    (handle, shutdown_flag)
}

/// One poll cycle: fetch unread messages and process the batch. Each
/// message is handled to completion before the next; fetch failures are
/// logged and retried on the following tick.
async fn poll_once(source: &Arc<dyn MessageSource>, processor: &Arc<IntakeProcessor>) {
    let messages = match source.fetch_new().await {
        Ok(messages) => messages,
        Err(e) => {
            error!(error = %e, "Mailbox poll failed");
            return;
        }
    };

    if messages.is_empty() {
        return;
    }

    debug!(count = messages.len(), "Processing fetched messages");
    processor.handle_batch(messages).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_message_maps_to_inbound() {
        let wire: WireMessage = serde_json::from_value(serde_json::json!({
            "id": "msg-1",
            "subject": "ReactJS-JD",
            "body": "Cliente: Acme -",
            "sender": "Juan <juan@acme.com>",
            "sender_name": "Juan",
            "received_at": "2025-06-01T12:00:00Z",
        }))
        .unwrap();

        let inbound = InboundMessage::from(wire);
        assert_eq!(inbound.id, "msg-1");
        assert_eq!(inbound.subject, "ReactJS-JD");
        assert_eq!(inbound.sender_email, "Juan <juan@acme.com>");
        assert_eq!(
            inbound.received_at.to_rfc3339(),
            "2025-06-01T12:00:00+00:00"
        );
    }

    #[test]
    fn wire_message_defaults_missing_fields() {
        let wire: WireMessage = serde_json::from_value(serde_json::json!({
            "id": "msg-2",
            "sender": "x@y.com",
        }))
        .unwrap();

        let inbound = InboundMessage::from(wire);
        assert!(inbound.subject.is_empty());
        assert!(inbound.body.is_empty());
        assert!(inbound.sender_name.is_none());
    }
}
