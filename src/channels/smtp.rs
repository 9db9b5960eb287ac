//! Outbound email via SMTP (lettre, rustls TLS).
//!
//! The transport is rebuilt per send — dispatch volume is a handful of
//! notifications and reports per day, and a fresh connection avoids stale
//! session handling. `lettre::SmtpTransport` is blocking, so sends run on
//! the blocking pool.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::channels::EmailTransport;
use crate::config::{SEND_TIMEOUT, SmtpConfig};
use crate::error::TransportError;

/// SMTP implementation of the email transport collaborator.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        let config = self.config.clone();
        let to = to.to_string();
        let subject = subject.to_string();
        let body = body.to_string();

        tokio::task::spawn_blocking(move || send_blocking(&config, &to, &subject, &body))
            .await
            .map_err(|e| TransportError::SendFailed {
                name: "smtp".into(),
                reason: format!("send task panicked: {e}"),
            })?
    }
}

fn send_blocking(
    config: &SmtpConfig,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), TransportError> {
    let creds = Credentials::new(
        config.username.clone(),
        config.password.expose_secret().to_string(),
    );

    let transport = SmtpTransport::relay(&config.host)
        .map_err(|e| TransportError::SendFailed {
            name: "smtp".into(),
            reason: format!("SMTP relay error: {e}"),
        })?
        .port(config.port)
        .credentials(creds)
        .timeout(Some(SEND_TIMEOUT))
        .build();

    let email = Message::builder()
        .from(config.from_address.parse().map_err(|e| {
            TransportError::SendFailed {
                name: "smtp".into(),
                reason: format!("Invalid from address: {e}"),
            }
        })?)
        .to(to.parse().map_err(|e| TransportError::SendFailed {
            name: "smtp".into(),
            reason: format!("Invalid to address: {e}"),
        })?)
        .subject(subject)
        .body(body.to_string())
        .map_err(|e| TransportError::SendFailed {
            name: "smtp".into(),
            reason: format!("Failed to build email: {e}"),
        })?;

    transport.send(&email).map_err(|e| TransportError::SendFailed {
        name: "smtp".into(),
        reason: format!("SMTP send error: {e}"),
    })?;

    debug!(to = to, subject = subject, "Email dispatched");
    Ok(())
}
