//! Collaborator interfaces — pure I/O, no business logic.
//!
//! The intake core talks to three external services through these traits:
//! the inbound mail API, the outbound SMTP transport, and the voice-agent
//! provisioning service. Implementations do the network work; deciding what
//! to fetch, create, or send lives in the processor and services.

pub mod mail_api;
pub mod smtp;
pub mod voice;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::intake::types::InboundMessage;

pub use mail_api::{HttpMailSource, spawn_intake_poller};
pub use smtp::SmtpMailer;
pub use voice::HttpVoiceProvisioner;

/// Inbound message source. Ids are provider-assigned and globally unique
/// per source, but not necessarily monotonic.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch new/unread messages.
    async fn fetch_new(&self) -> Result<Vec<InboundMessage>, TransportError>;
}

/// Outbound email transport. Fire-and-forget — there is no
/// delivery-receipt tracking.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError>;
}

/// Voice-agent provisioning service. Failure is non-fatal to interview
/// creation — the interview is simply created without an agent.
#[async_trait]
pub trait VoiceAgentProvisioner: Send + Sync {
    /// Provision an agent for an interview, returning its opaque id.
    async fn provision(&self, name: &str, description: &str)
    -> Result<String, TransportError>;
}
