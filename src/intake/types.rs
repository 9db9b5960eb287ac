//! Shared types for the message intake pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inbound message delivered by the mail source collaborator.
///
/// The id is provider-assigned, globally unique per source, and is the
/// dedup key. Messages are immutable and consumed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub subject: String,
    pub body: String,
    /// Raw sender field — may be a bare address or `Display Name <email>`.
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Classification of an inbound message by subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// A request to open a new interview; the token preceding the `-JD`
    /// suffix is carried as a technology hint.
    JobRequest { tech_hint: Option<String> },
    /// A request for the evaluation status of an existing interview.
    StatusQuery { interview_id: Uuid },
    /// Anything else — dropped after a debug log.
    Ignored,
}

impl MessageKind {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::JobRequest { .. } => "job_request",
            Self::StatusQuery { .. } => "status_query",
            Self::Ignored => "ignored",
        }
    }
}

/// Outcome of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Already seen — skipped without side effects.
    Duplicate,
    /// Subject matched no intake pattern.
    Ignored,
    /// A job request without a usable sender address — no client can be
    /// resolved and no notification sent.
    Rejected { reason: String },
    /// A new interview was created.
    InterviewCreated { interview_id: String },
    /// A status report was rendered and handed to the email transport.
    StatusDispatched { interview_id: Uuid },
    /// The interview exists but has no evaluations yet; nothing dispatched.
    StatusEmpty { interview_id: Uuid },
    /// The client record has no email address; dispatch was aborted.
    StatusAborted { interview_id: Uuid },
}
