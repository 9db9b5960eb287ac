//! Intake processor — dedup gate, classification, and routing.
//!
//! Flow per message:
//! 1. Dedup gate (side-effect-free skip for already-seen ids)
//! 2. Subject classification
//! 3. Job request path: extract fields → resolve client → provision voice
//!    agent (non-fatal) → create interview → notify requester
//! 4. Status query path: aggregate → render → dispatch to the client

use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use crate::channels::{EmailTransport, VoiceAgentProvisioner};
use crate::clients::ClientResolver;
use crate::error::IntakeError;
use crate::intake::classify::classify;
use crate::intake::dedup::SeenMessages;
use crate::intake::extract::{
    CLIENT_LABELS, RESPONSIBLE_LABELS, clean_email, extract_field_any, extract_phone,
    extract_position_type, extract_technology,
};
use crate::intake::types::{InboundMessage, IntakeOutcome, MessageKind};
use crate::interviews::{InterviewCreator, InterviewRequest};
use crate::status::{StatusOutcome, StatusReporter};
use crate::store::Database;

/// Processes inbound messages end to end.
///
/// Owns the dedup cache; everything else is reached through injected
/// collaborators, so tests swap in mocks freely.
pub struct IntakeProcessor {
    seen: Mutex<SeenMessages>,
    clients: ClientResolver,
    interviews: InterviewCreator,
    status: StatusReporter,
    voice: Option<Arc<dyn VoiceAgentProvisioner>>,
}

impl IntakeProcessor {
    pub fn new(
        db: Arc<dyn Database>,
        mailer: Arc<dyn EmailTransport>,
        voice: Option<Arc<dyn VoiceAgentProvisioner>>,
        dedup_capacity: usize,
    ) -> Self {
        Self {
            seen: Mutex::new(SeenMessages::new(dedup_capacity)),
            clients: ClientResolver::new(Arc::clone(&db)),
            interviews: InterviewCreator::new(Arc::clone(&db), Arc::clone(&mailer)),
            status: StatusReporter::new(db, mailer),
            voice,
        }
    }

    /// Process a single inbound message.
    pub async fn handle(&self, message: InboundMessage) -> Result<IntakeOutcome, IntakeError> {
        // The id is recorded before any processing starts, so a second
        // delivery arriving mid-flight is already blocked.
        if !self
            .seen
            .lock()
            .expect("dedup cache mutex poisoned")
            .should_process(&message.id)
        {
            debug!(id = %message.id, "Duplicate message, skipping");
            return Ok(IntakeOutcome::Duplicate);
        }

        let kind = classify(&message.subject);
        info!(
            id = %message.id,
            sender = %message.sender_email,
            kind = kind.label(),
            "Processing inbound message"
        );

        match kind {
            MessageKind::Ignored => {
                debug!(id = %message.id, subject = %message.subject, "Subject matched no intake pattern");
                Ok(IntakeOutcome::Ignored)
            }
            MessageKind::JobRequest { tech_hint } => {
                self.handle_job_request(&message, tech_hint.as_deref()).await
            }
            MessageKind::StatusQuery { interview_id } => {
                let outcome = self
                    .status
                    .report_and_dispatch(&interview_id.to_string())
                    .await?;
                Ok(match outcome {
                    StatusOutcome::NoEvaluations => IntakeOutcome::StatusEmpty { interview_id },
                    StatusOutcome::MissingRecipient => {
                        IntakeOutcome::StatusAborted { interview_id }
                    }
                    StatusOutcome::Dispatched => IntakeOutcome::StatusDispatched { interview_id },
                })
            }
        }
    }

    /// Process a batch of messages independently. Failures are logged per
    /// message and never abort the rest of the batch.
    pub async fn handle_batch(&self, messages: Vec<InboundMessage>) -> Vec<IntakeOutcome> {
        let total = messages.len();
        let mut outcomes = Vec::with_capacity(total);

        for message in messages {
            let id = message.id.clone();
            match self.handle(message).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(id = %id, error = %e, "Failed to process message in batch");
                }
            }
        }

        info!(processed = outcomes.len(), total, "Batch processing complete");
        outcomes
    }

    async fn handle_job_request(
        &self,
        message: &InboundMessage,
        tech_hint: Option<&str>,
    ) -> Result<IntakeOutcome, IntakeError> {
        let Some(sender_email) = clean_email(&message.sender_email) else {
            warn!(
                id = %message.id,
                sender = %message.sender_email,
                "Job request without a usable sender address, rejecting"
            );
            return Ok(IntakeOutcome::Rejected {
                reason: "sender address not extractable".into(),
            });
        };

        let client_name = extract_field_any(CLIENT_LABELS, &message.body)
            .or_else(|| message.sender_name.clone());
        let responsible = extract_field_any(RESPONSIBLE_LABELS, &message.body);
        let phone = extract_phone(&message.body);

        // The subject hint is checked against the vocabulary first; a hint
        // like "ReactJS" resolves to "React", an unknown hint falls back to
        // scanning the body.
        let technology = tech_hint
            .and_then(extract_technology)
            .or_else(|| extract_technology(&message.body));
        let position_type = extract_position_type(&message.body);

        debug!(
            client = client_name.as_deref().unwrap_or("-"),
            responsible = responsible.as_deref().unwrap_or("-"),
            phone = phone.as_deref().unwrap_or("-"),
            technology = technology.as_deref().unwrap_or("-"),
            position = %position_type,
            "Extracted job request fields"
        );

        let client_id = self
            .clients
            .resolve_or_create(
                &sender_email,
                client_name.as_deref(),
                responsible.as_deref(),
                phone.as_deref(),
            )
            .await
            .map_err(IntakeError::Persistence)?;

        let interview_name = interview_name_from_subject(&message.subject);
        let profile = match &technology {
            Some(tech) => format!("{position_type} {tech}"),
            None => position_type.clone(),
        };

        let voice_agent_id = match &self.voice {
            Some(voice) => {
                let agent_description = format!(
                    "Entrevista técnica para el perfil {profile}.\n\n{}",
                    message.body
                );
                match voice.provision(&interview_name, &agent_description).await {
                    Ok(agent_id) => Some(agent_id),
                    Err(e) => {
                        // Non-fatal: the interview proceeds without an agent
                        warn!(error = %e, interview = %interview_name, "Voice agent provisioning failed");
                        None
                    }
                }
            }
            None => None,
        };

        let interview = self
            .interviews
            .create(InterviewRequest {
                name: interview_name,
                description: message.body.clone(),
                client_id,
                voice_agent_id,
                notify_to: sender_email,
            })
            .await
            .map_err(IntakeError::Persistence)?;

        Ok(IntakeOutcome::InterviewCreated {
            interview_id: interview.id,
        })
    }
}

/// Interview name: the subject without its `-JD` suffix.
fn interview_name_from_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    // The suffix is ASCII, so slicing three bytes off the end is safe
    // whenever the lowercased subject ends with it.
    let name = if trimmed.to_lowercase().ends_with("-jd") && trimmed.len() >= 3 {
        trimmed[..trimmed.len() - 3].trim()
    } else {
        trimmed
    };
    name.to_string()
}
