//! Status reporting — aggregation, rendering, and email dispatch.

pub mod overview;
pub mod report;

use std::sync::Arc;

use tracing::{info, warn};

use crate::channels::EmailTransport;
use crate::error::EvaluationError;
use crate::status::overview::StatusAggregator;
use crate::store::Database;

pub use overview::{CandidateOverview, RankingSlot, StatusOverview};

/// Outcome of a status report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    /// No evaluations exist yet — nothing was rendered or sent.
    NoEvaluations,
    /// The report was rendered and handed to the email transport.
    Dispatched,
    /// The client record carries no email address; dispatch was aborted
    /// rather than guessing a recipient.
    MissingRecipient,
}

/// Builds, renders, and dispatches status reports.
pub struct StatusReporter {
    aggregator: StatusAggregator,
    mailer: Arc<dyn EmailTransport>,
}

impl StatusReporter {
    pub fn new(db: Arc<dyn Database>, mailer: Arc<dyn EmailTransport>) -> Self {
        Self {
            aggregator: StatusAggregator::new(db),
            mailer,
        }
    }

    /// Build the overview for an interview and dispatch the rendered
    /// report to the client's stored email address.
    pub async fn report_and_dispatch(
        &self,
        interview_id: &str,
    ) -> Result<StatusOutcome, EvaluationError> {
        let Some(overview) = self.aggregator.build_overview(interview_id).await? else {
            info!(interview_id = interview_id, "No evaluations yet, skipping report");
            return Ok(StatusOutcome::NoEvaluations);
        };

        let to = overview.client.email.trim();
        if to.is_empty() {
            warn!(
                interview_id = interview_id,
                client_id = %overview.client.id,
                "Client has no email address, aborting report dispatch"
            );
            return Ok(StatusOutcome::MissingRecipient);
        }

        let subject = report::render_subject(&overview);
        let body = report::render_body(&overview);

        match self.mailer.send(to, &subject, &body).await {
            Ok(()) => {
                info!(
                    interview_id = interview_id,
                    to = to,
                    candidates = overview.candidates_count,
                    "Status report dispatched"
                );
            }
            Err(e) => {
                // Transport failure does not invalidate the aggregation
                warn!(error = %e, to = to, "Status report dispatch failed");
            }
        }

        Ok(StatusOutcome::Dispatched)
    }
}
