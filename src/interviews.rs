//! Interview record creation — append-only insert plus requester
//! notification.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::channels::EmailTransport;
use crate::error::PersistenceError;
use crate::store::{Database, Interview};

/// A request to open a new interview.
#[derive(Debug, Clone)]
pub struct InterviewRequest {
    pub name: String,
    pub description: String,
    pub client_id: String,
    /// Supplied by the provisioning collaborator; `None` when provisioning
    /// failed upstream.
    pub voice_agent_id: Option<String>,
    /// Address of the original requester, notified about the outcome.
    pub notify_to: String,
}

/// Creates interview records and notifies the requester.
///
/// Record creation and notification are eventually consistent: a committed
/// interview is never rolled back because the notification failed.
pub struct InterviewCreator {
    db: Arc<dyn Database>,
    mailer: Arc<dyn EmailTransport>,
}

impl InterviewCreator {
    pub fn new(db: Arc<dyn Database>, mailer: Arc<dyn EmailTransport>) -> Self {
        Self { db, mailer }
    }

    /// Insert the interview and send a "created" notification; on insert
    /// failure send an "error" notification instead and propagate the
    /// failure.
    pub async fn create(
        &self,
        request: InterviewRequest,
    ) -> Result<Interview, PersistenceError> {
        let interview = Interview {
            id: Uuid::new_v4().to_string(),
            name: request.name.clone(),
            description: request.description.clone(),
            client_id: request.client_id.clone(),
            voice_agent_id: request.voice_agent_id.clone(),
            created_at: Utc::now(),
        };

        if interview.voice_agent_id.is_none() {
            warn!(
                interview = %interview.name,
                "Creating interview without voice agent"
            );
        }

        match self.db.insert_interview(&interview).await {
            Ok(()) => {
                info!(
                    interview_id = %interview.id,
                    client_id = %interview.client_id,
                    "Interview created"
                );
                self.notify_created(&request, &interview).await;
                Ok(interview)
            }
            Err(e) => {
                error!(error = %e, interview = %request.name, "Interview creation failed");
                self.notify_error(&request, &e).await;
                Err(e)
            }
        }
    }

    async fn notify_created(&self, request: &InterviewRequest, interview: &Interview) {
        let subject = format!("Entrevista creada: {}", interview.name);
        let agent_line = match &interview.voice_agent_id {
            Some(agent) => format!("Agente de voz: {agent}"),
            None => "Agente de voz: no disponible".to_string(),
        };
        let body = format!(
            "La búsqueda \"{}\" fue dada de alta correctamente.\n\n\
             ID de entrevista: {}\n{}\n\n\
             Para consultar el estado de las evaluaciones, respondé con el asunto:\n\
             Status-{}\n",
            interview.name, interview.id, agent_line, interview.id,
        );

        if let Err(e) = self.mailer.send(&request.notify_to, &subject, &body).await {
            warn!(
                error = %e,
                to = %request.notify_to,
                "Created-notification dispatch failed (interview is committed)"
            );
        }
    }

    async fn notify_error(&self, request: &InterviewRequest, cause: &PersistenceError) {
        let subject = format!("Error al crear la entrevista: {}", request.name);
        let body = format!(
            "No se pudo dar de alta la búsqueda \"{}\".\n\nMotivo: {}\n\n\
             Reenviá el mensaje original para reintentar.\n",
            request.name, cause,
        );

        if let Err(e) = self.mailer.send(&request.notify_to, &subject, &body).await {
            warn!(error = %e, to = %request.notify_to, "Error-notification dispatch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use crate::error::TransportError;
    use crate::store::LibSqlBackend;

    /// Mock transport that records every send.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailTransport for RecordingMailer {
        async fn send(
            &self,
            to: &str,
            subject: &str,
            body: &str,
        ) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::SendFailed {
                    name: "mock".into(),
                    reason: "down".into(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.into(), subject.into(), body.into()));
            Ok(())
        }
    }

    async fn setup() -> (Arc<LibSqlBackend>, Arc<RecordingMailer>, InterviewCreator) {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let mailer = Arc::new(RecordingMailer::default());
        let creator = InterviewCreator::new(
            Arc::clone(&db) as Arc<dyn Database>,
            Arc::clone(&mailer) as Arc<dyn EmailTransport>,
        );
        (db, mailer, creator)
    }

    fn request(client_id: &str) -> InterviewRequest {
        InterviewRequest {
            name: "Backend Python".into(),
            description: "Cliente: Acme - Responsable: Juan -".into(),
            client_id: client_id.into(),
            voice_agent_id: Some("agent-7".into()),
            notify_to: "juan@acme.com".into(),
        }
    }

    #[tokio::test]
    async fn create_persists_and_notifies() {
        let (db, mailer, creator) = setup().await;
        let client_id = db
            .resolve_or_insert_client("juan@acme.com", "Acme", None, None)
            .await
            .unwrap();

        let interview = creator.create(request(&client_id)).await.unwrap();

        let stored = db.get_interview(&interview.id).await.unwrap().unwrap();
        assert_eq!(stored.voice_agent_id.as_deref(), Some("agent-7"));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (to, subject, body) = &sent[0];
        assert_eq!(to, "juan@acme.com");
        assert!(subject.contains("Entrevista creada"));
        assert!(body.contains(&interview.id));
        assert!(body.contains("agent-7"));
    }

    #[tokio::test]
    async fn create_without_voice_agent_succeeds() {
        let (db, mailer, creator) = setup().await;
        let client_id = db
            .resolve_or_insert_client("juan@acme.com", "Acme", None, None)
            .await
            .unwrap();

        let mut req = request(&client_id);
        req.voice_agent_id = None;

        let interview = creator.create(req).await.unwrap();
        assert!(interview.voice_agent_id.is_none());

        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].2.contains("no disponible"));
    }

    #[tokio::test]
    async fn notification_failure_keeps_the_record() {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let client_id = db
            .resolve_or_insert_client("juan@acme.com", "Acme", None, None)
            .await
            .unwrap();

        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let creator = InterviewCreator::new(
            Arc::clone(&db) as Arc<dyn Database>,
            mailer as Arc<dyn EmailTransport>,
        );

        let interview = creator.create(request(&client_id)).await.unwrap();
        assert!(db.get_interview(&interview.id).await.unwrap().is_some());
    }
}
