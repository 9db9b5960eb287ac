//! Client resolution — idempotent lookup-or-create keyed by email.

use std::sync::Arc;

use tracing::debug;

use crate::error::PersistenceError;
use crate::store::Database;

/// Resolves a client record for an email address, creating one on first
/// sighting. First write wins: an existing row is returned untouched, the
/// request's name/responsible/phone are not applied to it.
pub struct ClientResolver {
    db: Arc<dyn Database>,
}

impl ClientResolver {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Resolve or create the client for `email` and return its id.
    ///
    /// When no display name is supplied, the email local-part stands in.
    /// Exactly one insert happens on a miss, zero writes on a hit; the
    /// store's unique-email upsert keeps concurrent first sightings from
    /// producing duplicate rows.
    pub async fn resolve_or_create(
        &self,
        email: &str,
        name: Option<&str>,
        responsible: Option<&str>,
        phone: Option<&str>,
    ) -> Result<String, PersistenceError> {
        let display_name = match name {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => local_part(email).to_string(),
        };

        let client_id = self
            .db
            .resolve_or_insert_client(email, &display_name, responsible, phone)
            .await?;

        debug!(client_id = %client_id, email = email, "Client resolved");
        Ok(client_id)
    }
}

/// Local part of an email address, used as a fallback display name.
fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;

    async fn resolver() -> ClientResolver {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        ClientResolver::new(db)
    }

    #[tokio::test]
    async fn repeated_resolution_returns_same_id() {
        let resolver = resolver().await;

        let first = resolver
            .resolve_or_create("a@b.com", Some("Acme"), None, None)
            .await
            .unwrap();
        let second = resolver
            .resolve_or_create("a@b.com", Some("Acme"), None, None)
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_name_falls_back_to_local_part() {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let resolver = ClientResolver::new(Arc::clone(&db) as Arc<dyn Database>);

        let id = resolver
            .resolve_or_create("contacto@acme.com", None, None, None)
            .await
            .unwrap();

        let client = db.get_client(&id).await.unwrap().unwrap();
        assert_eq!(client.name, "contacto");
    }

    #[tokio::test]
    async fn blank_name_falls_back_to_local_part() {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let resolver = ClientResolver::new(Arc::clone(&db) as Arc<dyn Database>);

        let id = resolver
            .resolve_or_create("rrhh@corp.com", Some("  "), None, None)
            .await
            .unwrap();

        let client = db.get_client(&id).await.unwrap().unwrap();
        assert_eq!(client.name, "rrhh");
    }

    #[tokio::test]
    async fn existing_client_is_not_updated() {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let resolver = ClientResolver::new(Arc::clone(&db) as Arc<dyn Database>);

        let id = resolver
            .resolve_or_create("a@b.com", Some("Acme"), Some("Juan"), None)
            .await
            .unwrap();
        resolver
            .resolve_or_create("a@b.com", Some("Renamed"), Some("Pedro"), Some("555"))
            .await
            .unwrap();

        let client = db.get_client(&id).await.unwrap().unwrap();
        assert_eq!(client.name, "Acme");
        assert_eq!(client.responsible.as_deref(), Some("Juan"));
        assert!(client.phone.is_none());
    }
}
