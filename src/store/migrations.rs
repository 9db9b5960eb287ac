//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.

use libsql::Connection;

use crate::error::PersistenceError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: r#"
        CREATE TABLE IF NOT EXISTS clients (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            responsible TEXT,
            phone TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_clients_email ON clients(email);

        CREATE TABLE IF NOT EXISTS interviews (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            client_id TEXT NOT NULL REFERENCES clients(id),
            voice_agent_id TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_interviews_client ON interviews(client_id);

        CREATE TABLE IF NOT EXISTS candidates (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            tech_stack TEXT NOT NULL DEFAULT '[]',
            cv_url TEXT
        );

        CREATE TABLE IF NOT EXISTS evaluation_records (
            id TEXT PRIMARY KEY,
            meet_id TEXT NOT NULL,
            candidate_id TEXT NOT NULL,
            conversation_analysis TEXT NOT NULL DEFAULT '',
            technical_assessment TEXT NOT NULL DEFAULT '{}',
            completeness_summary TEXT NOT NULL DEFAULT '{}',
            alerts TEXT NOT NULL DEFAULT '[]',
            match_evaluation TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_evaluation_records_meet
            ON evaluation_records(meet_id);

        CREATE TABLE IF NOT EXISTS evaluations (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL,
            interview_id TEXT NOT NULL UNIQUE,
            summary TEXT NOT NULL DEFAULT '{}',
            candidates TEXT NOT NULL DEFAULT '{}',
            ranking TEXT NOT NULL DEFAULT '[]',
            candidates_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_evaluations_interview
            ON evaluations(interview_id);
    "#,
}];

/// Run all pending migrations against the given connection.
pub async fn run_migrations(conn: &Connection) -> Result<(), PersistenceError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| PersistenceError::Migration(format!("creating _migrations table: {e}")))?;

    let current = current_version(conn).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        conn.execute_batch(migration.sql)
            .await
            .map_err(|e| {
                PersistenceError::Migration(format!(
                    "migration {} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;

        conn.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            libsql::params![migration.version, migration.name],
        )
        .await
        .map_err(|e| {
            PersistenceError::Migration(format!(
                "recording migration {}: {e}",
                migration.version
            ))
        })?;

        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applied migration"
        );
    }

    Ok(())
}

/// Highest applied migration version, or 0 for a fresh database.
async fn current_version(conn: &Connection) -> Result<i64, PersistenceError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| PersistenceError::Migration(format!("reading migration version: {e}")))?;

    match rows
        .next()
        .await
        .map_err(|e| PersistenceError::Migration(e.to_string()))?
    {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| PersistenceError::Migration(e.to_string())),
        None => Ok(0),
    }
}
