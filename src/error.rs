//! Error types for hire-assist.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Store-level errors. Surfaced as-is — no retry happens inside this crate.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors from the evaluation pipelines (normalize/persist and status
/// aggregation).
///
/// `NotFound` is a data-integrity failure — a referenced interview, client,
/// or candidate row is absent. It is always fatal to the operation at hand,
/// never papered over with defaults.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Malformed evaluation payload: {0}")]
    InvalidShape(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Collaborator transport errors (mail API, SMTP, voice-agent service).
///
/// These never roll back already-committed persistence — callers log and
/// move on.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{name} send failed: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("{name} authentication failed: {reason}")]
    AuthFailed { name: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid response from {name}: {reason}")]
    InvalidResponse { name: String, reason: String },
}

/// Errors from the intake processor.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
