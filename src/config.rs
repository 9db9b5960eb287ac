//! Configuration types — built from environment variables.
//!
//! Every collaborator section is optional: when its key variable is absent
//! the collaborator is disabled and `from_env()` returns `None`. Secrets are
//! held in `secrecy::SecretString` so they never end up in debug output.

use std::time::Duration;

use secrecy::SecretString;

/// Timeout for acquiring a bearer token from the mail API.
pub const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a single unread-message fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for one outbound email dispatch.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Service-wide settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the local libsql database file.
    pub db_path: String,
    /// Seconds between mailbox poll cycles.
    pub poll_interval_secs: u64,
    /// Capacity of the in-process message dedup cache.
    pub dedup_capacity: usize,
    /// Optional directory for daily-rolling log files.
    pub log_dir: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let db_path = std::env::var("HIRE_ASSIST_DB_PATH")
            .unwrap_or_else(|_| "./data/hire-assist.db".to_string());

        let poll_interval_secs: u64 = std::env::var("HIRE_ASSIST_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let dedup_capacity: usize = std::env::var("HIRE_ASSIST_DEDUP_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1000);

        let log_dir = std::env::var("HIRE_ASSIST_LOG_DIR").ok();

        Self {
            db_path,
            poll_interval_secs,
            dedup_capacity,
            log_dir,
        }
    }
}

/// Mail API configuration (inbound message source).
///
/// Returns `None` if `MAIL_API_URL` is not set (source disabled).
#[derive(Debug, Clone)]
pub struct MailApiConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub mailbox: String,
}

impl MailApiConfig {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("MAIL_API_URL").ok()?;

        let client_id = std::env::var("MAIL_API_CLIENT_ID").unwrap_or_default();
        let client_secret =
            SecretString::from(std::env::var("MAIL_API_CLIENT_SECRET").unwrap_or_default());
        let mailbox =
            std::env::var("MAIL_API_MAILBOX").unwrap_or_else(|_| "inbox".to_string());

        Some(Self {
            base_url,
            client_id,
            client_secret,
            mailbox,
        })
    }
}

/// SMTP configuration (outbound notifications and reports).
///
/// Returns `None` if `SMTP_HOST` is not set (transport disabled).
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl SmtpConfig {
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;

        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = SecretString::from(std::env::var("SMTP_PASSWORD").unwrap_or_default());
        let from_address =
            std::env::var("SMTP_FROM_ADDRESS").unwrap_or_else(|_| username.clone());

        Some(Self {
            host,
            port,
            username,
            password,
            from_address,
        })
    }
}

/// Voice-agent provisioning service configuration.
///
/// Returns `None` if `VOICE_AGENT_URL` is not set (interviews are then
/// created without a voice agent).
#[derive(Debug, Clone)]
pub struct VoiceAgentConfig {
    pub base_url: String,
    pub api_key: SecretString,
}

impl VoiceAgentConfig {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("VOICE_AGENT_URL").ok()?;
        let api_key = SecretString::from(std::env::var("VOICE_AGENT_API_KEY").unwrap_or_default());

        Some(Self { base_url, api_key })
    }
}
