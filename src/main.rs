use std::sync::Arc;

use anyhow::Context;

use hire_assist::channels::{
    EmailTransport, HttpMailSource, HttpVoiceProvisioner, MessageSource, SmtpMailer,
    VoiceAgentProvisioner, spawn_intake_poller,
};
use hire_assist::config::{AppConfig, MailApiConfig, SmtpConfig, VoiceAgentConfig};
use hire_assist::intake::IntakeProcessor;
use hire_assist::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AppConfig::from_env();

    // Initialize tracing; optional daily-rolling file output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _log_guard = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "hire-assist.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
            None
        }
    };

    eprintln!("📋 hire-assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path);
    eprintln!("   Poll interval: {}s", config.poll_interval_secs);

    // ── Database ─────────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(db_path)
            .await
            .with_context(|| format!("opening database at {}", config.db_path))?,
    );

    // ── Collaborators ────────────────────────────────────────────────
    let Some(smtp_config) = SmtpConfig::from_env() else {
        eprintln!("Error: SMTP_HOST not set — outbound email is required");
        eprintln!("  export SMTP_HOST=smtp.example.com");
        std::process::exit(1);
    };
    eprintln!("   SMTP: {}:{}", smtp_config.host, smtp_config.port);
    let mailer: Arc<dyn EmailTransport> = Arc::new(SmtpMailer::new(smtp_config));

    let voice: Option<Arc<dyn VoiceAgentProvisioner>> = match VoiceAgentConfig::from_env() {
        Some(voice_config) => {
            eprintln!("   Voice agents: {}", voice_config.base_url);
            Some(Arc::new(HttpVoiceProvisioner::new(voice_config)))
        }
        None => {
            eprintln!("   Voice agents: disabled");
            None
        }
    };

    let Some(mail_config) = MailApiConfig::from_env() else {
        eprintln!("Error: MAIL_API_URL not set — no inbound message source");
        eprintln!("  export MAIL_API_URL=https://mail.example.com/api");
        std::process::exit(1);
    };
    eprintln!("   Mail API: {} (mailbox: {})\n", mail_config.base_url, mail_config.mailbox);
    let source: Arc<dyn MessageSource> = Arc::new(HttpMailSource::new(mail_config));

    // ── Intake loop ──────────────────────────────────────────────────
    let processor = Arc::new(IntakeProcessor::new(
        db,
        mailer,
        voice,
        config.dedup_capacity,
    ));

    let (poller, shutdown) = spawn_intake_poller(
        source,
        processor,
        std::time::Duration::from_secs(config.poll_interval_secs),
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    shutdown.store(true, std::sync::atomic::Ordering::Relaxed);
    poller.abort();

    Ok(())
}
