//! SMTP delivery for workflow notifications.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::info;

use jobdesk_core::Config;

/// Outbound email seam. Workflows depend on this trait so notification
/// dispatch can be observed in tests without a live SMTP relay.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send one HTML message to a single recipient.
    async fn send(&self, to: &str, subject: &str, body_html: &str) -> Result<(), String>;
}

/// Email sender backed by lettre's async SMTP transport.
#[derive(Clone)]
pub struct SmtpEmailSender {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl SmtpEmailSender {
    /// Build a transport from config. Returns `None` when SMTP is not
    /// configured, in which case the caller should fall back to a no-op
    /// sender rather than fail startup.
    pub fn from_config(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.as_deref()?.to_string();
        let port = config.smtp_port;

        let mailer = if config.smtp_tls {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?;
            let b = b.port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(
                host = %host,
                port = port,
                "Email sender initialized (SMTP with STARTTLS)"
            );
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Email sender initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, subject: &str, body_html: &str) -> Result<(), String> {
        let to_addr: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient address '{}': {}", to, e))?;
        let from_addr: Mailbox = self
            .from
            .parse()
            .map_err(|e| format!("Invalid SMTP_FROM: {}", e))?;

        let email = Message::builder()
            .from(from_addr)
            .to(to_addr)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body_html.to_string())
            .map_err(|e| e.to_string())?;

        self.mailer.send(email).await.map_err(|e| e.to_string())?;
        info!(to = %to, "Notification email sent");
        Ok(())
    }
}

/// Sender used when SMTP is not configured. Logs and drops every message
/// so workflows still complete in environments without a relay.
pub struct NoopEmailSender;

#[async_trait]
impl EmailSender for NoopEmailSender {
    async fn send(&self, to: &str, subject: &str, _body_html: &str) -> Result<(), String> {
        tracing::warn!(to = %to, subject = %subject, "SMTP not configured, dropping notification");
        Ok(())
    }
}
