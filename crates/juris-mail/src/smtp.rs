//! SMTP provider over async lettre.

use async_trait::async_trait;
use juris_core::{ConfigError, DispatchError, EmailProvider, MailConfig, OutgoingEmail, SmtpConfig, SmtpTls};
use lettre::message::{Mailbox, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::OnceCell;

/// Sends through one pooled transport, built on the first send. A missing
/// host is reported on every send until it is configured.
pub struct SmtpProvider {
    config: SmtpConfig,
    timeout: std::time::Duration,
    transport: OnceCell<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpProvider {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            config: config.smtp.clone(),
            timeout: config.timeout(),
            transport: OnceCell::new(),
        }
    }

    async fn transport(&self) -> Result<&AsyncSmtpTransport<Tokio1Executor>, DispatchError> {
        self.transport
            .get_or_try_init(|| async { self.build_transport() })
            .await
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DispatchError> {
        let host = self.config.host.trim();
        if host.is_empty() {
            return Err(ConfigError::Missing("SMTP_HOST").into());
        }

        let builder = match self.config.tls {
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| DispatchError::Transport(format!("SMTP relay: {e}")))?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| DispatchError::Transport(format!("SMTP relay: {e}")))?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };

        let mut builder = builder.port(self.config.port).timeout(Some(self.timeout));
        if let Some(user) = self.config.username.as_deref().filter(|u| !u.is_empty()) {
            let password = self.config.password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(user.to_string(), password));
        }
        tracing::debug!("🔌 SMTP transport ready for {host}:{}", self.config.port);
        Ok(builder.build())
    }
}

/// Build the MIME message for one outgoing email.
pub fn build_message(email: &OutgoingEmail) -> Result<Message, DispatchError> {
    let from: Mailbox = email
        .from
        .parse()
        .map_err(|e| DispatchError::InvalidAddress(format!("{}: {e}", email.from)))?;
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| DispatchError::InvalidAddress(format!("{}: {e}", email.to)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.as_str())
        .singlepart(SinglePart::html(email.html.clone()))
        .map_err(|e| DispatchError::Build(e.to_string()))
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, DispatchError> {
        let message = build_message(email)?;
        let mailer = self.transport().await?;
        let response = mailer.send(message).await.map_err(|e| {
            if e.is_permanent() {
                DispatchError::Provider {
                    status: 550,
                    message: e.to_string(),
                }
            } else {
                DispatchError::Transport(e.to_string())
            }
        })?;
        tracing::debug!("📤 SMTP accepted message for {}", email.to);
        Ok(response.message().next().map(str::to_string))
    }
}
