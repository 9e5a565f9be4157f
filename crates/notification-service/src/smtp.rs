use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::templates::EmailTemplate;
use crate::{HeadlineAlert, NotificationChannel, NotificationConfig, NotificationError, SmtpTls};

/// Sends each alert from the configured account to the alert's own address.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let sender = config
            .sender
            .as_deref()
            .ok_or_else(|| NotificationError::Config("ALERT_EMAIL not set".into()))?;
        let password = config
            .password
            .as_deref()
            .ok_or_else(|| NotificationError::Config("ALERT_PASSWORD not set".into()))?;

        let from: Mailbox = sender
            .parse()
            .map_err(|e| NotificationError::Config(format!("Invalid sender address: {}", e)))?;

        let host = config.smtp_host.as_str();
        let builder = match config.smtp_tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
            SmtpTls::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
        }
        .map_err(|e| NotificationError::Smtp(format!("SMTP transport error: {}", e)))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl NotificationChannel for SmtpNotifier {
    async fn send(&self, alert: &HeadlineAlert) -> Result<(), NotificationError> {
        let to: Mailbox = alert
            .email
            .trim()
            .parse()
            .map_err(|e| NotificationError::InvalidRecipient(format!("{}: {}", alert.email, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(EmailTemplate::subject(alert))
            .header(ContentType::TEXT_HTML)
            .body(EmailTemplate::render(alert, chrono::Utc::now()))
            .map_err(|e| NotificationError::Smtp(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotificationError::Smtp(format!("Failed to send email: {}", e)))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
