mod smtp;
mod templates;

pub use smtp::SmtpNotifier;
pub use templates::EmailTemplate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A headline the user flagged, to be mailed to `email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineAlert {
    pub email: String,
    pub headline: String,
    pub sentiment: String,
}

impl HeadlineAlert {
    pub fn new(email: impl Into<String>, headline: impl Into<String>, sentiment: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            headline: headline.into(),
            sentiment: sentiment.into(),
        }
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &HeadlineAlert) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No notification channel configured (set ALERT_EMAIL and ALERT_PASSWORD)")]
    NotConfigured,
}

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender address, also the SMTP login
    pub sender: Option<String>,
    pub password: Option<String>,
    pub smtp_tls: SmtpTls,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            sender: None,
            password: None,
            smtp_tls: SmtpTls::StartTls,
        }
    }
}

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let smtp_tls = match std::env::var("SMTP_TLS").unwrap_or_default().as_str() {
            "tls" => SmtpTls::Tls,
            "none" => SmtpTls::None,
            _ => SmtpTls::StartTls,
        };

        Self {
            smtp_host: std::env::var("SMTP_HOST")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.smtp_host),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.smtp_port),
            sender: std::env::var("ALERT_EMAIL").ok().filter(|s| !s.is_empty()),
            password: std::env::var("ALERT_PASSWORD").ok().filter(|s| !s.is_empty()),
            smtp_tls,
        }
    }

    pub fn smtp_enabled(&self) -> bool {
        self.sender.is_some() && self.password.is_some()
    }
}

/// Dispatches alerts to every configured channel.
pub struct NotificationService {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.smtp_enabled() {
            match SmtpNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!("Email alerts enabled via {}:{}", config.smtp_host, config.smtp_port);
                    channels.push(Box::new(notifier));
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP notifier: {}", e);
                }
            }
        } else {
            tracing::info!("No notification channels configured (set ALERT_EMAIL and ALERT_PASSWORD)");
        }

        Self { channels }
    }

    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn is_configured(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Send through every channel, awaiting completion.
    ///
    /// All channels are attempted; the first failure is returned.
    pub async fn deliver(&self, alert: &HeadlineAlert) -> Result<(), NotificationError> {
        if self.channels.is_empty() {
            return Err(NotificationError::NotConfigured);
        }

        let mut first_error = None;
        for channel in &self.channels {
            match channel.send(alert).await {
                Ok(()) => tracing::info!("Sent {} alert via {}", alert.sentiment, channel.name()),
                Err(e) => {
                    tracing::warn!("Failed to send notification via {}: {}", channel.name(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
