use axum::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::EmailConfig;

/// A composed email ready for delivery.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub event: &'static str,
}

#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send(&self, msg: &EmailMessage) -> anyhow::Result<()>;
}

/// Delivers through two alternate third-party HTTP APIs: a primary endpoint
/// with an `api-key` header and a secondary one with bearer auth. An empty
/// URL disables that endpoint.
pub struct HttpEmailer {
    http: reqwest::Client,
    config: EmailConfig,
}

impl HttpEmailer {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn send_primary(&self, msg: &EmailMessage) -> anyhow::Result<()> {
        let body = json!({
            "sender": { "name": self.config.from_name, "email": self.config.from_address },
            "to": [{ "email": msg.to }],
            "subject": msg.subject,
            "htmlContent": msg.html,
        });
        let res = self
            .http
            .post(&self.config.primary_url)
            .header("api-key", &self.config.primary_api_key)
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("primary email endpoint returned {status}: {text}");
        }
        Ok(())
    }

    async fn send_fallback(&self, msg: &EmailMessage) -> anyhow::Result<()> {
        let body = json!({
            "from": format!("{} <{}>", self.config.from_name, self.config.from_address),
            "to": msg.to,
            "subject": msg.subject,
            "html": msg.html,
        });
        let res = self
            .http
            .post(&self.config.fallback_url)
            .bearer_auth(&self.config.fallback_api_key)
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("fallback email endpoint returned {status}: {text}");
        }
        Ok(())
    }
}

#[async_trait]
impl EmailClient for HttpEmailer {
    async fn send(&self, msg: &EmailMessage) -> anyhow::Result<()> {
        if !self.config.primary_url.is_empty() {
            match self.send_primary(msg).await {
                Ok(()) => {
                    debug!(to = %msg.to, event = msg.event, "email sent via primary endpoint");
                    return Ok(());
                }
                Err(e) => warn!(error = %e, to = %msg.to, "primary email endpoint failed"),
            }
        }
        if !self.config.fallback_url.is_empty() {
            match self.send_fallback(msg).await {
                Ok(()) => {
                    debug!(to = %msg.to, event = msg.event, "email sent via fallback endpoint");
                    return Ok(());
                }
                Err(e) => warn!(error = %e, to = %msg.to, "fallback email endpoint failed"),
            }
        }
        anyhow::bail!("no email endpoint accepted the message")
    }
}

/// Test double that accepts everything without any network traffic.
pub struct NoopEmailer;

#[async_trait]
impl EmailClient for NoopEmailer {
    async fn send(&self, _msg: &EmailMessage) -> anyhow::Result<()> {
        Ok(())
    }
}
