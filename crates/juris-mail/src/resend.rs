//! Resend HTTP provider: `POST {api_base}/emails` with a bearer key.

use async_trait::async_trait;
use juris_core::{ConfigError, DispatchError, EmailProvider, MailConfig, OutgoingEmail};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

pub struct ResendProvider {
    api_key: String,
    api_base: String,
    timeout: std::time::Duration,
    client: reqwest::Client,
}

impl ResendProvider {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            api_key: config.api_key.trim().to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.api_base)
    }
}

#[async_trait]
impl EmailProvider for ResendProvider {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, DispatchError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::Missing("RESEND_API_KEY").into());
        }

        let body = SendRequest {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        };

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DispatchError::Unauthorized(text));
        }
        if !status.is_success() {
            return Err(DispatchError::Provider {
                status: status.as_u16(),
                message: provider_message(&text),
            });
        }

        let id = serde_json::from_str::<SendResponse>(&text)
            .ok()
            .and_then(|r| r.id);
        tracing::debug!("📤 resend accepted message for {} (id {:?})", email.to, id);
        Ok(id)
    }
}

/// Resend error bodies look like `{"name": "...", "message": "..."}`.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
