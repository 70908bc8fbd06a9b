//! Email dispatcher: the per-recipient failure boundary.
//! Every call yields a `DispatchOutcome`; provider errors never escape.

use std::sync::Arc;

use juris_core::{DispatchOutcome, EmailProvider, OutgoingEmail};

/// Wraps exactly one provider call per `send`.
#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn EmailProvider>,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn EmailProvider>) -> Self {
        Self { provider }
    }

    /// Send one HTML email. A blank recipient is skipped without calling the
    /// provider.
    pub async fn send(&self, from: &str, to: &str, subject: &str, html: &str) -> DispatchOutcome {
        let to = to.trim();
        if to.is_empty() {
            return DispatchOutcome::Skipped {
                reason: "no recipient address".into(),
            };
        }

        let email = OutgoingEmail {
            from: from.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        };

        match self.provider.send(&email).await {
            Ok(message_id) => DispatchOutcome::Sent { message_id },
            Err(e) => DispatchOutcome::Failed {
                reason: format!("{} provider: {e}", self.provider.name()),
            },
        }
    }
}
