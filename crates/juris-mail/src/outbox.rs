//! Outbox provider: logs each message and keeps it in memory instead of
//! sending it. Used for dry runs and as the test double.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use juris_core::{DispatchError, EmailProvider, OutgoingEmail};

#[derive(Default)]
struct Inner {
    sent: Vec<OutgoingEmail>,
    failing: HashSet<String>,
    attempts: u32,
}

#[derive(Default)]
pub struct OutboxProvider {
    inner: Mutex<Inner>,
}

impl OutboxProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reject every later message addressed to `address`.
    pub fn fail_for(&self, address: &str) {
        self.lock().failing.insert(address.to_ascii_lowercase());
    }

    /// Messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.lock().sent.clone()
    }

    /// Provider calls so far, accepted or not.
    pub fn attempts(&self) -> u32 {
        self.lock().attempts
    }
}

#[async_trait]
impl EmailProvider for OutboxProvider {
    fn name(&self) -> &str {
        "outbox"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, DispatchError> {
        let mut inner = self.lock();
        inner.attempts += 1;
        if inner.failing.contains(&email.to.to_ascii_lowercase()) {
            return Err(DispatchError::Provider {
                status: 550,
                message: format!("mailbox unavailable: {}", email.to),
            });
        }
        tracing::info!(
            "📭 [outbox] {} → {}: {} ({} bytes)",
            email.from,
            email.to,
            email.subject,
            email.html.len()
        );
        inner.sent.push(email.clone());
        Ok(Some(format!("outbox-{}", inner.sent.len())))
    }
}
