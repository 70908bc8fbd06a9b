//! # juris-mail
//!
//! Outbound email for the notification jobs.
//!
//! | Provider | Transport |
//! |----------|-----------|
//! | `resend` | Resend HTTP API (default) |
//! | `smtp`   | lettre async SMTP |
//! | `outbox` | logs and keeps messages in memory |

pub mod dispatcher;
pub mod outbox;
pub mod resend;
pub mod smtp;

use std::sync::Arc;

use juris_core::{EmailProvider, MailConfig, MailProviderKind};

pub use dispatcher::Dispatcher;
pub use outbox::OutboxProvider;
pub use resend::ResendProvider;
pub use smtp::SmtpProvider;

/// Build the provider selected in config.
pub fn build_provider(config: &MailConfig) -> Arc<dyn EmailProvider> {
    match config.provider {
        MailProviderKind::Resend => Arc::new(ResendProvider::new(config)),
        MailProviderKind::Smtp => Arc::new(SmtpProvider::new(config)),
        MailProviderKind::Outbox => Arc::new(OutboxProvider::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_follows_config() {
        let mut config = MailConfig::default();
        assert_eq!(build_provider(&config).name(), "resend");
        config.provider = MailProviderKind::Smtp;
        assert_eq!(build_provider(&config).name(), "smtp");
        config.provider = MailProviderKind::Outbox;
        assert_eq!(build_provider(&config).name(), "outbox");
    }
}
