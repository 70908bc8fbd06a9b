//! Weekly summary job: new-case statistics mailed to every privileged manager.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use juris_core::{Job, JobError, NotificationKind, RunSummary};
use juris_mail::Dispatcher;
use juris_store::{RecipientBatch, RecipientQuery};

use crate::formatter::{FormatOptions, NotificationInput, render};
use crate::log_outcome;

pub struct WeeklySummaryJob {
    query: RecipientQuery,
    dispatcher: Dispatcher,
    from: String,
    options: FormatOptions,
}

impl WeeklySummaryJob {
    pub fn new(query: RecipientQuery, dispatcher: Dispatcher, from: impl Into<String>, options: FormatOptions) -> Self {
        Self {
            query,
            dispatcher,
            from: from.into(),
            options,
        }
    }
}

#[async_trait]
impl Job for WeeklySummaryJob {
    fn name(&self) -> &str {
        "weekly-summary"
    }

    fn kind(&self) -> NotificationKind {
        NotificationKind::WeeklySummary
    }

    async fn run(&self, now: NaiveDateTime) -> Result<RunSummary, JobError> {
        let today = now.date();
        let mut summary = RunSummary::new(self.kind());
        let batch = match self.query.fetch(self.kind(), today).await? {
            RecipientBatch::Weekly(batch) => batch,
            RecipientBatch::Deadlines(_) => return Ok(summary),
        };

        // Same body for every manager.
        let email = render(NotificationInput::Weekly(&batch.stats), today, &self.options);

        for manager in &batch.managers {
            if !manager.is_notifiable(self.query.privileged_roles()) {
                tracing::debug!("⏭️ profile with role '{}' skipped: not notifiable", manager.role);
                summary.record_skip();
                continue;
            }
            let Some(to) = manager.email() else {
                tracing::debug!("⏭️ profile with role '{}' skipped: no email", manager.role);
                summary.record_skip();
                continue;
            };

            let outcome = self
                .dispatcher
                .send(&self.from, to, &email.subject, &email.html)
                .await;
            log_outcome(self.kind(), to, &outcome);
            summary.record(&outcome);
        }

        Ok(summary)
    }
}
