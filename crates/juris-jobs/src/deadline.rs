//! Deadline reminder job: one email per client whose case is due soon.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use juris_core::{CaseDeadlineRecord, Job, JobError, NotificationKind, RunSummary};
use juris_mail::Dispatcher;
use juris_store::{RecipientBatch, RecipientQuery};

use crate::formatter::{FormatOptions, NotificationInput, render};
use crate::log_outcome;

pub struct DeadlineJob {
    query: RecipientQuery,
    dispatcher: Dispatcher,
    from: String,
    horizon_days: u32,
    options: FormatOptions,
}

impl DeadlineJob {
    /// `horizon_days` bounds who is reminded, independently of the window
    /// the query reads.
    pub fn new(
        query: RecipientQuery,
        dispatcher: Dispatcher,
        from: impl Into<String>,
        horizon_days: u32,
        options: FormatOptions,
    ) -> Self {
        Self {
            query,
            dispatcher,
            from: from.into(),
            horizon_days,
            options,
        }
    }

    /// The address to remind, or why `record` gets no email today. The day
    /// count is re-derived here whatever window the store applied.
    fn recipient<'r>(&self, record: &'r CaseDeadlineRecord, days: i64) -> Result<&'r str, &'static str> {
        if days < 0 || days > i64::from(self.horizon_days) {
            return Err("deadline outside reminder horizon");
        }
        if record.client.is_none() {
            return Err("no linked client");
        }
        record.client_email().ok_or("client has no email")
    }
}

#[async_trait]
impl Job for DeadlineJob {
    fn name(&self) -> &str {
        "deadline-check"
    }

    fn kind(&self) -> NotificationKind {
        NotificationKind::DeadlineReminder
    }

    async fn run(&self, now: NaiveDateTime) -> Result<RunSummary, JobError> {
        let today = now.date();
        let records = match self.query.fetch(self.kind(), today).await? {
            RecipientBatch::Deadlines(records) => records,
            RecipientBatch::Weekly(_) => Vec::new(),
        };
        let mut summary = RunSummary::new(self.kind());

        for record in &records {
            let days = record.days_remaining(today);
            let to = match self.recipient(record, days) {
                Ok(to) => to,
                Err(reason) => {
                    tracing::debug!("⏭️ case {} skipped: {reason}", record.id);
                    summary.record_skip();
                    continue;
                }
            };

            let email = render(NotificationInput::Deadline(record), today, &self.options);
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
