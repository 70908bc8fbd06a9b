//! # juris-jobs
//!
//! The two notification jobs and their wiring into the scheduler.
//!
//! ```text
//! SchedulerEngine ──► DeadlineJob ───────┐
//!                 └─► WeeklySummaryJob ──┤
//!                                        ├─► RecipientQuery (juris-store)
//!                                        ├─► formatter::render
//!                                        └─► Dispatcher (juris-mail)
//! ```

pub mod deadline;
pub mod formatter;
pub mod weekly;

use std::sync::Arc;

use juris_core::{CaseStore, ConfigError, DispatchOutcome, EmailProvider, NotificationKind, NotifierConfig};
use juris_mail::Dispatcher;
use juris_scheduler::{ScheduledTask, SchedulerEngine, Trigger};
use juris_store::RecipientQuery;

pub use deadline::DeadlineJob;
pub use formatter::{FormatOptions, NotificationInput, RenderedEmail, render};
pub use weekly::WeeklySummaryJob;

/// Build both jobs from config and register them: deadline check first,
/// weekly summary second.
pub fn schedule_notifications(
    engine: &mut SchedulerEngine,
    config: &NotifierConfig,
    store: Arc<dyn CaseStore>,
    provider: Arc<dyn EmailProvider>,
) -> Result<(), ConfigError> {
    let query = RecipientQuery::new(store, &config.notify);
    let dispatcher = Dispatcher::new(provider);
    let options = FormatOptions {
        app_url: config.notify.app_url.clone(),
    };

    let deadline = DeadlineJob::new(
        query.clone(),
        dispatcher.clone(),
        config.mail.deadline_from.clone(),
        config.notify.horizon_days,
        options.clone(),
    );
    engine.register(ScheduledTask::new(
        "deadline-check",
        Trigger::every(config.schedule.deadline_interval()),
        Arc::new(deadline),
    ))?;

    let weekly = WeeklySummaryJob::new(query, dispatcher, config.mail.summary_from.clone(), options);
    engine.register(ScheduledTask::new(
        "weekly-summary",
        Trigger::weekly(config.schedule.weekday()?, config.schedule.time()?),
        Arc::new(weekly),
    ))?;

    Ok(())
}

/// One log line per recipient outcome.
pub(crate) fn log_outcome(kind: NotificationKind, to: &str, outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Sent { message_id } => {
            tracing::info!("📧 {kind} sent to {to} (id {})", message_id.as_deref().unwrap_or("-"));
        }
        DispatchOutcome::Skipped { reason } => {
            tracing::debug!("⏭️ {kind} for {to} skipped: {reason}");
        }
        DispatchOutcome::Failed { reason } => {
            tracing::warn!("⚠️ {kind} to {to} failed: {reason}");
        }
    }
}
