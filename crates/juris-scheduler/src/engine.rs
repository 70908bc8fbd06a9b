//! Scheduler engine: the polling loop that checks and fires tasks.
//! Single-threaded: due tasks run one at a time, in registration order, and
//! the loop sleeps a fixed poll interval between checks.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use futures::FutureExt;
use juris_core::{ConfigError, ScheduleConfig};
use tracing::Instrument;

use crate::clock::{Clock, SystemClock};
use crate::tasks::{ScheduledTask, TaskEntry, TaskOutcome, TaskRun, TaskSnapshot, TaskState};
use crate::trigger::Trigger;

/// Tick granularity and catch-up policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePolicy {
    /// Sleep between two checks.
    pub poll_interval: Duration,
    /// How late a weekly slot may still fire. Must cover at least one poll.
    pub firing_window: Duration,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            firing_window: Duration::from_secs(300),
        }
    }
}

impl SchedulePolicy {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            firing_window: config.firing_window(),
        }
    }
}

/// Owns the task registry and its bookkeeping.
pub struct SchedulerEngine {
    entries: Vec<TaskEntry>,
    clock: Arc<dyn Clock>,
    policy: SchedulePolicy,
}

impl SchedulerEngine {
    pub fn new(clock: Arc<dyn Clock>, policy: SchedulePolicy) -> Self {
        Self {
            entries: Vec::new(),
            clock,
            policy,
        }
    }

    /// Engine on the host's local clock.
    pub fn with_system_clock(policy: SchedulePolicy) -> Self {
        Self::new(Arc::new(SystemClock), policy)
    }

    /// Register a task. Its first due time is computed from the current clock.
    pub fn register(&mut self, task: ScheduledTask) -> Result<(), ConfigError> {
        if matches!(task.trigger(), Trigger::Every(interval) if *interval <= TimeDelta::zero()) {
            return Err(ConfigError::Invalid(format!(
                "task '{}' needs a positive interval",
                task.name()
            )));
        }
        let entry = TaskEntry::new(task, self.clock.now());
        tracing::info!(
            "📅 Task registered: '{}' ({}), first run at {}",
            entry.task.name(),
            entry.task.trigger(),
            entry.next_run
        );
        self.entries.push(entry);
        Ok(())
    }

    pub fn task_count(&self) -> usize {
        self.entries.len()
    }

    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.entries.iter().map(TaskEntry::snapshot).collect()
    }

    /// Check every task once and run the due ones.
    ///
    /// Job errors and panics are caught here and logged; the task goes back
    /// to `Idle` and will fire again on its next occurrence.
    pub async fn run_pending(&mut self) -> Vec<TaskRun> {
        let now = self.clock.now();
        let window = TimeDelta::from_std(self.policy.firing_window).unwrap_or(TimeDelta::MAX);

        let mut due = Vec::new();
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if entry.check(now, window) {
                entry.state = TaskState::Due;
                due.push(idx);
            }
        }

        let mut runs = Vec::with_capacity(due.len());
        for idx in due {
            let entry = &mut self.entries[idx];
            let scheduled_for = entry.next_run;
            let started_at = self.clock.now();
            let name = entry.task.name().to_string();
            let job = Arc::clone(entry.task.job());
            entry.state = TaskState::Running;

            tracing::info!("🔔 Task triggered: '{}' (due {})", name, scheduled_for);
            let span = tracing::info_span!("task", task = %name, run_id = %uuid::Uuid::new_v4());
            let result = AssertUnwindSafe(job.run(started_at))
                .catch_unwind()
                .instrument(span)
                .await;

            let outcome = match result {
                Ok(Ok(summary)) => {
                    tracing::info!("✅ Task '{}' finished: {}", name, summary);
                    TaskOutcome::Completed(summary)
                }
                Ok(Err(e)) => {
                    entry.failure_count += 1;
                    tracing::error!("❌ Task '{}' failed: {}", name, e);
                    TaskOutcome::Failed(e.to_string())
                }
                Err(panic) => {
                    entry.failure_count += 1;
                    let reason = panic_message(panic.as_ref());
                    tracing::error!("💥 Task '{}' panicked: {}", name, reason);
                    TaskOutcome::Panicked(reason)
                }
            };

            entry.complete(started_at);
            runs.push(TaskRun {
                task: name,
                scheduled_for,
                started_at,
                outcome,
            });
        }
        runs
    }

    /// Poll forever: check, run due tasks, sleep.
    pub async fn run_forever(&mut self) {
        tracing::info!(
            "⏰ Scheduler started (check every {}s, {} task(s))",
            self.policy.poll_interval.as_secs(),
            self.entries.len()
        );
        loop {
            self.run_pending().await;
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
