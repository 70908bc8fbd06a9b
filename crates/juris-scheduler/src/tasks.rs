//! Task definitions: the registered work and its runtime bookkeeping.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use juris_core::{Job, RunSummary};

use crate::trigger::{self, Trigger};

/// A registered (trigger, job) pair. Never mutated after registration.
#[derive(Clone)]
pub struct ScheduledTask {
    name: String,
    trigger: Trigger,
    job: Arc<dyn Job>,
}

impl ScheduledTask {
    pub fn new(name: impl Into<String>, trigger: Trigger, job: Arc<dyn Job>) -> Self {
        Self {
            name: name.into(),
            trigger,
            job,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn job(&self) -> &Arc<dyn Job> {
        &self.job
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .field("job", &self.job.name())
            .finish()
    }
}

/// Task state. A task always comes back to `Idle`; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Due,
    Running,
}

/// How one firing ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed(RunSummary),
    Failed(String),
    Panicked(String),
}

/// Record of one firing, returned by `SchedulerEngine::run_pending`.
#[derive(Debug, Clone)]
pub struct TaskRun {
    pub task: String,
    /// The due time that was consumed by this firing.
    pub scheduled_for: NaiveDateTime,
    pub started_at: NaiveDateTime,
    pub outcome: TaskOutcome,
}

/// Read-only view of a task's bookkeeping.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    pub name: String,
    pub trigger: Trigger,
    pub state: TaskState,
    pub next_run: NaiveDateTime,
    pub last_run: Option<NaiveDateTime>,
    pub run_count: u32,
    pub failure_count: u32,
}

pub(crate) struct TaskEntry {
    pub(crate) task: ScheduledTask,
    pub(crate) state: TaskState,
    pub(crate) next_run: NaiveDateTime,
    pub(crate) last_run: Option<NaiveDateTime>,
    pub(crate) run_count: u32,
    pub(crate) failure_count: u32,
}

impl TaskEntry {
    pub(crate) fn new(task: ScheduledTask, registered_at: NaiveDateTime) -> Self {
        let next_run = task.trigger.first_due(registered_at);
        Self {
            task,
            state: TaskState::Idle,
            next_run,
            last_run: None,
            run_count: 0,
            failure_count: 0,
        }
    }

    /// Whether the task fires at `now`. A weekly slot whose window already
    /// closed is skipped and rolled forward without firing.
    pub(crate) fn check(&mut self, now: NaiveDateTime, window: TimeDelta) -> bool {
        if now < self.next_run {
            return false;
        }
        match &self.task.trigger {
            Trigger::Every(_) => true,
            Trigger::WeeklyAt { weekday, time } => {
                if now < trigger::add(self.next_run, window) {
                    return true;
                }
                let missed = self.next_run;
                self.next_run = trigger::next_weekly_occurrence(*weekday, *time, now);
                tracing::warn!(
                    "⏭️ Task '{}' missed its {} slot (checked at {}), next at {}",
                    self.task.name,
                    missed,
                    now,
                    self.next_run
                );
                false
            }
        }
    }

    /// Bookkeeping after a firing, whatever its outcome. At most one firing
    /// per elapsed interval: the next due time is measured from this run.
    pub(crate) fn complete(&mut self, ran_at: NaiveDateTime) {
        self.last_run = Some(ran_at);
        self.run_count += 1;
        self.next_run = match &self.task.trigger {
            Trigger::Every(interval) => trigger::add(ran_at, *interval),
            Trigger::WeeklyAt { weekday, time } => trigger::next_weekly_occurrence(
                *weekday,
                *time,
                trigger::add(self.next_run, TimeDelta::minutes(1)),
            ),
        };
        self.state = TaskState::Idle;
    }

    pub(crate) fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            name: self.task.name.clone(),
            trigger: self.task.trigger.clone(),
            state: self.state,
            next_run: self.next_run,
            last_run: self.last_run,
            run_count: self.run_count,
            failure_count: self.failure_count,
        }
    }
}
