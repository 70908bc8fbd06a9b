//! # juris-scheduler
//!
//! Polling task scheduler for the notification jobs.
//!
//! ## Architecture
//! ```text
//! SchedulerEngine (poll every N seconds)
//!   ├── Every(1h)            → deadline reminders
//!   ├── WeeklyAt(Mon 08:00)  → weekly summary
//!   └── due task → Job::run(now), errors and panics caught per task
//! ```
//!
//! Tasks move `Idle → Due → Running → Idle`. An interval task fires at most
//! once per check however many intervals elapsed; a weekly task fires inside
//! a short window after its slot and skips slots whose window already closed.

pub mod clock;
pub mod engine;
pub mod tasks;
pub mod trigger;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{SchedulePolicy, SchedulerEngine};
pub use tasks::{ScheduledTask, TaskOutcome, TaskRun, TaskSnapshot, TaskState};
pub use trigger::{Trigger, next_weekly_occurrence};
