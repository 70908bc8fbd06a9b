//! # juris-core
//!
//! Shared vocabulary of the notification service: configuration, the error
//! taxonomy, the data model, and the ports behind which the case store, the
//! email provider and scheduled jobs live.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    DatabaseConfig, MailConfig, MailProviderKind, NotifierConfig, NotifyConfig, ScheduleConfig,
    SmtpConfig, SmtpTls,
};
pub use error::{ConfigError, DispatchError, JobError, QueryError};
pub use traits::{CaseStore, EmailProvider, Job};
pub use types::{
    CaseCreated, CaseDeadlineRecord, ClientContact, DispatchOutcome, ManagerRecord,
    NotificationKind, OutgoingEmail, RunSummary, WeeklyStats,
};
