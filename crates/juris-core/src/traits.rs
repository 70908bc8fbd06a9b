//! Collaborator ports. Implementations are built once at startup and shared
//! behind `Arc<dyn ..>`.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{DispatchError, JobError, QueryError};
use crate::types::{CaseCreated, CaseDeadlineRecord, ManagerRecord, NotificationKind, OutgoingEmail, RunSummary};

/// Read-only access to the case and user collections.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Cases whose deadline lies in `[from, to]`, joined with client contact.
    async fn deadlines_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CaseDeadlineRecord>, QueryError>;

    /// Active users whose role is one of `roles`.
    async fn active_users_with_roles(&self, roles: &[String]) -> Result<Vec<ManagerRecord>, QueryError>;

    /// Cases created in `[from, to]`.
    async fn cases_created_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CaseCreated>, QueryError>;
}

/// One outbound email call. Returns the provider message id when it has one.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, DispatchError>;
}

/// A unit of scheduled work.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> NotificationKind;

    /// Run to completion for the wall-clock instant `now`.
    async fn run(&self, now: NaiveDateTime) -> Result<RunSummary, JobError>;
}
