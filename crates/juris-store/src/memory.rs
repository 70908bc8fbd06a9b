//! In-memory case store for tests and local experiments.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use juris_core::{CaseCreated, CaseDeadlineRecord, CaseStore, ManagerRecord, QueryError};

#[derive(Default)]
struct Inner {
    deadlines: Vec<CaseDeadlineRecord>,
    users: Vec<ManagerRecord>,
    cases: Vec<CaseCreated>,
    unavailable: bool,
    unfiltered_deadlines: bool,
}

/// Applies the same filters as the PostgREST queries.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_deadline(&self, record: CaseDeadlineRecord) {
        self.lock().deadlines.push(record);
    }

    pub fn add_user(&self, user: ManagerRecord) {
        self.lock().users.push(user);
    }

    pub fn add_case(&self, case: CaseCreated) {
        self.lock().cases.push(case);
    }

    /// Every read fails with `QueryError::Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Return every deadline regardless of the requested window, as a store
    /// whose date filter disagrees with the caller would.
    pub fn set_unfiltered_deadlines(&self, unfiltered: bool) {
        self.lock().unfiltered_deadlines = unfiltered;
    }

    fn check_available(inner: &Inner) -> Result<(), QueryError> {
        if inner.unavailable {
            Err(QueryError::Unavailable("in-memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CaseStore for InMemoryStore {
    async fn deadlines_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CaseDeadlineRecord>, QueryError> {
        let inner = self.lock();
        Self::check_available(&inner)?;
        Ok(inner
            .deadlines
            .iter()
            .filter(|r| inner.unfiltered_deadlines || (r.deadline >= from && r.deadline <= to))
            .cloned()
            .collect())
    }

    async fn active_users_with_roles(&self, roles: &[String]) -> Result<Vec<ManagerRecord>, QueryError> {
        let inner = self.lock();
        Self::check_available(&inner)?;
        Ok(inner
            .users
            .iter()
            .filter(|u| u.is_notifiable(roles))
            .cloned()
            .collect())
    }

    async fn cases_created_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CaseCreated>, QueryError> {
        let inner = self.lock();
        Self::check_available(&inner)?;
        Ok(inner
            .cases
            .iter()
            .filter(|c| c.created_on >= from && c.created_on <= to)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_users_filtered_by_role_and_active_flag() {
        let store = InMemoryStore::new();
        let user = |email: &str, role: &str, active: bool| ManagerRecord {
            email: Some(email.into()),
            role: role.into(),
            active,
        };
        store.add_user(user("a@x.com", "diretor", true));
        store.add_user(user("b@x.com", "super_admin", true));
        store.add_user(user("c@x.com", "diretor", false));
        store.add_user(user("d@x.com", "advogado", true));

        let roles = vec!["diretor".to_string(), "super_admin".to_string()];
        let found = store.active_users_with_roles(&roles).await.unwrap();
        let emails: Vec<_> = found.iter().filter_map(|u| u.email()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
    }

    #[tokio::test]
    async fn test_unfiltered_deadlines_ignore_window() {
        let store = InMemoryStore::new();
        let d = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        store.add_deadline(CaseDeadlineRecord {
            id: "1".into(),
            description: "far".into(),
            deadline: d,
            client: None,
        });
        let from = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 10, 23).unwrap();
        assert!(store.deadlines_between(from, to).await.unwrap().is_empty());
        store.set_unfiltered_deadlines(true);
        assert_eq!(store.deadlines_between(from, to).await.unwrap().len(), 1);
    }
}
