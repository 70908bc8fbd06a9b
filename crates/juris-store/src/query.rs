//! Recipient query adapter: turns a notification kind and a date into the
//! reads each job needs.

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};
use juris_core::{
    CaseDeadlineRecord, CaseStore, ManagerRecord, NotificationKind, NotifyConfig, QueryError,
    WeeklyStats,
};

/// Everything the weekly summary needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyBatch {
    pub managers: Vec<ManagerRecord>,
    pub stats: WeeklyStats,
}

/// Records matching one notification kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientBatch {
    Deadlines(Vec<CaseDeadlineRecord>),
    Weekly(WeeklyBatch),
}

/// Eligibility windows plus a handle on the store. No retries here: a failed
/// read is returned to the caller as-is.
#[derive(Clone)]
pub struct RecipientQuery {
    store: Arc<dyn CaseStore>,
    horizon_days: u32,
    summary_window_days: u32,
    privileged_roles: Vec<String>,
}

impl RecipientQuery {
    pub fn new(store: Arc<dyn CaseStore>, config: &NotifyConfig) -> Self {
        Self {
            store,
            horizon_days: config.horizon_days,
            summary_window_days: config.summary_window_days,
            privileged_roles: config.privileged_roles.clone(),
        }
    }

    pub fn privileged_roles(&self) -> &[String] {
        &self.privileged_roles
    }

    /// `[today, today + horizon_days]`.
    pub fn deadline_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today, shift(today, i64::from(self.horizon_days)))
    }

    /// `[today - summary_window_days, today]`.
    pub fn summary_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (shift(today, -i64::from(self.summary_window_days)), today)
    }

    async fn deadlines(&self, today: NaiveDate) -> Result<Vec<CaseDeadlineRecord>, QueryError> {
        let (from, to) = self.deadline_window(today);
        let records = self.store.deadlines_between(from, to).await?;
        tracing::debug!("🔎 {} case(s) with deadlines in [{from}, {to}]", records.len());
        Ok(records)
    }

    async fn weekly(&self, today: NaiveDate) -> Result<WeeklyBatch, QueryError> {
        let managers = self
            .store
            .active_users_with_roles(&self.privileged_roles)
            .await?;
        let (from, to) = self.summary_window(today);
        let cases = self.store.cases_created_between(from, to).await?;
        let stats = WeeklyStats::from_cases(from, to, &cases);
        tracing::debug!(
            "🔎 {} manager(s), {} new case(s) in [{from}, {to}]",
            managers.len(),
            stats.new_cases
        );
        Ok(WeeklyBatch { managers, stats })
    }

    /// The records `kind` acts on for `today`.
    pub async fn fetch(&self, kind: NotificationKind, today: NaiveDate) -> Result<RecipientBatch, QueryError> {
        match kind {
            NotificationKind::DeadlineReminder => self.deadlines(today).await.map(RecipientBatch::Deadlines),
            NotificationKind::WeeklySummary => self.weekly(today).await.map(RecipientBatch::Weekly),
        }
    }
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(TimeDelta::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use juris_core::{CaseCreated, ClientContact};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn deadline(id: &str, on: NaiveDate) -> CaseDeadlineRecord {
        CaseDeadlineRecord {
            id: id.into(),
            description: format!("case {id}"),
            deadline: on,
            client: Some(ClientContact {
                name: None,
                email: Some(format!("{id}@x.com")),
            }),
        }
    }

    fn query(store: Arc<InMemoryStore>) -> RecipientQuery {
        RecipientQuery::new(store, &NotifyConfig::default())
    }

    #[test]
    fn test_windows() {
        let q = query(Arc::new(InMemoryStore::new()));
        assert_eq!(q.deadline_window(date(10, 16)), (date(10, 16), date(10, 23)));
        assert_eq!(q.summary_window(date(10, 16)), (date(10, 9), date(10, 16)));
    }

    #[tokio::test]
    async fn test_deadlines_use_inclusive_window() {
        let store = Arc::new(InMemoryStore::new());
        store.add_deadline(deadline("past", date(10, 15)));
        store.add_deadline(deadline("today", date(10, 16)));
        store.add_deadline(deadline("edge", date(10, 23)));
        store.add_deadline(deadline("late", date(10, 24)));

        let ids: Vec<String> = query(store)
            .deadlines(date(10, 16))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["today", "edge"]);
    }

    #[tokio::test]
    async fn test_weekly_counts_cases_on_window_boundaries() {
        let store = Arc::new(InMemoryStore::new());
        for (id, on) in [("a", date(10, 8)), ("b", date(10, 9)), ("c", date(10, 16)), ("d", date(10, 17))] {
            store.add_case(CaseCreated { id: id.into(), status: None, created_on: on });
        }
        store.add_user(ManagerRecord { email: Some("g@x.com".into()), role: "diretor".into(), active: true });

        let batch = query(store).weekly(date(10, 16)).await.unwrap();
        assert_eq!(batch.stats.new_cases, 2);
        assert_eq!(batch.stats.window_start, date(10, 9));
        assert_eq!(batch.managers.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_dispatches_on_kind() {
        let store = Arc::new(InMemoryStore::new());
        store.add_deadline(deadline("a", date(10, 18)));
        let q = query(store);
        assert!(matches!(
            q.fetch(NotificationKind::DeadlineReminder, date(10, 16)).await.unwrap(),
            RecipientBatch::Deadlines(ref r) if r.len() == 1
        ));
        assert!(matches!(
            q.fetch(NotificationKind::WeeklySummary, date(10, 16)).await.unwrap(),
            RecipientBatch::Weekly(ref b) if b.stats.new_cases == 0
        ));
    }

    #[tokio::test]
    async fn test_store_failure_is_returned() {
        let store = Arc::new(InMemoryStore::new());
        store.set_unavailable(true);
        let err = query(store).deadlines(date(10, 16)).await.unwrap_err();
        assert!(matches!(err, QueryError::Unavailable(_)));
    }
}
