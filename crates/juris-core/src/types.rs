//! Data model: records read from the case store and values produced while
//! notifying. Nothing here is persisted by this service.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which query and which formatter apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    DeadlineReminder,
    WeeklySummary,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::DeadlineReminder => write!(f, "deadline-reminder"),
            NotificationKind::WeeklySummary => write!(f, "weekly-summary"),
        }
    }
}

/// Contact details of the client linked to a case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContact {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A case with a deadline, joined with its client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDeadlineRecord {
    pub id: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub client: Option<ClientContact>,
}

impl CaseDeadlineRecord {
    /// Whole days from `today` until the deadline. Negative once it has passed.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.deadline - today).num_days()
    }

    /// Client email, if the case has a client with a non-blank address.
    pub fn client_email(&self) -> Option<&str> {
        self.client
            .as_ref()
            .and_then(|c| c.email.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Client display name, if any.
    pub fn client_name(&self) -> Option<&str> {
        self.client
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// A user profile that may receive the weekly summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerRecord {
    pub email: Option<String>,
    pub role: String,
    pub active: bool,
}

impl ManagerRecord {
    /// Active and holding one of the privileged roles.
    pub fn is_notifiable(&self, privileged_roles: &[String]) -> bool {
        self.active && privileged_roles.iter().any(|r| r == &self.role)
    }

    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// A case row as seen by the weekly statistics query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseCreated {
    pub id: String,
    pub status: Option<String>,
    pub created_on: NaiveDate,
}

/// Statistics over a trailing window. Derived on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub new_cases: u64,
    /// New cases per status value, sorted by status.
    pub by_status: BTreeMap<String, u64>,
}

impl WeeklyStats {
    /// Count the cases created inside `[window_start, window_end]`.
    ///
    /// Rows outside the window are ignored even if the store returned them.
    pub fn from_cases(window_start: NaiveDate, window_end: NaiveDate, cases: &[CaseCreated]) -> Self {
        let mut new_cases = 0;
        let mut by_status = BTreeMap::new();
        for case in cases
            .iter()
            .filter(|c| c.created_on >= window_start && c.created_on <= window_end)
        {
            new_cases += 1;
            let status = case
                .status
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("sem status");
            *by_status.entry(status.to_string()).or_insert(0) += 1;
        }
        Self {
            window_start,
            window_end,
            new_cases,
            by_status,
        }
    }
}

/// A fully rendered message handed to an email provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Result of one dispatch attempt for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchOutcome {
    Sent { message_id: Option<String> },
    Skipped { reason: String },
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }
}

/// Per-run counters, logged once at the end of every job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub kind: NotificationKind,
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl RunSummary {
    pub fn new(kind: NotificationKind) -> Self {
        Self {
            kind,
            sent: 0,
            skipped: 0,
            failed: 0,
        }
    }

    pub fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Sent { .. } => self.sent += 1,
            DispatchOutcome::Skipped { .. } => self.skipped += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn attempted(&self) -> u32 {
        self.sent + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} sent, {} skipped, {} failed",
            self.kind, self.sent, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(client: Option<ClientContact>) -> CaseDeadlineRecord {
        CaseDeadlineRecord {
            id: "1".into(),
            description: "Filing X".into(),
            deadline: date(2026, 10, 19),
            client,
        }
    }

    #[test]
    fn test_days_remaining() {
        let r = record(None);
        assert_eq!(r.days_remaining(date(2026, 10, 16)), 3);
        assert_eq!(r.days_remaining(date(2026, 10, 19)), 0);
        assert_eq!(r.days_remaining(date(2026, 10, 20)), -1);
    }

    #[test]
    fn test_client_email_requires_non_blank_address() {
        assert_eq!(record(None).client_email(), None);
        let blank = record(Some(ClientContact {
            name: Some("A. Silva".into()),
            email: Some("  ".into()),
        }));
        assert_eq!(blank.client_email(), None);
        let ok = record(Some(ClientContact {
            name: None,
            email: Some("a@x.com".into()),
        }));
        assert_eq!(ok.client_email(), Some("a@x.com"));
    }

    #[test]
    fn test_manager_notifiable_only_when_active_and_privileged() {
        let roles = vec!["diretor".to_string(), "super_admin".to_string()];
        let mut m = ManagerRecord {
            email: Some("g@x.com".into()),
            role: "diretor".into(),
            active: true,
        };
        assert!(m.is_notifiable(&roles));
        m.active = false;
        assert!(!m.is_notifiable(&roles));
        m.active = true;
        m.role = "advogado".into();
        assert!(!m.is_notifiable(&roles));
    }

    #[test]
    fn test_weekly_stats_window_is_inclusive() {
        let cases = vec![
            CaseCreated { id: "a".into(), status: Some("pendente".into()), created_on: date(2026, 10, 9) },
            CaseCreated { id: "b".into(), status: Some("pendente".into()), created_on: date(2026, 10, 16) },
            CaseCreated { id: "c".into(), status: None, created_on: date(2026, 10, 12) },
            CaseCreated { id: "d".into(), status: Some("concluida".into()), created_on: date(2026, 10, 8) },
        ];
        let stats = WeeklyStats::from_cases(date(2026, 10, 9), date(2026, 10, 16), &cases);
        assert_eq!(stats.new_cases, 3);
        assert_eq!(stats.by_status.get("pendente"), Some(&2));
        assert_eq!(stats.by_status.get("sem status"), Some(&1));
        assert!(!stats.by_status.contains_key("concluida"));
    }

    #[test]
    fn test_weekly_stats_empty() {
        let stats = WeeklyStats::from_cases(date(2026, 10, 9), date(2026, 10, 16), &[]);
        assert_eq!(stats.new_cases, 0);
        assert!(stats.by_status.is_empty());
    }

    #[test]
    fn test_run_summary_counts() {
        let mut s = RunSummary::new(NotificationKind::WeeklySummary);
        s.record(&DispatchOutcome::Sent { message_id: None });
        s.record(&DispatchOutcome::Failed { reason: "boom".into() });
        s.record_skip();
        assert_eq!(s.attempted(), 2);
        assert_eq!(s.to_string(), "weekly-summary: 1 sent, 1 skipped, 1 failed");
    }
}
