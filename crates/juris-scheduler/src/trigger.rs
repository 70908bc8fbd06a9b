//! Trigger conditions: when a task becomes due.
//! Two kinds only: a fixed interval, or a weekday plus a time of day with
//! minute precision. No cron dependency.

use std::fmt;
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};

/// How/when a task triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Once per elapsed interval, measured from registration or the last run.
    Every(TimeDelta),
    /// Once a week on `weekday` at `time` (local wall clock).
    WeeklyAt { weekday: Weekday, time: NaiveTime },
}

impl Trigger {
    pub fn every(interval: Duration) -> Self {
        Trigger::Every(TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX))
    }

    /// Seconds and sub-seconds of `time` are dropped.
    pub fn weekly(weekday: Weekday, time: NaiveTime) -> Self {
        let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
        Trigger::WeeklyAt { weekday, time }
    }

    /// First due time for a task registered at `registered_at`.
    pub fn first_due(&self, registered_at: NaiveDateTime) -> NaiveDateTime {
        match self {
            Trigger::Every(interval) => add(registered_at, *interval),
            Trigger::WeeklyAt { weekday, time } => {
                next_weekly_occurrence(*weekday, *time, registered_at)
            }
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Every(interval) => {
                let secs = interval.num_seconds();
                if secs % 3600 == 0 {
                    write!(f, "every {}h", secs / 3600)
                } else if secs % 60 == 0 {
                    write!(f, "every {}m", secs / 60)
                } else {
                    write!(f, "every {secs}s")
                }
            }
            Trigger::WeeklyAt { weekday, time } => {
                write!(f, "every {weekday:?} at {}", time.format("%H:%M"))
            }
        }
    }
}

/// First `weekday` at `time` that is at or after `after`.
pub fn next_weekly_occurrence(weekday: Weekday, time: NaiveTime, after: NaiveDateTime) -> NaiveDateTime {
    let days_ahead = (i64::from(weekday.num_days_from_monday())
        - i64::from(after.weekday().num_days_from_monday()))
    .rem_euclid(7);
    let candidate = add(after.date().and_time(time), TimeDelta::days(days_ahead));
    if candidate >= after {
        candidate
    } else {
        add(candidate, TimeDelta::weeks(1))
    }
}

/// Saturating `NaiveDateTime + TimeDelta`.
pub(crate) fn add(at: NaiveDateTime, delta: TimeDelta) -> NaiveDateTime {
    at.checked_add_signed(delta).unwrap_or(NaiveDateTime::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        // October 2026: the 18th is a Sunday, the 19th a Monday.
        NaiveDate::from_ymd_opt(2026, 10, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn eight() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn test_next_weekly_from_previous_day() {
        let next = next_weekly_occurrence(Weekday::Mon, eight(), at(18, 23, 0));
        assert_eq!(next, at(19, 8, 0));
    }

    #[test]
    fn test_next_weekly_same_day_before_time() {
        let next = next_weekly_occurrence(Weekday::Mon, eight(), at(19, 7, 59));
        assert_eq!(next, at(19, 8, 0));
    }

    #[test]
    fn test_next_weekly_exactly_on_time() {
        let next = next_weekly_occurrence(Weekday::Mon, eight(), at(19, 8, 0));
        assert_eq!(next, at(19, 8, 0));
    }

    #[test]
    fn test_next_weekly_same_day_after_time_rolls_a_week() {
        let next = next_weekly_occurrence(Weekday::Mon, eight(), at(19, 8, 1));
        assert_eq!(next, at(26, 8, 0));
    }

    #[test]
    fn test_weekly_drops_seconds() {
        let t = NaiveTime::from_hms_opt(8, 0, 42).unwrap();
        assert_eq!(
            Trigger::weekly(Weekday::Mon, t),
            Trigger::WeeklyAt { weekday: Weekday::Mon, time: eight() }
        );
    }

    #[test]
    fn test_first_due_for_interval() {
        let trigger = Trigger::every(Duration::from_secs(3600));
        assert_eq!(trigger.first_due(at(18, 23, 0)), at(19, 0, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Trigger::every(Duration::from_secs(3600)).to_string(), "every 1h");
        assert_eq!(Trigger::every(Duration::from_secs(90)).to_string(), "every 90s");
        assert_eq!(
            Trigger::weekly(Weekday::Mon, eight()).to_string(),
            "every Mon at 08:00"
        );
    }
}
