//! Delivery urgency classification.
//!
//! Urgency is never stored. It is recomputed from the due date, the
//! lifecycle state and "today" on every read, so callers pass the date in
//! (usually from a [`Clock`]).

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;

use crate::entity::{LifecycleState, WorkOrder};

/// Last day (inclusive) that still counts as urgent.
pub const URGENT_DAYS: i64 = 7;
/// Last day (inclusive) that still counts as a warning.
pub const WARNING_DAYS: i64 = 21;

/// Source of "now" for everything time-dependent.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Local calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock; `today` is the local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl FixedClock {
    /// Fixed at noon UTC on `today`.
    pub fn on(today: NaiveDate) -> Self {
        let now = today
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        Self { now, today }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyStatus {
    Overdue,
    Urgent,
    Warning,
    Ok,
    Done,
}

impl UrgencyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            UrgencyStatus::Overdue => "OVERDUE",
            UrgencyStatus::Urgent => "URGENT",
            UrgencyStatus::Warning => "UPCOMING",
            UrgencyStatus::Ok => "ON TIME",
            UrgencyStatus::Done => "DELIVERED",
        }
    }
}

impl std::fmt::Display for UrgencyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrgencyStatus::Overdue => write!(f, "overdue"),
            UrgencyStatus::Urgent => write!(f, "urgent"),
            UrgencyStatus::Warning => write!(f, "warning"),
            UrgencyStatus::Ok => write!(f, "ok"),
            UrgencyStatus::Done => write!(f, "done"),
        }
    }
}

/// Whole days from `today` to `due`; negative once the date has passed.
///
/// Both sides are calendar dates, so daylight-saving shifts cannot skew the
/// count.
pub fn days_remaining(due: NaiveDate, today: NaiveDate) -> i64 {
    due.signed_duration_since(today).num_days()
}

pub fn classify(due: NaiveDate, state: LifecycleState, today: NaiveDate) -> UrgencyStatus {
    if state == LifecycleState::Done {
        return UrgencyStatus::Done;
    }

    match days_remaining(due, today) {
        d if d < 0 => UrgencyStatus::Overdue,
        d if d <= URGENT_DAYS => UrgencyStatus::Urgent,
        d if d <= WARNING_DAYS => UrgencyStatus::Warning,
        _ => UrgencyStatus::Ok,
    }
}

pub fn classify_order(order: &WorkOrder, today: NaiveDate) -> UrgencyStatus {
    classify(order.due_date, order.state, today)
}

/// Human countdown for listings: "Due TODAY", "3 days left", ...
pub fn countdown_label(order: &WorkOrder, today: NaiveDate) -> String {
    if order.is_done() {
        return "Delivered".to_string();
    }

    match days_remaining(order.due_date, today) {
        d if d < 0 => format!("Overdue by {} days", -d),
        0 => "Due TODAY".to_string(),
        1 => "1 day left".to_string(),
        d => format!("{} days left", d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn in_days(today: NaiveDate, n: i64) -> NaiveDate {
        today + Duration::days(n)
    }

    #[test]
    fn test_done_wins_over_any_date() {
        let today = date(2026, 3, 10);
        for offset in [-400, -1, 0, 3, 7, 8, 21, 22, 365] {
            assert_eq!(
                classify(in_days(today, offset), LifecycleState::Done, today),
                UrgencyStatus::Done
            );
        }
    }

    #[test]
    fn test_due_today_is_urgent() {
        let today = date(2026, 3, 10);
        assert_eq!(classify(today, LifecycleState::Pending, today), UrgencyStatus::Urgent);
    }

    #[test]
    fn test_bucket_boundaries() {
        let today = date(2026, 3, 10);
        let cases = [
            (-1, UrgencyStatus::Overdue),
            (0, UrgencyStatus::Urgent),
            (7, UrgencyStatus::Urgent),
            (8, UrgencyStatus::Warning),
            (21, UrgencyStatus::Warning),
            (22, UrgencyStatus::Ok),
        ];
        for (offset, expected) in cases {
            assert_eq!(
                classify(in_days(today, offset), LifecycleState::InProgress, today),
                expected,
                "offset {}",
                offset
            );
        }
    }

    #[test]
    fn test_classification_is_monotonic() {
        let today = date(2026, 6, 1);
        let mut previous = UrgencyStatus::Overdue;
        for offset in -30..60 {
            let status = classify(in_days(today, offset), LifecycleState::Pending, today);
            let rank = |s: UrgencyStatus| s as u8;
            assert!(rank(status) >= rank(previous), "offset {}", offset);
            previous = status;
        }
    }

    #[test]
    fn test_days_remaining_across_dst_change() {
        // Spans the last Sunday of March, when most European zones move clocks forward.
        assert_eq!(days_remaining(date(2026, 3, 30), date(2026, 3, 28)), 2);
        assert_eq!(days_remaining(date(2026, 10, 26), date(2026, 10, 24)), 2);
    }

    #[test]
    fn test_end_to_end_examples() {
        let today = date(2026, 10, 14);
        assert_eq!(classify(in_days(today, 5), LifecycleState::Pending, today), UrgencyStatus::Urgent);
        assert_eq!(classify(in_days(today, 5), LifecycleState::Done, today), UrgencyStatus::Done);
        assert_eq!(
            classify(in_days(today, -10), LifecycleState::InProgress, today),
            UrgencyStatus::Overdue
        );
        assert_eq!(classify(in_days(today, 15), LifecycleState::Pending, today), UrgencyStatus::Warning);
        assert_eq!(classify(in_days(today, 40), LifecycleState::Pending, today), UrgencyStatus::Ok);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::on(date(2026, 10, 14));
        assert_eq!(clock.today(), date(2026, 10, 14));
        assert_eq!(clock.now().date_naive(), date(2026, 10, 14));
    }
}
