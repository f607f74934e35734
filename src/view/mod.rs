//! Filtering, ordering and summaries of the work-order collection.

use chrono::NaiveDate;
use serde::Serialize;

use crate::entity::furniture::total_units;
use crate::entity::WorkOrder;
use crate::urgency::{classify_order, days_remaining, UrgencyStatus, URGENT_DAYS, WARNING_DAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    /// Urgent and overdue orders.
    Urgent,
    Warning,
    Ok,
    Done,
}

impl ViewFilter {
    pub fn matches(&self, status: UrgencyStatus) -> bool {
        match self {
            ViewFilter::All => true,
            ViewFilter::Urgent => matches!(status, UrgencyStatus::Urgent | UrgencyStatus::Overdue),
            ViewFilter::Warning => status == UrgencyStatus::Warning,
            ViewFilter::Ok => status == UrgencyStatus::Ok,
            ViewFilter::Done => status == UrgencyStatus::Done,
        }
    }
}

impl std::fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewFilter::All => write!(f, "all"),
            ViewFilter::Urgent => write!(f, "urgent"),
            ViewFilter::Warning => write!(f, "warning"),
            ViewFilter::Ok => write!(f, "ok"),
            ViewFilter::Done => write!(f, "done"),
        }
    }
}

impl std::str::FromStr for ViewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "todas" => Ok(ViewFilter::All),
            "urgent" => Ok(ViewFilter::Urgent),
            "warning" => Ok(ViewFilter::Warning),
            "ok" => Ok(ViewFilter::Ok),
            "done" => Ok(ViewFilter::Done),
            _ => Err(format!("Invalid filter: {} (expected all, urgent, warning, ok, done)", s)),
        }
    }
}

/// The visible orders for `filter`: delivered orders last, each partition by
/// ascending due date. Equal dates keep their input order.
pub fn view(orders: &[WorkOrder], filter: ViewFilter, today: NaiveDate) -> Vec<&WorkOrder> {
    let mut visible: Vec<&WorkOrder> = orders
        .iter()
        .filter(|o| filter.matches(classify_order(o, today)))
        .collect();

    // sort_by_key is stable
    visible.sort_by_key(|o| (o.is_done(), o.due_date));
    visible
}

/// Counters shown on the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub active: usize,
    pub urgent: usize,
    pub upcoming: usize,
    pub delivered: usize,
    /// Urgent plus upcoming. Overdue orders do not raise alerts.
    pub alerts: usize,
}

pub fn stats(orders: &[WorkOrder], today: NaiveDate) -> DashboardStats {
    let mut stats = DashboardStats::default();

    for order in orders {
        if order.is_done() {
            stats.delivered += 1;
            continue;
        }
        stats.active += 1;
        match days_remaining(order.due_date, today) {
            d if (0..=URGENT_DAYS).contains(&d) => stats.urgent += 1,
            d if d > URGENT_DAYS && d <= WARNING_DAYS => stats.upcoming += 1,
            _ => {}
        }
    }

    stats.alerts = stats.urgent + stats.upcoming;
    stats
}

/// One line of the daily digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestLine {
    pub id: String,
    pub name: String,
    pub place: String,
    pub due_date: NaiveDate,
    pub days_remaining: i64,
    pub kinds: usize,
    pub units: u32,
}

impl DigestLine {
    fn from_order(order: &WorkOrder, today: NaiveDate) -> Self {
        Self {
            id: order.id.clone(),
            name: order.name.clone(),
            place: order.place.clone(),
            due_date: order.due_date,
            days_remaining: days_remaining(order.due_date, today),
            kinds: order.items.len(),
            units: total_units(&order.items),
        }
    }
}

/// Daily summary of active orders that need attention soon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub date: NaiveDate,
    pub urgent: Vec<DigestLine>,
    pub upcoming: Vec<DigestLine>,
    pub active: usize,
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.urgent.is_empty() && self.upcoming.is_empty()
    }
}

pub fn digest(orders: &[WorkOrder], today: NaiveDate) -> Digest {
    let active: Vec<&WorkOrder> = orders.iter().filter(|o| !o.is_done()).collect();

    let mut urgent: Vec<DigestLine> = active
        .iter()
        .map(|o| DigestLine::from_order(o, today))
        .filter(|l| (0..=URGENT_DAYS).contains(&l.days_remaining))
        .collect();
    urgent.sort_by_key(|l| l.days_remaining);

    let upcoming = active
        .iter()
        .map(|o| DigestLine::from_order(o, today))
        .filter(|l| l.days_remaining > URGENT_DAYS && l.days_remaining <= WARNING_DAYS)
        .collect();

    Digest {
        date: today,
        urgent,
        upcoming,
        active: active.len(),
    }
}

/// Plain-text rendering of a digest, suitable for a chat message.
pub fn render_digest(digest: &Digest) -> String {
    let mut msg = format!(
        "MaderoGest daily summary\n{}\n\n",
        digest.date.format("%A %d %B %Y")
    );

    if !digest.urgent.is_empty() {
        msg.push_str(&format!("URGENT (<= {} days):\n", URGENT_DAYS));
        for line in &digest.urgent {
            let when = match line.days_remaining {
                0 => "TODAY".to_string(),
                d => format!("{} days", d),
            };
            msg.push_str(&format!(
                "- {}\n  {}\n  {} - {}\n  {} kinds, {} units\n\n",
                line.name,
                line.place,
                line.due_date.format("%d/%m/%Y"),
                when,
                line.kinds,
                line.units
            ));
        }
    }

    if !digest.upcoming.is_empty() {
        msg.push_str(&format!("UPCOMING (<= {} days):\n", WARNING_DAYS));
        for line in &digest.upcoming {
            msg.push_str(&format!(
                "- {} - {} days\n  {}\n\n",
                line.name, line.days_remaining, line.place
            ));
        }
    }

    msg.push_str(&format!("Active orders: {}", digest.active));
    msg
}
