//! Audit trail construction and retrieval.

use chrono::{DateTime, Utc};

use crate::entity::{AuditAction, AuditEntry};
use crate::session::Session;

/// Most entries a history query returns.
pub const HISTORY_LIMIT: usize = 100;

/// Build the entry for one successful mutation.
///
/// `order_name` is a snapshot: later renames do not touch existing entries.
pub fn record(
    order_id: &str,
    order_name: &str,
    actor: &Session,
    action: AuditAction,
    detail: Option<String>,
    now: DateTime<Utc>,
) -> AuditEntry {
    AuditEntry {
        id: uuid::Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        order_name: order_name.to_string(),
        actor_id: actor.user_id.clone(),
        actor_name: actor.name.clone(),
        action,
        detail: detail.unwrap_or_else(|| action.default_detail().to_string()),
        timestamp: now,
    }
}

/// Newest-first view over stored entries, optionally for one order.
///
/// `entries` is expected in append order; entries with equal timestamps come
/// out latest-appended first.
pub fn query(entries: Vec<AuditEntry>, order_id: Option<&str>, limit: usize) -> Vec<AuditEntry> {
    let mut selected: Vec<AuditEntry> = entries
        .into_iter()
        .rev()
        .filter(|e| order_id.map_or(true, |id| e.order_id == id))
        .collect();

    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected.truncate(limit);
    selected
}
