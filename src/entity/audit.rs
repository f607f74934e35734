// src/entity/audit.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Edited,
    Deleted,
    MarkedDelivered,
}

impl AuditAction {
    /// Detail text used when the caller gives none.
    pub fn default_detail(&self) -> &'static str {
        match self {
            AuditAction::Created => "Order created",
            AuditAction::Edited => "Order updated",
            AuditAction::Deleted => "Order deleted",
            AuditAction::MarkedDelivered => "Status: Done",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Created => write!(f, "created"),
            AuditAction::Edited => write!(f, "edited"),
            AuditAction::Deleted => write!(f, "deleted"),
            AuditAction::MarkedDelivered => write!(f, "marked_delivered"),
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "created" => Ok(AuditAction::Created),
            "edited" => Ok(AuditAction::Edited),
            "deleted" => Ok(AuditAction::Deleted),
            "marked_delivered" => Ok(AuditAction::MarkedDelivered),
            _ => Err(format!("Invalid audit action: {}", s)),
        }
    }
}

/// Immutable record of one mutation. Names are snapshots taken at mutation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub order_id: String,
    pub order_name: String,
    pub actor_id: String,
    pub actor_name: String,
    pub action: AuditAction,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}
