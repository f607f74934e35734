// src/entity/work_order.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::furniture::{FurnitureItem, RawFurnitureItem};

/// Stored lifecycle state of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    #[serde(alias = "pendiente")]
    Pending,
    #[serde(alias = "en_proceso")]
    InProgress,
    #[serde(alias = "terminado")]
    Done,
}

impl LifecycleState {
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleState::Pending => "Pending",
            LifecycleState::InProgress => "In progress",
            LifecycleState::Done => "Done",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Pending => write!(f, "pending"),
            LifecycleState::InProgress => write!(f, "in_progress"),
            LifecycleState::Done => write!(f, "done"),
        }
    }
}

impl std::str::FromStr for LifecycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" | "pendiente" => Ok(LifecycleState::Pending),
            "in_progress" | "inprogress" | "en_proceso" => Ok(LifecycleState::InProgress),
            "done" | "terminado" => Ok(LifecycleState::Done),
            _ => Err(format!("Invalid work order state: {}", s)),
        }
    }
}

/// A single furniture-delivery job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub name: String,
    pub place: String,
    pub due_date: NaiveDate,
    pub state: LifecycleState,
    pub items: Vec<FurnitureItem>,
    pub notes: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub edited_by: Option<String>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl WorkOrder {
    pub fn is_done(&self) -> bool {
        self.state == LifecycleState::Done
    }

    /// First seven characters of the id, for listings.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// First seven characters of any id. Imported ids need not be ASCII.
pub fn short_id(id: &str) -> &str {
    let end = id.char_indices().nth(7).map(|(i, _)| i).unwrap_or(id.len());
    &id[..end]
}

/// User input for creating or editing a work order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkOrderDraft {
    pub name: String,
    pub place: String,
    pub due_date: Option<NaiveDate>,
    pub state: LifecycleState,
    pub items: Vec<RawFurnitureItem>,
    pub notes: String,
}

impl WorkOrderDraft {
    /// Pre-filled draft for editing an existing order.
    pub fn from_order(order: &WorkOrder) -> Self {
        Self {
            name: order.name.clone(),
            place: order.place.clone(),
            due_date: Some(order.due_date),
            state: order.state,
            items: order.items.iter().cloned().map(Into::into).collect(),
            notes: order.notes.clone(),
        }
    }
}

/// Work order as found in imported exports, before validation.
///
/// Field names of the previous system are accepted as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkOrderRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "lugar")]
    pub place: String,
    #[serde(default, alias = "fecha")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, alias = "estado")]
    pub state: LifecycleState,
    #[serde(default, alias = "muebles")]
    pub items: Option<Vec<RawFurnitureItem>>,
    #[serde(default, alias = "notas")]
    pub notes: Option<String>,
    #[serde(default, alias = "creado_por", alias = "creadoPor")]
    pub created_by: Option<String>,
    #[serde(default, alias = "creado_en", alias = "creadoEn")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "editado_por")]
    pub edited_by: Option<String>,
    #[serde(default, alias = "editado_en")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl WorkOrderRecord {
    pub fn into_draft(self) -> WorkOrderDraft {
        WorkOrderDraft {
            name: self.name,
            place: self.place,
            due_date: self.due_date,
            state: self.state,
            items: self.items.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
        }
    }
}
