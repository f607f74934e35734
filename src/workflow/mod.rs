//! Work-order mutations.
//!
//! Every mutation runs the same sequence: validate, write through the store,
//! append one audit entry, then reload the whole collection. The in-process
//! order list is never patched in place; a failed store call leaves it as it
//! was and records nothing.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::audit;
use crate::entity::furniture::normalize;
use crate::entity::{AuditAction, AuditEntry, LifecycleState, WorkOrder, WorkOrderDraft, WorkOrderRecord};
use crate::error::{FieldError, Result, WorkshopError};
use crate::session::Session;
use crate::storage::WorkshopStore;
use crate::urgency::{Clock, SystemClock};
use crate::view::{self, ViewFilter};

/// Interactive yes/no gate for destructive operations.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Says yes without asking (`--force`).
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Always declines.
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}

pub struct Workflow<S, C = SystemClock> {
    store: S,
    clock: C,
    orders: Vec<WorkOrder>,
}

impl<S: WorkshopStore, C: Clock> Workflow<S, C> {
    /// Wrap a store and load the current collection.
    pub fn load(store: S, clock: C) -> Result<Self> {
        let mut workflow = Self {
            store,
            clock,
            orders: Vec::new(),
        };
        workflow.reload()?;
        Ok(workflow)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Cached orders, ascending by due date.
    pub fn orders(&self) -> &[WorkOrder] {
        &self.orders
    }

    /// Replace the cache with a fresh fetch. On failure the old cache stays.
    pub fn reload(&mut self) -> Result<()> {
        let orders = self.store.fetch_orders().map_err(|e| {
            warn!(error = %e, "failed to fetch orders");
            WorkshopError::connectivity(e)
        })?;
        debug!(count = orders.len(), "order cache reloaded");
        self.orders = orders;
        Ok(())
    }

    pub fn view(&self, filter: ViewFilter) -> Vec<&WorkOrder> {
        view::view(&self.orders, filter, self.clock.today())
    }

    /// Look up an order by exact id or unique id prefix.
    pub fn find(&self, id: &str) -> Result<&WorkOrder> {
        if let Some(order) = self.orders.iter().find(|o| o.id == id) {
            return Ok(order);
        }

        let mut matches = self.orders.iter().filter(|o| o.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(order), None) if !id.is_empty() => Ok(order),
            (Some(_), Some(_)) => Err(WorkshopError::AmbiguousId(id.to_string())),
            _ => Err(WorkshopError::OrderNotFound(id.to_string())),
        }
    }

    pub fn create(&mut self, session: &Session, draft: WorkOrderDraft) -> Result<WorkOrder> {
        let due_date = validate(&draft, "")?;
        let now = self.clock.now();

        let order = WorkOrder {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            place: draft.place.trim().to_string(),
            due_date,
            state: draft.state,
            items: normalize(Some(&draft.items)),
            notes: draft.notes,
            created_by: session.user_id.clone(),
            created_at: now,
            edited_by: None,
            edited_at: None,
        };

        self.write(&order)?;
        self.append(audit::record(&order.id, &order.name, session, AuditAction::Created, None, now))?;
        info!(order_id = %order.id, "work order created");
        self.refresh();
        Ok(order)
    }

    /// Replace an order's editable fields. Id and creation stamp are kept.
    pub fn update(&mut self, session: &Session, id: &str, draft: WorkOrderDraft) -> Result<WorkOrder> {
        let due_date = validate(&draft, "")?;
        let existing = self.find(id)?.clone();
        let now = self.clock.now();

        let order = WorkOrder {
            name: draft.name.trim().to_string(),
            place: draft.place.trim().to_string(),
            due_date,
            state: draft.state,
            items: normalize(Some(&draft.items)),
            notes: draft.notes,
            edited_by: Some(session.user_id.clone()),
            edited_at: Some(now),
            ..existing
        };

        self.write(&order)?;
        self.append(audit::record(&order.id, &order.name, session, AuditAction::Edited, None, now))?;
        info!(order_id = %order.id, state = %order.state, "work order updated");
        self.refresh();
        Ok(order)
    }

    /// Delete after confirmation. Admin only; `Ok(false)` when declined.
    pub fn delete(&mut self, session: &Session, id: &str, confirm: &mut dyn Confirm) -> Result<bool> {
        session.require_admin("delete work orders")?;
        let order = self.find(id)?.clone();

        if !confirm.confirm(&format!("Delete work order ({}) - {}?", order.short_id(), order.name)) {
            debug!(order_id = %order.id, "delete declined");
            return Ok(false);
        }

        let now = self.clock.now();
        self.store.delete_order(&order.id).map_err(|e| {
            warn!(order_id = %order.id, error = %e, "failed to delete order");
            WorkshopError::connectivity(e)
        })?;
        self.append(audit::record(&order.id, &order.name, session, AuditAction::Deleted, None, now))?;
        info!(order_id = %order.id, "work order deleted");
        self.refresh();
        Ok(true)
    }

    /// Shortcut to `done` without going through the edit form.
    pub fn mark_delivered(&mut self, session: &Session, id: &str) -> Result<WorkOrder> {
        let existing = self.find(id)?.clone();
        let now = self.clock.now();

        let order = WorkOrder {
            state: LifecycleState::Done,
            edited_by: Some(session.user_id.clone()),
            edited_at: Some(now),
            ..existing
        };

        self.write(&order)?;
        self.append(audit::record(
            &order.id,
            &order.name,
            session,
            AuditAction::MarkedDelivered,
            None,
            now,
        ))?;
        info!(order_id = %order.id, "work order marked delivered");
        self.refresh();
        Ok(order)
    }

    /// Audit trail, newest first. Admin only.
    pub fn history(&self, session: &Session, order_id: Option<&str>) -> Result<Vec<AuditEntry>> {
        session.require_admin("view the audit trail")?;
        self.store
            .fetch_history(order_id)
            .map_err(WorkshopError::connectivity)
    }

    /// Bring in records exported from the previous system. Admin only.
    ///
    /// Every record is validated before the first write; one invalid record
    /// rejects the whole batch.
    pub fn import(&mut self, session: &Session, records: Vec<WorkOrderRecord>) -> Result<usize> {
        session.require_admin("import work orders")?;
        let now = self.clock.now();

        let mut errors = Vec::new();
        let mut orders = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let id = record.id.clone().filter(|id| !id.trim().is_empty());
            let created_by = record.created_by.clone();
            let created_at = record.created_at;
            let edited_by = record.edited_by.clone();
            let edited_at = record.edited_at;
            let draft = record.into_draft();

            match validate(&draft, &format!("records[{}].", index)) {
                Ok(due_date) => orders.push(WorkOrder {
                    id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                    name: draft.name.trim().to_string(),
                    place: draft.place.trim().to_string(),
                    due_date,
                    state: draft.state,
                    items: normalize(Some(&draft.items)),
                    notes: draft.notes,
                    created_by: created_by.unwrap_or_else(|| session.user_id.clone()),
                    created_at: created_at.unwrap_or(now),
                    edited_by,
                    edited_at,
                }),
                Err(e) => errors.extend(e.field_errors().iter().cloned()),
            }
        }
        if !errors.is_empty() {
            return Err(WorkshopError::Validation(errors));
        }

        for order in &orders {
            self.write(order)?;
            self.append(audit::record(
                &order.id,
                &order.name,
                session,
                AuditAction::Created,
                Some("Imported".to_string()),
                now,
            ))?;
        }
        info!(count = orders.len(), "work orders imported");
        self.refresh();
        Ok(orders.len())
    }

    /// Reload after a committed mutation. The change is already stored, so a
    /// failed fetch only leaves the previous cache in place until the next load.
    fn refresh(&mut self) {
        if let Err(e) = self.reload() {
            warn!(error = %e, "mutation stored but reload failed; cache is stale");
        }
    }

    fn write(&self, order: &WorkOrder) -> Result<()> {
        self.store.upsert_order(order).map(|_| ()).map_err(|e| {
            warn!(order_id = %order.id, error = %e, "failed to write order");
            WorkshopError::connectivity(e)
        })
    }

    fn append(&self, entry: AuditEntry) -> Result<()> {
        self.store.append_history(&entry).map_err(|e| {
            warn!(order_id = %entry.order_id, error = %e, "failed to append audit entry");
            WorkshopError::connectivity(e)
        })
    }
}

/// Required-field check; returns the due date when everything is present.
fn validate(draft: &WorkOrderDraft, prefix: &str) -> Result<NaiveDate> {
    let mut missing = Vec::new();
    if draft.name.trim().is_empty() {
        missing.push(FieldError::required(format!("{}name", prefix)));
    }
    if draft.place.trim().is_empty() {
        missing.push(FieldError::required(format!("{}place", prefix)));
    }
    match draft.due_date {
        Some(due) if missing.is_empty() => Ok(due),
        Some(_) => Err(WorkshopError::Validation(missing)),
        None => {
            missing.push(FieldError::required(format!("{}due_date", prefix)));
            Err(WorkshopError::Validation(missing))
        }
    }
}
