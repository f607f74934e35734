// In-memory store for tests, with switchable failures.
use std::cell::{Cell, RefCell};

use super::WorkshopStore;
use crate::audit::{self, HISTORY_LIMIT};
use crate::entity::{AuditEntry, User, WorkOrder};
use crate::error::{Result, WorkshopError};

#[derive(Default)]
pub struct MemoryStore {
    orders: RefCell<Vec<WorkOrder>>,
    users: RefCell<Vec<User>>,
    history: RefCell<Vec<AuditEntry>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    fail_history: Cell<bool>,
}

impl MemoryStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Fail only `append_history`.
    pub fn fail_history(&self, fail: bool) {
        self.fail_history.set(fail);
    }

    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    fn check(&self, flag: &Cell<bool>) -> Result<()> {
        if flag.get() {
            Err(WorkshopError::Storage("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl WorkshopStore for MemoryStore {
    fn fetch_orders(&self) -> Result<Vec<WorkOrder>> {
        self.check(&self.fail_reads)?;
        let mut orders = self.orders.borrow().clone();
        orders.sort_by_key(|o| o.due_date);
        Ok(orders)
    }

    fn upsert_order(&self, order: &WorkOrder) -> Result<WorkOrder> {
        self.check(&self.fail_writes)?;
        let mut orders = self.orders.borrow_mut();
        match orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order.clone(),
            None => orders.push(order.clone()),
        }
        Ok(order.clone())
    }

    fn delete_order(&self, id: &str) -> Result<()> {
        self.check(&self.fail_writes)?;
        self.orders.borrow_mut().retain(|o| o.id != id);
        Ok(())
    }

    fn fetch_users(&self) -> Result<Vec<User>> {
        self.check(&self.fail_reads)?;
        Ok(self.users.borrow().clone())
    }

    fn upsert_user(&self, user: &User) -> Result<User> {
        self.check(&self.fail_writes)?;
        let mut users = self.users.borrow_mut();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => users.push(user.clone()),
        }
        Ok(user.clone())
    }

    fn delete_user(&self, id: &str) -> Result<()> {
        self.check(&self.fail_writes)?;
        self.users.borrow_mut().retain(|u| u.id != id);
        Ok(())
    }

    fn fetch_history(&self, order_id: Option<&str>) -> Result<Vec<AuditEntry>> {
        self.check(&self.fail_reads)?;
        Ok(audit::query(self.history.borrow().clone(), order_id, HISTORY_LIMIT))
    }

    fn append_history(&self, entry: &AuditEntry) -> Result<()> {
        self.check(&self.fail_writes)?;
        self.check(&self.fail_history)?;
        self.history.borrow_mut().push(entry.clone());
        Ok(())
    }
}
