mod loro_store;
#[cfg(test)]
mod memory;

pub use loro_store::LoroStore;
#[cfg(test)]
pub use memory::MemoryStore;

use crate::entity::{AuditEntry, User, WorkOrder};
use crate::error::Result;

/// The persistence collaborator that owns the work-order collection.
///
/// Writes are last-write-wins: `upsert_*` overwrites whatever is stored
/// under the same id without any version check.
pub trait WorkshopStore {
    /// All orders, ascending by due date.
    fn fetch_orders(&self) -> Result<Vec<WorkOrder>>;

    /// Insert, or overwrite in place when the id already exists.
    fn upsert_order(&self, order: &WorkOrder) -> Result<WorkOrder>;

    fn delete_order(&self, id: &str) -> Result<()>;

    fn fetch_users(&self) -> Result<Vec<User>>;

    fn upsert_user(&self, user: &User) -> Result<User>;

    fn delete_user(&self, id: &str) -> Result<()>;

    /// Newest first, at most [`crate::audit::HISTORY_LIMIT`] entries.
    fn fetch_history(&self, order_id: Option<&str>) -> Result<Vec<AuditEntry>>;

    fn append_history(&self, entry: &AuditEntry) -> Result<()>;
}
