mod audit;
pub mod furniture;
mod user;
mod work_order;

pub use audit::{AuditAction, AuditEntry};
pub use furniture::{FurnitureItem, RawFurnitureItem};
pub use user::{Role, User};
pub use work_order::{short_id, LifecycleState, WorkOrder, WorkOrderDraft, WorkOrderRecord};
