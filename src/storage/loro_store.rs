use std::fs;
use std::path::{Path, PathBuf};

use loro::{LoroDoc, LoroList, LoroMap, LoroValue};
use serde_json::Value;
use tracing::debug;

use super::WorkshopStore;
use crate::audit::{self, HISTORY_LIMIT};
use crate::cache::SqliteCache;
use crate::entity::furniture::normalize;
use crate::entity::{AuditEntry, RawFurnitureItem, User, WorkOrder};
use crate::error::{Result, WorkshopError};

pub const PROJECT_DIR: &str = ".maderogest";
const LORO_DB: &str = "loro.db";
const GITIGNORE: &str = "local.json\ncache.db\n";

pub struct LoroStore {
    doc: LoroDoc,
    path: PathBuf,
}

impl LoroStore {
    /// Initialize a new workshop project
    pub fn init(root: &Path) -> Result<Self> {
        let project_dir = root.join(PROJECT_DIR);

        if project_dir.exists() {
            return Err(WorkshopError::AlreadyInitialized);
        }

        fs::create_dir_all(&project_dir)?;
        fs::write(project_dir.join(".gitignore"), GITIGNORE)?;

        let doc = LoroDoc::new();
        let path = project_dir.join(LORO_DB);

        let store = Self { doc, path };
        store.save()?;

        Ok(store)
    }

    /// Open an existing workshop project
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(PROJECT_DIR).join(LORO_DB);

        if !path.exists() {
            return Err(WorkshopError::NotInitialized);
        }

        let bytes = fs::read(&path)?;
        let doc = LoroDoc::new();
        doc.import(&bytes)?;

        Ok(Self { doc, path })
    }

    /// Save the document to disk
    pub fn save(&self) -> Result<()> {
        let bytes = self.doc.export(loro::ExportMode::Snapshot)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// The `.maderogest/` directory
    pub fn project_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Size of loro.db in bytes
    pub fn file_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    /// Version vector of the document, used for cache invalidation
    pub fn version_hash(&self) -> String {
        let vv = self.doc.oplog_vv();
        format!("{:?}", vv)
    }

    /// Bring the search cache up to date. Returns true if it was rebuilt.
    pub fn sync_cache(&self, cache: &SqliteCache) -> Result<bool> {
        let orders = self.fetch_orders()?;
        cache.sync_from_loro(&orders, &self.version_hash())
    }

    /// Commit pending changes and write them through to disk.
    fn commit(&self) -> Result<()> {
        self.doc.commit();
        self.save()
    }

    fn parse_order_from_map(&self, map: &loro::LoroMapValue) -> Option<WorkOrder> {
        let id = string_field(map, "id")?;
        let name = string_field(map, "name")?;

        let due_date = match map.get("due_date")? {
            LoroValue::String(s) => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?,
            _ => return None,
        };

        let created_at = timestamp_field(map, "created_at")?;

        let state = string_field(map, "state")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        // Older documents hold bare strings in the item list.
        let raw_items: Vec<RawFurnitureItem> = match map.get("items") {
            Some(LoroValue::List(list)) => list
                .iter()
                .filter_map(|item| match item {
                    LoroValue::String(s) => Some(RawFurnitureItem::LegacyName(s.to_string())),
                    LoroValue::Map(m) => Some(RawFurnitureItem::Item {
                        name: string_field(m, "name")?,
                        quantity: m.get("quantity").map(json_value).unwrap_or(Value::Null),
                    }),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        Some(WorkOrder {
            id,
            name,
            place: string_field(map, "place").unwrap_or_default(),
            due_date,
            state,
            items: normalize(Some(&raw_items)),
            notes: string_field(map, "notes").unwrap_or_default(),
            created_by: string_field(map, "created_by").unwrap_or_default(),
            created_at,
            edited_by: string_field(map, "edited_by"),
            edited_at: timestamp_field(map, "edited_at"),
        })
    }

    fn parse_user_from_map(&self, map: &loro::LoroMapValue) -> Option<User> {
        Some(User {
            id: string_field(map, "id")?,
            name: string_field(map, "name")?,
            email: string_field(map, "email")?,
            password: string_field(map, "password")?,
            role: string_field(map, "role")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        })
    }

    fn parse_entry_from_map(&self, map: &loro::LoroMapValue) -> Option<AuditEntry> {
        Some(AuditEntry {
            id: string_field(map, "id")?,
            order_id: string_field(map, "order_id")?,
            order_name: string_field(map, "order_name").unwrap_or_default(),
            actor_id: string_field(map, "actor_id")?,
            actor_name: string_field(map, "actor_name").unwrap_or_default(),
            action: string_field(map, "action")?.parse().ok()?,
            detail: string_field(map, "detail").unwrap_or_default(),
            timestamp: timestamp_field(map, "timestamp")?,
        })
    }

    /// All audit entries in append order.
    fn history_entries(&self) -> Vec<AuditEntry> {
        match self.doc.get_list("history").get_deep_value() {
            LoroValue::List(list) => list
                .iter()
                .filter_map(|value| match value {
                    LoroValue::Map(m) => self.parse_entry_from_map(m),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl WorkshopStore for LoroStore {
    fn fetch_orders(&self) -> Result<Vec<WorkOrder>> {
        let orders_map = self.doc.get_map("orders");
        let mut orders = Vec::new();

        let json = orders_map.get_deep_value();
        if let LoroValue::Map(map) = json {
            for (_, entity_value) in map.iter() {
                if let LoroValue::Map(entity_map) = entity_value {
                    if let Some(order) = self.parse_order_from_map(entity_map) {
                        orders.push(order);
                    }
                }
            }
        }

        orders.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        debug!(count = orders.len(), "fetched orders");
        Ok(orders)
    }

    fn upsert_order(&self, order: &WorkOrder) -> Result<WorkOrder> {
        let orders = self.doc.get_map("orders");
        let entity_map = orders.get_or_create_container(&order.id, LoroMap::new())?;

        entity_map.insert("id", order.id.clone())?;
        entity_map.insert("name", order.name.clone())?;
        entity_map.insert("place", order.place.clone())?;
        entity_map.insert("due_date", order.due_date.format("%Y-%m-%d").to_string())?;
        entity_map.insert("state", order.state.to_string())?;
        entity_map.insert("notes", order.notes.clone())?;
        entity_map.insert("created_by", order.created_by.clone())?;
        entity_map.insert("created_at", order.created_at.to_rfc3339())?;

        match &order.edited_by {
            Some(editor) => entity_map.insert("edited_by", editor.clone())?,
            None => entity_map.delete("edited_by")?,
        };
        match &order.edited_at {
            Some(at) => entity_map.insert("edited_at", at.to_rfc3339())?,
            None => entity_map.delete("edited_at")?,
        };

        // Replace the item list wholesale
        let items = entity_map.get_or_create_container("items", LoroList::new())?;
        if !items.is_empty() {
            items.delete(0, items.len())?;
        }
        for item in &order.items {
            let item_map = items.push_container(LoroMap::new())?;
            item_map.insert("name", item.name.clone())?;
            item_map.insert("quantity", i64::from(item.quantity))?;
        }

        self.commit()?;
        Ok(order.clone())
    }

    fn delete_order(&self, id: &str) -> Result<()> {
        let orders_map = self.doc.get_map("orders");

        if orders_map.get(id).is_none() {
            return Err(WorkshopError::OrderNotFound(id.to_string()));
        }

        orders_map.delete(id)?;
        self.commit()
    }

    fn fetch_users(&self) -> Result<Vec<User>> {
        let mut users = Vec::new();

        if let LoroValue::Map(map) = self.doc.get_map("users").get_deep_value() {
            for (_, value) in map.iter() {
                if let LoroValue::Map(user_map) = value {
                    if let Some(user) = self.parse_user_from_map(user_map) {
                        users.push(user);
                    }
                }
            }
        }

        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    fn upsert_user(&self, user: &User) -> Result<User> {
        let users = self.doc.get_map("users");
        let user_map = users.get_or_create_container(&user.id, LoroMap::new())?;

        user_map.insert("id", user.id.clone())?;
        user_map.insert("name", user.name.clone())?;
        user_map.insert("email", user.email.clone())?;
        user_map.insert("password", user.password.clone())?;
        user_map.insert("role", user.role.to_string())?;

        self.commit()?;
        Ok(user.clone())
    }

    fn delete_user(&self, id: &str) -> Result<()> {
        let users = self.doc.get_map("users");

        if users.get(id).is_none() {
            return Err(WorkshopError::UserNotFound(id.to_string()));
        }

        users.delete(id)?;
        self.commit()
    }

    fn fetch_history(&self, order_id: Option<&str>) -> Result<Vec<AuditEntry>> {
        Ok(audit::query(self.history_entries(), order_id, HISTORY_LIMIT))
    }

    fn append_history(&self, entry: &AuditEntry) -> Result<()> {
        let history = self.doc.get_list("history");
        let entry_map = history.push_container(LoroMap::new())?;

        entry_map.insert("id", entry.id.clone())?;
        entry_map.insert("order_id", entry.order_id.clone())?;
        entry_map.insert("order_name", entry.order_name.clone())?;
        entry_map.insert("actor_id", entry.actor_id.clone())?;
        entry_map.insert("actor_name", entry.actor_name.clone())?;
        entry_map.insert("action", entry.action.to_string())?;
        entry_map.insert("detail", entry.detail.clone())?;
        entry_map.insert("timestamp", entry.timestamp.to_rfc3339())?;

        self.commit()
    }
}

fn string_field(map: &loro::LoroMapValue, key: &str) -> Option<String> {
    match map.get(key)? {
        LoroValue::String(s) => Some(s.to_string()),
        _ => None,
    }
}

fn timestamp_field(map: &loro::LoroMapValue, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    match map.get(key)? {
        LoroValue::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc)),
        _ => None,
    }
}

/// Scalar Loro value as JSON, for the furniture normalizer.
fn json_value(value: &LoroValue) -> Value {
    match value {
        LoroValue::I64(n) => Value::from(*n),
        LoroValue::Double(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        LoroValue::String(s) => Value::String(s.to_string()),
        LoroValue::Bool(b) => Value::Bool(*b),
        _ => Value::Null,
    }
}
