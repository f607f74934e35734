//! Sign-in, the per-checkout local slots, and account management.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::entity::{Role, User};
use crate::error::{FieldError, Result, WorkshopError};
use crate::storage::WorkshopStore;
use crate::workflow::Confirm;

const LOCAL_FILE: &str = "local.json";
const SESSION_SLOT: &str = "session";

/// The signed-in user. Passed explicitly to every operation that needs an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub email: String,
}

impl Session {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            role: user.role,
            email: user.email.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// `PermissionDenied(what)` unless the session is an admin.
    pub fn require_admin(&self, what: &'static str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(WorkshopError::PermissionDenied(what))
        }
    }

    pub fn load(slots: &LocalSlots) -> Option<Session> {
        slots.get(SESSION_SLOT)
    }

    pub fn save(&self, slots: &mut LocalSlots) -> Result<()> {
        slots.set(SESSION_SLOT, self)
    }

    pub fn clear(slots: &mut LocalSlots) -> Result<()> {
        slots.remove(SESSION_SLOT)
    }
}

/// Small JSON key-value file private to one checkout.
///
/// Holds the current session and the notification phone number; it is
/// git-ignored so each machine keeps its own.
pub struct LocalSlots {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl LocalSlots {
    /// Open the slots file in `dir`, starting empty if it is missing or unreadable.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(LOCAL_FILE);
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self { path, values }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.save()
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }
}

/// Check a credential pair against the account list.
///
/// A wrong email and a wrong password fail the same way.
pub fn login<S: WorkshopStore>(store: &S, email: &str, password: &str) -> Result<Session> {
    let mut missing = Vec::new();
    if email.trim().is_empty() {
        missing.push(FieldError::required("email"));
    }
    if password.is_empty() {
        missing.push(FieldError::required("password"));
    }
    if !missing.is_empty() {
        return Err(WorkshopError::Validation(missing));
    }

    let users = store.fetch_users().map_err(|e| {
        warn!(error = %e, "failed to fetch users for login");
        WorkshopError::connectivity(e)
    })?;

    let user = users
        .iter()
        .find(|u| u.email_matches(email) && u.password == password)
        .ok_or(WorkshopError::Auth)?;

    info!(user_id = %user.id, "signed in");
    Ok(Session::from_user(user))
}

/// Fields for a new account.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub fn list_users<S: WorkshopStore>(store: &S, session: &Session) -> Result<Vec<User>> {
    session.require_admin("manage users")?;
    store.fetch_users().map_err(WorkshopError::connectivity)
}

pub fn add_user<S: WorkshopStore>(store: &S, session: &Session, new: NewUser) -> Result<User> {
    session.require_admin("manage users")?;

    let mut missing = Vec::new();
    if new.name.trim().is_empty() {
        missing.push(FieldError::required("name"));
    }
    if new.email.trim().is_empty() {
        missing.push(FieldError::required("email"));
    }
    if new.password.is_empty() {
        missing.push(FieldError::required("password"));
    }
    if !missing.is_empty() {
        return Err(WorkshopError::Validation(missing));
    }

    let users = store.fetch_users().map_err(WorkshopError::connectivity)?;
    if users.iter().any(|u| u.email_matches(&new.email)) {
        return Err(WorkshopError::Validation(vec![FieldError {
            field: "email".to_string(),
            message: "already registered".to_string(),
        }]));
    }

    let user = User::new(
        new.name.trim().to_string(),
        new.email.trim().to_string(),
        new.password,
        new.role,
    );
    store.upsert_user(&user).map_err(|e| {
        warn!(error = %e, "failed to save user");
        WorkshopError::connectivity(e)
    })?;

    info!(user_id = %user.id, role = %user.role, "user added");
    Ok(user)
}

/// Remove an account after confirmation. `Ok(false)` when declined.
pub fn delete_user<S: WorkshopStore>(
    store: &S,
    session: &Session,
    id: &str,
    confirm: &mut dyn Confirm,
) -> Result<bool> {
    session.require_admin("manage users")?;

    let users = store.fetch_users().map_err(WorkshopError::connectivity)?;
    let user = users
        .iter()
        .find(|u| u.id == id || u.email_matches(id))
        .ok_or_else(|| WorkshopError::UserNotFound(id.to_string()))?;

    if !confirm.confirm(&format!("Delete user {} <{}>?", user.name, user.email)) {
        return Ok(false);
    }

    store.delete_user(&user.id).map_err(|e| {
        warn!(error = %e, "failed to delete user");
        WorkshopError::connectivity(e)
    })?;

    info!(user_id = %user.id, "user deleted");
    Ok(true)
}
