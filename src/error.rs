use std::fmt;

use thiserror::Error;

/// A single missing or malformed input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn required(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: "required".to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum WorkshopError {
    #[error("Not in a maderogest project. Run 'maderogest init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .maderogest/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Not logged in. Run 'maderogest login' first.")]
    NotLoggedIn,

    #[error("Work order not found: {0}")]
    OrderNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Ambiguous id '{0}': matches more than one work order")]
    AmbiguousId(String),

    #[error("Invalid input: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// The persistence collaborator failed. The detail is kept for logs only.
    #[error("Connection error. Check your connection and try again.")]
    Connectivity(String),

    #[error("Incorrect email or password.")]
    Auth,

    #[error("Only administrators can {0}.")]
    PermissionDenied(&'static str),

    #[error("Use --force to delete in non-interactive mode")]
    NonInteractive,

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Loro error: {0}")]
    Loro(#[from] loro::LoroError),

    #[error("Loro encode error: {0}")]
    LoroEncode(#[from] loro::LoroEncodeError),
}

impl WorkshopError {
    /// Wrap a failed store call, keeping an existing connectivity error as is.
    pub fn connectivity(source: WorkshopError) -> Self {
        match source {
            WorkshopError::Connectivity(detail) => WorkshopError::Connectivity(detail),
            other => WorkshopError::Connectivity(other.to_string()),
        }
    }

    /// Field errors of a validation failure, empty for every other kind.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            WorkshopError::Validation(fields) => fields,
            _ => &[],
        }
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, WorkshopError>;
