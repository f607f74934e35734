pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod demo;
pub mod entity;
pub mod error;
pub mod session;
pub mod storage;
pub mod urgency;
pub mod view;
pub mod warnings;
pub mod workflow;

pub use cache::SqliteCache;
pub use error::{Result, WorkshopError};
pub use storage::{LoroStore, WorkshopStore};
pub use workflow::Workflow;
