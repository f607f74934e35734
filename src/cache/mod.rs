mod sqlite_cache;

pub use sqlite_cache::{CacheStats, OrderSearchResult, SqliteCache};

/// Order count above which listings start to warn.
pub const ORDER_WARNING_THRESHOLD: usize = 1000;

/// Delivered orders above which listings suggest clearing them out.
pub const DELIVERED_WARNING_THRESHOLD: usize = 500;

/// loro.db size (bytes) above which listings start to warn.
pub const LORO_SIZE_WARNING_THRESHOLD: u64 = 10 * 1024 * 1024;
