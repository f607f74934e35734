//! Size warnings printed after listings.
//!
//! Every command reloads the whole collection, so a project that keeps years
//! of delivered orders slowly gets sluggish. These checks say so before it
//! hurts.

use std::fmt;

use crate::cache::{
    CacheStats, DELIVERED_WARNING_THRESHOLD, LORO_SIZE_WARNING_THRESHOLD, ORDER_WARNING_THRESHOLD,
};

const MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// More work orders than a full reload handles comfortably.
    TooManyOrders { count: usize, limit: usize },
    /// Delivered orders piling up in the live collection.
    DeliveredBacklog { delivered: usize, limit: usize },
    LargeLoroDb { size_mb: f64, limit_mb: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::TooManyOrders { count, limit } => write!(
                f,
                "Warning: {} work orders (recommended at most {}); listings will slow down",
                count, limit
            ),
            Warning::DeliveredBacklog { delivered, limit } => write!(
                f,
                "Warning: {} delivered orders kept (over {}); remove old ones with `maderogest delete`",
                delivered, limit
            ),
            Warning::LargeLoroDb { size_mb, limit_mb } => write!(
                f,
                "Warning: loro.db is {:.1}MB (recommended at most {:.0}MB)",
                size_mb, limit_mb
            ),
        }
    }
}

/// Warnings for the cached counts and the on-disk size of `loro.db`.
pub fn check_thresholds(stats: &CacheStats, loro_size: u64) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if stats.order_count > ORDER_WARNING_THRESHOLD {
        warnings.push(Warning::TooManyOrders {
            count: stats.order_count,
            limit: ORDER_WARNING_THRESHOLD,
        });
    }

    if stats.done > DELIVERED_WARNING_THRESHOLD {
        warnings.push(Warning::DeliveredBacklog {
            delivered: stats.done,
            limit: DELIVERED_WARNING_THRESHOLD,
        });
    }

    if loro_size > LORO_SIZE_WARNING_THRESHOLD {
        warnings.push(Warning::LargeLoroDb {
            size_mb: loro_size as f64 / MB,
            limit_mb: LORO_SIZE_WARNING_THRESHOLD as f64 / MB,
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(pending: usize, done: usize) -> CacheStats {
        CacheStats {
            order_count: pending + done,
            pending,
            in_progress: 0,
            done,
        }
    }

    #[test]
    fn test_small_project_is_quiet() {
        assert!(check_thresholds(&stats(40, 200), 2 * 1024 * 1024).is_empty());
    }

    #[test]
    fn test_delivered_backlog_alone() {
        let warnings = check_thresholds(&stats(10, 600), 0);
        assert_eq!(
            warnings,
            vec![Warning::DeliveredBacklog {
                delivered: 600,
                limit: DELIVERED_WARNING_THRESHOLD
            }]
        );
    }

    #[test]
    fn test_large_collection_warns_twice() {
        let warnings = check_thresholds(&stats(300, 900), 0);
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0], Warning::TooManyOrders { count: 1200, .. }));
        assert!(matches!(warnings[1], Warning::DeliveredBacklog { .. }));
    }

    #[test]
    fn test_backlog_message_names_an_existing_command() {
        let msg = Warning::DeliveredBacklog {
            delivered: 600,
            limit: DELIVERED_WARNING_THRESHOLD,
        }
        .to_string();
        assert!(msg.contains("600"));
        assert!(msg.contains("maderogest delete"));
        assert!(!msg.contains("export"));
    }

    #[test]
    fn test_loro_size_message() {
        let warnings = check_thresholds(&stats(1, 0), 15 * 1024 * 1024 + 1);
        assert_eq!(warnings.len(), 1);
        let msg = warnings[0].to_string();
        assert!(msg.contains("15.0MB"), "{}", msg);
        assert!(msg.contains("10MB"));
    }
}
