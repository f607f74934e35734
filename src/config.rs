use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::LocalSlots;

const NOTIFY_PHONE_SLOT: &str = "notify_phone";

/// Per-checkout settings kept in the local slots file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkshopConfig {
    /// Phone number the daily digest is addressed to.
    pub notify_phone: Option<String>,
}

impl WorkshopConfig {
    pub fn load(slots: &LocalSlots) -> Self {
        Self {
            notify_phone: slots.get(NOTIFY_PHONE_SLOT),
        }
    }

    pub fn save(&self, slots: &mut LocalSlots) -> Result<()> {
        match &self.notify_phone {
            Some(phone) => slots.set(NOTIFY_PHONE_SLOT, phone),
            None => slots.remove(NOTIFY_PHONE_SLOT),
        }
    }

    /// Digits of the configured phone number, if any remain.
    pub fn phone_digits(&self) -> Option<String> {
        let digits: String = self
            .notify_phone
            .as_deref()?
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        (!digits.is_empty()).then_some(digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = WorkshopConfig::default();
        assert!(config.notify_phone.is_none());
        assert!(config.phone_digits().is_none());
    }

    #[test]
    fn test_phone_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut slots = LocalSlots::open(tmp.path());

        let config = WorkshopConfig {
            notify_phone: Some("+54 9 11 5555-1234".to_string()),
        };
        config.save(&mut slots).unwrap();

        let loaded = WorkshopConfig::load(&LocalSlots::open(tmp.path()));
        assert_eq!(loaded, config);
        assert_eq!(loaded.phone_digits().as_deref(), Some("5491155551234"));

        WorkshopConfig::default().save(&mut slots).unwrap();
        assert!(WorkshopConfig::load(&LocalSlots::open(tmp.path())).notify_phone.is_none());
    }
}
