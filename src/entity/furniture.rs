// src/entity/furniture.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of a work order's furniture list, in canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FurnitureItem {
    pub name: String,
    pub quantity: u32,
}

impl FurnitureItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.max(1),
        }
    }

    /// "Mesa x3", or just the name for a single unit.
    pub fn label(&self) -> String {
        if self.quantity > 1 {
            format!("{} x{}", self.name, self.quantity)
        } else {
            self.name.clone()
        }
    }
}

/// A furniture entry as it may appear in stored or imported records.
///
/// Older records hold a bare name; newer ones hold an object whose quantity
/// may be missing, zero, negative or not a number at all. Collapse with
/// [`normalize`] before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFurnitureItem {
    LegacyName(String),
    Item {
        #[serde(alias = "nombre")]
        name: String,
        #[serde(default, alias = "cantidad")]
        quantity: Value,
    },
}

impl RawFurnitureItem {
    pub fn item(name: impl Into<String>, quantity: u32) -> Self {
        RawFurnitureItem::Item {
            name: name.into(),
            quantity: Value::from(quantity),
        }
    }
}

impl From<FurnitureItem> for RawFurnitureItem {
    fn from(item: FurnitureItem) -> Self {
        RawFurnitureItem::item(item.name, item.quantity)
    }
}

/// Canonicalize raw furniture entries, keeping order and length.
///
/// Never fails: `None` yields an empty list and any unusable quantity is
/// coerced to 1.
pub fn normalize(items: Option<&[RawFurnitureItem]>) -> Vec<FurnitureItem> {
    items
        .unwrap_or_default()
        .iter()
        .map(|raw| match raw {
            RawFurnitureItem::LegacyName(name) => FurnitureItem::new(name.clone(), 1),
            RawFurnitureItem::Item { name, quantity } => {
                FurnitureItem::new(name.clone(), coerce_quantity(quantity))
            }
        })
        .collect()
}

/// Integer quantity ≥ 1 from an arbitrary JSON value.
fn coerce_quantity(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    };

    match parsed {
        Some(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Parse the command-line item syntax `name[:quantity]`.
///
/// The quantity text is kept raw so the normalizer applies its usual
/// coercion ("Silla:abc" becomes one chair).
pub fn parse_item_arg(arg: &str) -> Option<RawFurnitureItem> {
    let (name, quantity) = match arg.rsplit_once(':') {
        Some((name, qty)) => (name.trim(), Value::String(qty.trim().to_string())),
        None => (arg.trim(), Value::Null),
    };

    if name.is_empty() {
        return None;
    }

    Some(RawFurnitureItem::Item {
        name: name.to_string(),
        quantity,
    })
}

/// Total units across a furniture list.
pub fn total_units(items: &[FurnitureItem]) -> u32 {
    items.iter().map(|i| i.quantity).sum()
}
