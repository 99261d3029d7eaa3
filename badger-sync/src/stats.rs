//! Statistics extraction from catalog item records
//!
//! Items are free-form JSON objects. Only six fields matter to the badge
//! rules; everything else on the item is ignored here and preserved by the
//! catalog writer.
//!
//! **Coercion:**
//! - JSON numbers are taken as-is, fractions included, so thresholds compare
//!   against the raw value
//! - Numeric strings are parsed (non-finite values read as 0)
//! - Anything else, including an absent key, reads as 0

use serde::Serialize;
use serde_json::{Map, Value};

pub const QUANTITY: &str = "quantity";
pub const ORDERS: &str = "orders";
pub const LIKES: &str = "likes";
pub const VIEWS: &str = "views";
pub const PRICE: &str = "price";
pub const ORIGINAL_PRICE: &str = "originalPrice";

/// Statistics bundle the classifier works on
///
/// Negative values are kept; the classifier treats non-positive quantity as
/// out of stock.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ItemStats {
    pub quantity: f64,
    pub orders: f64,
    pub likes: f64,
    pub views: f64,
    pub price: f64,
    pub original_price: f64,
}

impl ItemStats {
    /// Build the bundle from an item record, substituting 0 for missing fields
    pub fn from_item(item: &Map<String, Value>) -> Self {
        Self {
            quantity: number_field(item, QUANTITY),
            orders: number_field(item, ORDERS),
            likes: number_field(item, LIKES),
            views: number_field(item, VIEWS),
            price: number_field(item, PRICE),
            original_price: number_field(item, ORIGINAL_PRICE),
        }
    }

    /// Discount off the list price, in percent
    ///
    /// Zero when there is no positive list price, so the result is never NaN.
    pub fn discount_percent(&self) -> f64 {
        if self.original_price > 0.0 {
            (self.original_price - self.price) / self.original_price * 100.0
        } else {
            0.0
        }
    }
}

fn number_field(item: &Map<String, Value>, key: &str) -> f64 {
    item.get(key).map(coerce_number).unwrap_or(0.0)
}

fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_finite(s.trim()).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}
