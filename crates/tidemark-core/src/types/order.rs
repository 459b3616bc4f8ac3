use crate::error::TidemarkError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order identifier - assigned by the store, immutable once assigned
pub type OrderId = i64;

/// Order priority level, stored as lowercase text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
        }
    }
}

impl FromStr for Priority {
    type Err = TidemarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(TidemarkError::Decode(format!(
                "unknown priority level: {}",
                other
            ))),
        }
    }
}

/// An order as stored, with its assigned id and creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: u32,
    pub shipping_address: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the ingress path when creating an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub product_name: String,
    pub quantity: u32,
    pub shipping_address: String,
    pub priority: Priority,
}
