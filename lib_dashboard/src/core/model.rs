//! Domain values exchanged with the backend.
//!
//! Field names follow the backend's camelCase JSON. Decimal amounts are `f64`
//! because the pipeline computes them as doubles and the client never does
//! arithmetic on them beyond display.

use serde::{Deserialize, Serialize};

/// Terminal outcome of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// The pipeline processed the order.
    Success,
    /// The pipeline gave up on the order.
    Failed,
}

/// One order outcome pushed on the orders topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    /// String form of the order UUID.
    pub order_id: String,
    /// Product label.
    pub product_name: String,
    /// Unit price; failure events usually omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Ordered quantity; failure events usually omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Outcome.
    pub status: OrderStatus,
    /// Running average price after this order, when the pipeline sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_average: Option<f64>,
    /// Failure explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl OrderEvent {
    /// First eight characters of the order id, for compact display.
    pub fn short_id(&self) -> &str {
        short_id(&self.order_id)
    }

    /// True when the pipeline processed the order.
    pub fn is_success(&self) -> bool {
        self.status == OrderStatus::Success
    }
}

/// The pipeline's aggregate counters at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    /// Orders processed successfully so far.
    pub total_orders: u64,
    /// Average unit price across processed orders.
    pub running_average: f64,
    /// Sum of price * quantity across processed orders.
    pub total_revenue: f64,
    /// Orders that ended in SUCCESS.
    pub successful_orders: u64,
    /// Orders that ended in FAILED.
    pub failed_orders: u64,
}

impl StatisticsSnapshot {
    /// The all-zero snapshot.
    pub const ZERO: StatisticsSnapshot = StatisticsSnapshot {
        total_orders: 0,
        running_average: 0.0,
        total_revenue: 0.0,
        successful_orders: 0,
        failed_orders: 0,
    };

    /// Percentage of successful orders over `total_orders`; 0 when nothing was processed.
    pub fn success_rate(&self) -> f64 {
        if self.total_orders == 0 {
            return 0.0;
        }
        self.successful_orders as f64 / self.total_orders as f64 * 100.0
    }
}

/// Body of an order submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Product label.
    pub product_name: String,
    /// Unit price, must be positive.
    pub price: f64,
    /// Quantity between 1 and `MAX_QUANTITY`.
    pub quantity: u32,
}

impl OrderRequest {
    /// Largest quantity a single order may carry.
    pub const MAX_QUANTITY: u32 = 100;

    /// Builds a request, rejecting values the order form would not accept.
    pub fn new(product_name: &str, price: f64, quantity: u32) -> Result<Self, String> {
        let product_name = product_name.trim();
        if product_name.is_empty() {
            return Err("product name must not be empty".to_string());
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(format!("price must be greater than 0, got {price}"));
        }
        if quantity == 0 || quantity > Self::MAX_QUANTITY {
            return Err(format!("quantity must be between 1 and {}, got {quantity}", Self::MAX_QUANTITY));
        }
        Ok(Self {
            product_name: product_name.to_string(),
            price,
            quantity,
        })
    }
}

/// Success body of an order submission. Means "accepted", not "processed".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAccepted {
    /// Id the pipeline assigned to the order.
    pub order_id: String,
    /// Server message, if any.
    #[serde(default)]
    pub message: Option<String>,
    /// Server-side status at acceptance time (usually `PENDING`).
    #[serde(default)]
    pub status: Option<String>,
}

impl OrderAccepted {
    /// First eight characters of the order id.
    pub fn short_id(&self) -> &str {
        short_id(&self.order_id)
    }
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
