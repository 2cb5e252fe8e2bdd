//! # Message Codec
//!
//! Decodes topic payloads into domain values. Decoding is all-or-nothing: a
//! payload either yields a fully validated value or a `DecodeError`, never a
//! partially filled one.

use serde::de::DeserializeOwned;

use crate::core::model::{OrderEvent, OrderStatus, StatisticsSnapshot};
use crate::error::DecodeError;

/// Stateless decoder for the two dashboard topics.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec {
    strict_reason: bool,
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MessageCodec {
    /// Creates a codec. With `strict_reason` an order event whose `reason`
    /// does not match its `status` is rejected; otherwise it is accepted with
    /// a warning.
    pub fn new(strict_reason: bool) -> Self {
        Self { strict_reason }
    }

    /// Decodes a statistics snapshot. Every field must be present.
    pub fn decode_statistics(&self, payload: &str) -> Result<StatisticsSnapshot, DecodeError> {
        let snapshot: StatisticsSnapshot = parse(payload)?;
        non_negative("runningAverage", snapshot.running_average)?;
        non_negative("totalRevenue", snapshot.total_revenue)?;
        Ok(snapshot)
    }

    /// Decodes an order outcome.
    pub fn decode_order(&self, payload: &str) -> Result<OrderEvent, DecodeError> {
        let event: OrderEvent = parse(payload)?;

        if event.order_id.trim().is_empty() {
            return Err(DecodeError::invalid("orderId", "must not be empty"));
        }
        if event.product_name.trim().is_empty() {
            return Err(DecodeError::invalid("productName", "must not be empty"));
        }
        if let Some(price) = event.price {
            if !price.is_finite() || price <= 0.0 {
                return Err(DecodeError::invalid("price", format!("must be positive, got {price}")));
            }
        }
        if event.quantity == Some(0) {
            return Err(DecodeError::invalid("quantity", "must be positive"));
        }
        if let Some(average) = event.running_average {
            non_negative("runningAverage", average)?;
        }
        self.check_reason(&event)?;

        Ok(event)
    }

    fn check_reason(&self, event: &OrderEvent) -> Result<(), DecodeError> {
        let has_reason = event.reason.as_deref().is_some_and(|r| !r.trim().is_empty());
        let violation = match (event.status, has_reason) {
            (OrderStatus::Failed, false) => Some("FAILED event carries no reason"),
            (OrderStatus::Success, true) => Some("SUCCESS event carries a failure reason"),
            _ => None,
        };

        match violation {
            Some(detail) if self.strict_reason => Err(DecodeError::invalid("reason", detail)),
            Some(detail) => {
                log::warn!("Order {}: {}", event.order_id, detail);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn parse<T: DeserializeOwned>(payload: &str) -> Result<T, DecodeError> {
    Ok(serde_json::from_str(payload)?)
}

fn non_negative(field: &'static str, value: f64) -> Result<(), DecodeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DecodeError::invalid(field, format!("must be a non-negative amount, got {value}")))
    }
}
