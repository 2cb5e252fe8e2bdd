//! HTTP implementation of `CommandGateway`.
//!
//! Reads go through a client with retry middleware; commands go through a
//! separate client that never retries, so a submit or reset is sent at most
//! once per user action.

use std::collections::BTreeMap;

use reqwest::Method;

use crate::config::SessionConfig;
use crate::core::codec::MessageCodec;
use crate::core::controller::CommandGateway;
use crate::core::model::{OrderAccepted, OrderRequest, StatisticsSnapshot};
use crate::error::CommandError;
use crate::retrieve::ky_http::{ApiClient, ApiResponse};

const ORDERS_PATH: &str = "api/orders";
const STATISTICS_PATH: &str = "api/orders/statistics";
const RESET_PATH: &str = "api/orders/statistics/reset";
const HEALTH_PATH: &str = "api/orders/health";

const READ_RETRIES: u32 = 3;

const ORDER_FALLBACK: &str = "Failed to create order";
const RESET_FALLBACK: &str = "Failed to reset statistics";
const STATISTICS_FALLBACK: &str = "Failed to fetch statistics";

/// Command gateway talking to the order service over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    reads: ApiClient,
    commands: ApiClient,
    codec: MessageCodec,
}

impl HttpGateway {
    /// Gateway for `config.api_base_url`.
    pub fn from_config(config: &SessionConfig) -> anyhow::Result<Self> {
        Ok(Self {
            reads: ApiClient::new(&config.api_base_url, READ_RETRIES, config.request_timeout)?,
            commands: ApiClient::new(&config.api_base_url, 0, config.request_timeout)?,
            codec: MessageCodec::new(config.strict_reason),
        })
    }

    /// The service's health map, e.g. `{"status": "UP"}`.
    pub async fn health(&self) -> Result<BTreeMap<String, String>, CommandError> {
        let response = self
            .reads
            .get::<BTreeMap<String, serde_json::Value>>(HEALTH_PATH)
            .await
            .map_err(network)?;
        let body = accepted(response, "Health check failed")?.unwrap_or_default();
        Ok(body
            .into_iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect())
    }
}

impl CommandGateway for HttpGateway {
    async fn fetch_statistics(&self) -> Result<StatisticsSnapshot, CommandError> {
        let response = self
            .reads
            .get::<serde_json::Value>(STATISTICS_PATH)
            .await
            .map_err(network)?;
        let body = accepted(response, STATISTICS_FALLBACK)?
            .ok_or_else(|| CommandError::Network("empty statistics response".to_string()))?;
        self.codec
            .decode_statistics(&body.to_string())
            .map_err(|e| CommandError::Network(format!("unexpected statistics response: {e}")))
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAccepted, CommandError> {
        let response = self
            .commands
            .request::<OrderAccepted, _>(Method::POST, ORDERS_PATH, Some(request))
            .await
            .map_err(network)?;
        accepted(response, ORDER_FALLBACK)?
            .ok_or_else(|| CommandError::Network("order accepted without an order id".to_string()))
    }

    async fn reset_statistics(&self) -> Result<(), CommandError> {
        let response = self
            .commands
            .request::<serde_json::Value, ()>(Method::POST, RESET_PATH, None)
            .await
            .map_err(network)?;
        accepted(response, RESET_FALLBACK)?;
        Ok(())
    }
}

fn network(e: anyhow::Error) -> CommandError {
    log::warn!("HTTP request failed: {:#}", e);
    CommandError::Network(format!("{e:#}"))
}

/// 2xx data, or `Rejected` carrying the server's message.
fn accepted<T>(response: ApiResponse<T>, fallback: &str) -> Result<Option<T>, CommandError> {
    if response.success {
        return Ok(response.data);
    }
    Err(CommandError::Rejected {
        status: response.status,
        message: rejection_message(response.error_body.as_deref(), fallback),
    })
}

/// Picks `message`, then `error`, from a JSON error body; otherwise `fallback`.
fn rejection_message(body: Option<&str>, fallback: &str) -> String {
    let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) else {
        return fallback.to_string();
    };
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback.to_string();
    };
    ["message", "error"]
        .iter()
        .filter_map(|key| json.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_prefers_message_field() {
        let body = r#"{"error":"Failed to create order","message":"Kafka unavailable"}"#;
        assert_eq!(rejection_message(Some(body), ORDER_FALLBACK), "Kafka unavailable");
        assert_eq!(rejection_message(Some(r#"{"error":"Bad input"}"#), ORDER_FALLBACK), "Bad input");
    }

    #[test]
    fn test_rejection_message_fallbacks() {
        assert_eq!(rejection_message(None, RESET_FALLBACK), RESET_FALLBACK);
        assert_eq!(rejection_message(Some("  "), RESET_FALLBACK), RESET_FALLBACK);
        assert_eq!(rejection_message(Some("<html>502</html>"), RESET_FALLBACK), RESET_FALLBACK);
        assert_eq!(rejection_message(Some(r#"{"message":""}"#), ORDER_FALLBACK), ORDER_FALLBACK);
    }

    #[test]
    fn test_accepted_maps_status() {
        let ok: ApiResponse<u8> = ApiResponse {
            data: Some(1),
            error_body: None,
            status: 201,
            success: true,
        };
        assert_eq!(accepted(ok, ORDER_FALLBACK), Ok(Some(1)));

        let rejected: ApiResponse<u8> = ApiResponse {
            data: None,
            error_body: Some(r#"{"message":"nope"}"#.to_string()),
            status: 500,
            success: false,
        };
        assert_eq!(
            accepted(rejected, ORDER_FALLBACK),
            Err(CommandError::Rejected {
                status: 500,
                message: "nope".to_string()
            })
        );
    }
}
